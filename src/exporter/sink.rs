use async_trait::async_trait;

use crate::errors::Result;

use super::ExportBatch;

/// Destination of scheduled exports.
///
/// Encoding and transport are up to the implementation.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Connectivity check performed once when the exporter is built
    async fn ping(&self) -> Result<()>;

    /// Ship one batch. Returns the number of points accepted.
    async fn write(&self, batch: &ExportBatch) -> Result<usize>;

    fn name(&self) -> &'static str;
}

/// Sink that logs batches instead of shipping them (dry runs)
pub struct LogSink;

#[async_trait]
impl MetricsSink for LogSink {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn write(&self, batch: &ExportBatch) -> Result<usize> {
        let (body, lines) = super::line_protocol::encode(batch);
        tracing::info!("LogSink: {} points\n{}", lines, body.trim_end());
        Ok(lines)
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
