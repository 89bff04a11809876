use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::ExporterConfig;
use crate::exporter::{ExporterOptions, MetricsSink, ScheduledExporter};
use crate::registry::MetricRegistry;

/// Build the sink described by the exporter configuration
pub fn create_sink(config: &ExporterConfig) -> Result<Arc<dyn MetricsSink>> {
    #[cfg(feature = "influxdb")]
    {
        let sink = crate::exporter::InfluxDbSink::from_config(config)
            .context("Failed to configure InfluxDB sink")?;
        tracing::debug!("InfluxDB sink endpoint: {}", sink.endpoint());
        Ok(Arc::new(sink))
    }
    #[cfg(not(feature = "influxdb"))]
    {
        tracing::warn!(
            "Built without the `influxdb` feature, exporting to the log instead of {}:{}",
            config.host, config.port
        );
        Ok(Arc::new(crate::exporter::LogSink))
    }
}

/// Connect a scheduled exporter. Fails fast when the sink is unreachable.
pub async fn create_exporter(
    config: &ExporterConfig,
    registry: Arc<dyn MetricRegistry>,
) -> Result<ScheduledExporter> {
    let sink = create_sink(config)?;
    let options = ExporterOptions {
        environment: config.environment.clone(),
        interval: config.interval(),
    };
    let exporter = ScheduledExporter::connect(registry, sink, options)
        .await
        .with_context(|| format!("Failed to connect to sink at {}:{}", config.host, config.port))?;
    info!(
        "Exporter ready: every {}s to {}:{} (database '{}')",
        config.interval_secs, config.host, config.port, config.database
    );
    Ok(exporter)
}
