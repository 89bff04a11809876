//! Scheduled export of the whole metric registry to a time-series sink
//!
//! Independent of the job listener: it reads the same registry on its own timer and
//! never resets entries.

#[cfg(feature = "influxdb")]
pub mod influxdb;
pub mod line_protocol;
pub mod scheduled;
pub mod sink;

#[cfg(feature = "influxdb")]
pub use influxdb::InfluxDbSink;
pub use scheduled::{ExportOutcome, ExporterHandle, ExporterOptions, ScheduledExporter};
pub use sink::{LogSink, MetricsSink};

use chrono::{DateTime, Utc};

use crate::registry::MetricValue;

/// Registry contents captured for one export tick
#[derive(Debug, Clone)]
pub struct ExportBatch {
    /// Environment label prepended to measurement names
    pub environment: String,
    /// Shared timestamp of every point in the batch
    pub timestamp: DateTime<Utc>,
    pub entries: Vec<(String, MetricValue)>,
}
