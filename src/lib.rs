//! jobmetrics - job-scoped batch metrics
//!
//! Collects counters and gauges recorded by batch jobs in a shared registry,
//! folds them into the job's persisted execution context when a run finishes,
//! and ships the whole registry to InfluxDB on a fixed schedule.
//!
//! # Features
//! - **influxdb**: InfluxDB 1.x HTTP sink (default)
//! - **cli**: `jobmetrics` binary (default)
//!
//! # Architecture
//! - `registry`: Metric registry trait and in-memory implementation
//! - `job`: Run identifiers and metric naming convention
//! - `listener`: Job-completion pipeline (extract, merge, report, retention)
//! - `exporter`: Scheduled export and sinks
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging and signal handling

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod exporter;
pub mod job;
pub mod listener;
pub mod registry;
pub mod runtime;
pub mod system;
