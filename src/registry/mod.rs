//! Process-wide metric registry
//!
//! The registry is owned by the host process: worker code increments counters and
//! records gauge observations under fully qualified names, and the job listener and
//! the scheduled exporter read it back through the [`MetricRegistry`] trait.
//!
//! Implementations must be thread-safe (Send + Sync). `find_all` may race with
//! concurrent writers; callers only rely on each returned entry being a value the
//! registry actually held at some point.

mod memory;

pub use memory::InMemoryRegistry;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Statistical summary of a gauge.
///
/// Tracks the latest observation together with min/max/mean over every
/// observation recorded under the same name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GaugeSummary {
    /// Latest observed value
    pub value: f64,
    pub min: f64,
    pub max: f64,
    /// Arithmetic mean of all observations
    pub mean: f64,
    /// Number of observations
    pub count: u64,
}

impl GaugeSummary {
    /// Summary holding a single observation
    pub fn single(value: f64) -> Self {
        Self {
            value,
            min: value,
            max: value,
            mean: value,
            count: 1,
        }
    }

    /// Record a new observation
    pub fn observe(&mut self, value: f64) {
        if self.count == 0 {
            *self = Self::single(value);
            return;
        }
        self.count += 1;
        self.value = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        // 增量均值，避免累加溢出
        self.mean += (value - self.mean) / self.count as f64;
    }
}

impl fmt::Display for GaugeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "value={}, mean={}, min={}, max={}, count={}",
            self.value, self.mean, self.min, self.max, self.count
        )
    }
}

/// Value held by a registry entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integral value, the only valid shape for counters
    Integer(i64),
    /// Non-integral point value
    Decimal(f64),
    /// Rich gauge
    Gauge(GaugeSummary),
}

impl MetricValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            MetricValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Short type name used in log messages
    pub fn kind(&self) -> &'static str {
        match self {
            MetricValue::Integer(_) => "integer",
            MetricValue::Decimal(_) => "decimal",
            MetricValue::Gauge(_) => "gauge",
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Integer(v) => write!(f, "{}", v),
            MetricValue::Decimal(v) => write!(f, "{}", v),
            MetricValue::Gauge(g) => write!(f, "{}", g),
        }
    }
}

/// Read/reset view of the metric registry.
pub trait MetricRegistry: Send + Sync {
    /// Enumerate every entry currently held, in registry order
    fn find_all(&self) -> Vec<(String, MetricValue)>;

    /// Remove an entry. Returns `true` if the entry existed.
    fn reset(&self, name: &str) -> bool;
}
