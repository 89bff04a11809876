//! Folds a snapshot into the execution context of the job instance.
//!
//! Counters accumulate across attempts of the same logical job: an attempt that
//! follows a failed one adds its own count to the total the failed attempt left in
//! the context. Gauges describe the latest state and are simply replaced.

use tracing::{trace, warn};

use crate::errors::JobMetricsError;

use super::context::{ContextValue, ExecutionContext};
use super::snapshot::{CounterEntry, Snapshot};

#[derive(Debug, Default, Clone, Copy)]
pub struct ExecutionContextMerger;

impl ExecutionContextMerger {
    pub fn new() -> Self {
        Self
    }

    /// Write `snapshot` into `context` and return the merged snapshot.
    ///
    /// Counter values in the returned snapshot are the cumulative totals that were
    /// stored, not the deltas of this attempt.
    pub fn merge(&self, snapshot: &Snapshot, context: &mut dyn ExecutionContext) -> Snapshot {
        let counters = snapshot
            .counters()
            .iter()
            .map(|entry| {
                let total = match context.get(&entry.short_key) {
                    Some(ContextValue::Long(prior)) => accumulate(&entry.name, prior, entry.value),
                    Some(ContextValue::Gauge(_)) => {
                        let e = JobMetricsError::type_mismatch(format!(
                            "context key '{}' holds a gauge, overwriting with counter",
                            entry.short_key
                        ));
                        warn!("Merger: {}", e);
                        entry.value
                    }
                    None => entry.value,
                };

                context.put(&entry.short_key, ContextValue::Long(total));
                trace!("Merger: {} = {} (delta {})", entry.short_key, total, entry.value);

                CounterEntry {
                    value: total,
                    ..entry.clone()
                }
            })
            .collect();

        for gauge in snapshot.gauges() {
            context.put(&gauge.short_key, ContextValue::Gauge(gauge.summary));
        }

        Snapshot::new(counters, snapshot.gauges().to_vec())
    }
}

fn accumulate(name: &str, prior: i64, current: i64) -> i64 {
    prior.checked_add(current).unwrap_or_else(|| {
        warn!(
            "Merger: counter {} overflowed ({} + {}), saturating",
            name, prior, current
        );
        prior.saturating_add(current)
    })
}
