//! Harvests the entries of one job run from the registry.
//!
//! Extraction is read-only: resetting harvested entries is the job of
//! [`RetentionPolicy`](super::RetentionPolicy), so two extractions without a
//! registry write in between yield the same entry sets.

use tracing::{trace, warn};

use crate::errors::JobMetricsError;
use crate::job::{JobRunId, MetricKind, ShortKey, strip_short_key};
use crate::registry::{GaugeSummary, MetricRegistry, MetricValue};

use super::snapshot::{CounterEntry, GaugeEntry, Snapshot};

#[derive(Debug, Default, Clone, Copy)]
pub struct MetricSnapshotExtractor;

impl MetricSnapshotExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Select every counter and gauge scoped to `run_id`.
    ///
    /// Malformed names and non-integer counters are skipped with a warning and
    /// listed in [`Snapshot::skipped`]; a bad entry never aborts the snapshot.
    pub fn extract(&self, registry: &dyn MetricRegistry, run_id: &JobRunId) -> Snapshot {
        let mut counters = Vec::new();
        let mut gauges = Vec::new();
        let mut skipped = Vec::new();

        for (name, value) in registry.find_all() {
            let kind = if MetricKind::Counter.matches(run_id, &name) {
                MetricKind::Counter
            } else if MetricKind::Gauge.matches(run_id, &name) {
                MetricKind::Gauge
            } else {
                continue;
            };

            let short_key = match strip_short_key(kind, run_id, &name) {
                Ok(ShortKey::Key(key)) => key.to_string(),
                Ok(ShortKey::OtherRun) => {
                    trace!(
                        "Extractor: {} {} belongs to another run, skipping",
                        kind.as_ref(),
                        name
                    );
                    continue;
                }
                Err(e) => {
                    warn!("Extractor: skipping {} entry: {}", kind.as_ref(), e);
                    skipped.push(name);
                    continue;
                }
            };

            match (kind, value) {
                (MetricKind::Counter, MetricValue::Integer(v)) => {
                    counters.push(CounterEntry::new(name, short_key, v));
                }
                (MetricKind::Counter, other) => {
                    let e = JobMetricsError::type_mismatch(format!(
                        "counter '{}' holds a {} value ({}), expected integer",
                        name,
                        other.kind(),
                        other
                    ));
                    warn!("Extractor: skipping {} entry: {}", kind.as_ref(), e);
                    skipped.push(name);
                }
                (MetricKind::Gauge, MetricValue::Gauge(summary)) => {
                    gauges.push(GaugeEntry::new(name, short_key, summary));
                }
                (MetricKind::Gauge, MetricValue::Integer(v)) => {
                    let summary = GaugeSummary::single(v as f64);
                    gauges.push(GaugeEntry::new(name, short_key, summary));
                }
                (MetricKind::Gauge, MetricValue::Decimal(v)) => {
                    gauges.push(GaugeEntry::new(name, short_key, GaugeSummary::single(v)));
                }
            }
        }

        trace!(
            "Extractor: run {} yielded {} counters, {} gauges, {} skipped",
            run_id,
            counters.len(),
            gauges.len(),
            skipped.len()
        );
        Snapshot::new(counters, gauges).with_skipped(skipped)
    }
}
