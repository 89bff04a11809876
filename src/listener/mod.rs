//! Job-completion metrics listener
//!
//! Invoked by the batch framework when a job run finishes:
//! 1. extract the run's counters and gauges from the registry
//! 2. merge them into the job instance's execution context
//! 3. commit the context
//! 4. log the formatted report
//! 5. apply the retention policy
//!
//! Steps run synchronously on the caller's thread. Registry entries are reset only
//! after the commit succeeded.

pub mod context;
pub mod extractor;
pub mod formatter;
pub mod merger;
pub mod retention;
pub mod snapshot;

pub use context::{ContextValue, ExecutionContext, MapExecutionContext};
pub use extractor::MetricSnapshotExtractor;
pub use formatter::{OutputFormatter, REPORT_END, REPORT_START, SimpleOutputFormatter};
pub use merger::ExecutionContextMerger;
pub use retention::RetentionPolicy;
pub use snapshot::{CounterEntry, GaugeEntry, Snapshot};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::job::JobRunId;
use crate::registry::MetricRegistry;

/// Outcome of one job-completion event
#[derive(Debug, Clone)]
pub struct JobMetricsReport {
    /// Snapshot with cumulative counter totals
    pub snapshot: Snapshot,
    /// Rendered report, as logged
    pub rendered: String,
    /// Registry entries reset by the retention policy
    pub reset_count: usize,
}

#[derive(Clone)]
pub struct MetricsListener {
    registry: Arc<dyn MetricRegistry>,
    extractor: MetricSnapshotExtractor,
    merger: ExecutionContextMerger,
    formatter: Arc<dyn OutputFormatter>,
    retention: RetentionPolicy,
}

impl MetricsListener {
    /// Listener with the default report formatter
    pub fn new(registry: Arc<dyn MetricRegistry>, delete_metrics_on_job_finish: bool) -> Self {
        Self {
            registry,
            extractor: MetricSnapshotExtractor::new(),
            merger: ExecutionContextMerger::new(),
            formatter: Arc::new(SimpleOutputFormatter),
            retention: RetentionPolicy::new(delete_metrics_on_job_finish),
        }
    }

    /// Replace the report formatter
    pub fn with_formatter(mut self, formatter: Arc<dyn OutputFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn before_job(&self, run_id: &JobRunId) {
        debug!("MetricsListener: job run {} started", run_id);
    }

    /// Handle a job-completion event.
    ///
    /// Returns the commit error unchanged if the context could not be made
    /// durable; the registry is left untouched in that case so the counts can be
    /// harvested again.
    pub fn after_job(
        &self,
        run_id: &JobRunId,
        context: &mut dyn ExecutionContext,
    ) -> Result<JobMetricsReport> {
        let snapshot = self.extractor.extract(self.registry.as_ref(), run_id);
        let merged = self.merger.merge(&snapshot, context);

        if let Err(e) = context.commit() {
            warn!(
                "MetricsListener: failed to commit context for run {}, registry left intact: {}",
                run_id, e
            );
            return Err(e);
        }

        let rendered = self.formatter.format(merged.counters(), merged.gauges());
        info!("{}", rendered);

        let reset_count = self.retention.apply(self.registry.as_ref(), &snapshot);

        Ok(JobMetricsReport {
            snapshot: merged,
            rendered,
            reset_count,
        })
    }
}
