use tracing::{debug, trace};

use crate::registry::MetricRegistry;

use super::snapshot::Snapshot;

/// Decides whether harvested entries are removed from the registry.
///
/// Must run only after the merged values have been committed to the execution
/// context, otherwise a crash in between loses the attempt's counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    delete_on_finish: bool,
}

impl RetentionPolicy {
    pub fn new(delete_on_finish: bool) -> Self {
        Self { delete_on_finish }
    }

    /// Keep entries in the registry across runs
    pub fn keep() -> Self {
        Self::new(false)
    }

    /// Reset entries once the job finished
    pub fn delete_on_finish() -> Self {
        Self::new(true)
    }

    pub fn deletes_on_finish(&self) -> bool {
        self.delete_on_finish
    }

    /// Reset every entry named in `snapshot`, skipped entries included. Returns how
    /// many entries were removed.
    pub fn apply(&self, registry: &dyn MetricRegistry, snapshot: &Snapshot) -> usize {
        if !self.delete_on_finish {
            trace!("RetentionPolicy: keeping {} entries", snapshot.len());
            return 0;
        }

        let removed = snapshot
            .names()
            .chain(snapshot.skipped().iter().map(String::as_str))
            .filter(|name| registry.reset(name))
            .count();
        debug!(
            "RetentionPolicy: reset {} of {} harvested entries",
            removed,
            snapshot.len()
        );
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobRunId;
    use crate::listener::extractor::MetricSnapshotExtractor;
    use crate::registry::InMemoryRegistry;

    fn populated() -> InMemoryRegistry {
        let registry = InMemoryRegistry::new();
        registry.increment("counter.batch.run1.itemsRead", 42);
        registry.observe_gauge("gauge.batch.run1.throughput", 3.5);
        registry.increment("counter.batch.run2.itemsRead", 1);
        registry
    }

    #[test]
    fn test_keep_leaves_registry_unchanged() {
        let registry = populated();
        let before = {
            let mut v = registry.find_all();
            v.sort_by(|a, b| a.0.cmp(&b.0));
            v
        };
        let snapshot = MetricSnapshotExtractor::new().extract(&registry, &JobRunId::new("run1"));

        assert_eq!(RetentionPolicy::keep().apply(&registry, &snapshot), 0);

        let mut after = registry.find_all();
        after.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(before, after);
    }

    #[test]
    fn test_delete_removes_only_snapshotted_names() {
        let registry = populated();
        let snapshot = MetricSnapshotExtractor::new().extract(&registry, &JobRunId::new("run1"));

        assert_eq!(RetentionPolicy::delete_on_finish().apply(&registry, &snapshot), 2);

        let names: Vec<String> = registry.find_all().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["counter.batch.run2.itemsRead".to_string()]);
    }
}
