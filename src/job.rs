//! Job identifiers and metric naming
//!
//! Worker code records job-scoped metrics under
//! `<kind-prefix><run-id>.<short-key>`, for example
//! `counter.batch.importJob.17.itemsRead`. The run id is passed explicitly to the
//! listener by the batch framework; there is no ambient per-thread state.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::errors::{JobMetricsError, Result};

pub const COUNTER_PREFIX: &str = "counter.batch.";
pub const GAUGE_PREFIX: &str = "gauge.batch.";

/// Identifier of one execution attempt of a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobRunId(String);

impl JobRunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `"{job_name}.{execution_id}"`, the identifier shape batch frameworks
    /// usually propagate for an execution
    pub fn for_execution(job_name: &str, execution_id: u64) -> Self {
        Self(format!("{}.{}", job_name, execution_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobRunId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of a logical job. All attempts of the same instance share one
/// execution context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobInstanceKey(String);

impl JobInstanceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobInstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of job-scoped metric, selected by name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            MetricKind::Counter => COUNTER_PREFIX,
            MetricKind::Gauge => GAUGE_PREFIX,
        }
    }

    /// Full registry name for a short key of this run
    pub fn full_name(&self, run_id: &JobRunId, short_key: &str) -> String {
        format!("{}{}.{}", self.prefix(), run_id, short_key)
    }

    /// Whether `name` starts with `prefix + run_id`
    pub fn matches(&self, run_id: &JobRunId, name: &str) -> bool {
        name.strip_prefix(self.prefix())
            .is_some_and(|rest| rest.starts_with(run_id.as_str()))
    }
}

/// Result of locating the short key inside a matched name
#[derive(Debug, PartialEq, Eq)]
pub enum ShortKey<'a> {
    /// `prefix + run_id + "." + key`
    Key(&'a str),
    /// Name continues the run id without a separator, e.g. `run10` when looking for
    /// `run1`: it belongs to another run
    OtherRun,
}

/// Recover the short key from a name already accepted by [`MetricKind::matches`].
///
/// Strips exactly `prefix + run_id + "."`; fails with `MalformedMetricName` when
/// nothing is left after it.
pub fn strip_short_key<'a>(
    kind: MetricKind,
    run_id: &JobRunId,
    name: &'a str,
) -> Result<ShortKey<'a>> {
    let scoped_len = kind.prefix().len() + run_id.as_str().len();
    let stripped_len = scoped_len + 1;

    if name.len() <= scoped_len {
        return Err(JobMetricsError::malformed_metric_name(format!(
            "'{}' is shorter than the expected prefix '{}{}.'",
            name,
            kind.prefix(),
            run_id
        )));
    }

    if name.as_bytes()[scoped_len] != b'.' {
        return Ok(ShortKey::OtherRun);
    }

    if name.len() <= stripped_len {
        return Err(JobMetricsError::malformed_metric_name(format!(
            "'{}' has an empty key after prefix '{}{}.'",
            name,
            kind.prefix(),
            run_id
        )));
    }

    Ok(ShortKey::Key(&name[stripped_len..]))
}
