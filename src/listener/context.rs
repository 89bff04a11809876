//! Execution context of a job instance
//!
//! The context outlives individual run attempts: it is read before merging to
//! recover counter totals left by earlier attempts, and committed after merging.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{JobMetricsError, Result};
use crate::job::JobInstanceKey;
use crate::registry::GaugeSummary;

/// Value stored in an execution context
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ContextValue {
    Long(i64),
    Gauge(GaugeSummary),
}

impl ContextValue {
    pub fn as_long(&self) -> Option<i64> {
        match self {
            ContextValue::Long(v) => Some(*v),
            ContextValue::Gauge(_) => None,
        }
    }

    pub fn as_gauge(&self) -> Option<&GaugeSummary> {
        match self {
            ContextValue::Gauge(g) => Some(g),
            ContextValue::Long(_) => None,
        }
    }
}

/// Key-value store owned by one job instance.
///
/// The batch framework guarantees attempts of the same instance run serially, so
/// implementations need no internal synchronisation.
pub trait ExecutionContext {
    fn get(&self, key: &str) -> Option<ContextValue>;

    fn put(&mut self, key: &str, value: ContextValue);

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Make the values written so far durable.
    ///
    /// The listener resets registry entries only after this succeeds.
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Map-backed context, optionally persisted as a JSON file on commit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapExecutionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instance: Option<JobInstanceKey>,
    #[serde(default)]
    entries: BTreeMap<String, ContextValue>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl MapExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_instance(instance: JobInstanceKey) -> Self {
        Self {
            instance: Some(instance),
            ..Self::default()
        }
    }

    /// Open a file-backed context. A missing file yields an empty context that is
    /// created on first commit.
    ///
    /// Fails with `Validation` if the file belongs to a different job instance.
    pub fn open(path: impl AsRef<Path>, instance: Option<JobInstanceKey>) -> Result<Self> {
        let path = path.as_ref();
        let mut ctx = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                JobMetricsError::context_store(format!("Failed to read {}: {}", path.display(), e))
            })?;
            serde_json::from_str::<MapExecutionContext>(&content)?
        } else {
            debug!("Execution context {} not found, starting empty", path.display());
            Self::default()
        };

        if let Some(expected) = instance {
            if let Some(stored) = &ctx.instance
                && *stored != expected
            {
                return Err(JobMetricsError::validation(format!(
                    "Execution context {} belongs to job instance '{}', not '{}'",
                    path.display(),
                    stored,
                    expected
                )));
            }
            ctx.instance = Some(expected);
        }

        ctx.path = Some(path.to_path_buf());
        Ok(ctx)
    }

    pub fn instance(&self) -> Option<&JobInstanceKey> {
        self.instance.as_ref()
    }

    pub fn entries(&self) -> &BTreeMap<String, ContextValue> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ExecutionContext for MapExecutionContext {
    fn get(&self, key: &str) -> Option<ContextValue> {
        self.entries.get(key).copied()
    }

    fn put(&mut self, key: &str, value: ContextValue) {
        self.entries.insert(key.to_string(), value);
    }

    fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn commit(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        // 先写临时文件再 rename，避免写一半崩溃留下损坏的上下文
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(|e| {
            JobMetricsError::context_store(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, path).map_err(|e| {
            JobMetricsError::context_store(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        debug!(
            "Execution context committed to {} ({} entries)",
            path.display(),
            self.entries.len()
        );
        Ok(())
    }
}
