//! DashMap 实现的内存指标注册表
//!
//! - 计数器自增无全局锁
//! - `find_all` 返回快照，不阻塞写入
//! - 枚举顺序由 DashMap 分片决定，不保证稳定

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{trace, warn};

use super::{GaugeSummary, MetricRegistry, MetricValue};

/// In-memory registry backed by a sharded concurrent map.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRegistry {
    data: Arc<DashMap<Arc<str>, MetricValue>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry pre-populated with the given entries
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, MetricValue)>,
        S: AsRef<str>,
    {
        let registry = Self::new();
        for (name, value) in entries {
            registry.set(name.as_ref(), value);
        }
        registry
    }

    /// Load entries from a JSON object of `name -> value`
    pub fn from_json(json: &str) -> crate::errors::Result<Self> {
        let entries: HashMap<String, MetricValue> = serde_json::from_str(json)?;
        Ok(Self::from_entries(entries))
    }

    /// Add `delta` to a counter, creating it at `delta` if missing.
    ///
    /// Returns the new value.
    pub fn increment(&self, name: &str, delta: i64) -> i64 {
        // 热点 key 走 get_mut，避免分配 Arc
        if let Some(mut entry) = self.data.get_mut(name) {
            match entry.value_mut() {
                MetricValue::Integer(v) => {
                    *v = v.saturating_add(delta);
                    trace!("InMemoryRegistry: Incremented {} to {}", name, v);
                    return *v;
                }
                other => {
                    warn!(
                        "InMemoryRegistry: {} held a {} value, replacing with counter",
                        name,
                        other.kind()
                    );
                    *other = MetricValue::Integer(delta);
                    return delta;
                }
            }
        }

        let mut value = delta;
        self.data
            .entry(Arc::from(name))
            .and_modify(|v| {
                if let MetricValue::Integer(current) = v {
                    *current = current.saturating_add(delta);
                    value = *current;
                } else {
                    *v = MetricValue::Integer(delta);
                }
            })
            .or_insert(MetricValue::Integer(delta));
        value
    }

    /// Record a gauge observation
    pub fn observe_gauge(&self, name: &str, value: f64) {
        self.data
            .entry(Arc::from(name))
            .and_modify(|v| match v {
                MetricValue::Gauge(g) => g.observe(value),
                _ => *v = MetricValue::Gauge(GaugeSummary::single(value)),
            })
            .or_insert_with(|| MetricValue::Gauge(GaugeSummary::single(value)));
    }

    /// Overwrite an entry
    pub fn set(&self, name: &str, value: MetricValue) {
        self.data.insert(Arc::from(name), value);
    }

    pub fn get(&self, name: &str) -> Option<MetricValue> {
        self.data.get(name).map(|v| *v.value())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl MetricRegistry for InMemoryRegistry {
    fn find_all(&self) -> Vec<(String, MetricValue)> {
        self.data
            .iter()
            .map(|entry| (entry.key().to_string(), *entry.value()))
            .collect()
    }

    fn reset(&self, name: &str) -> bool {
        self.data.remove(name).is_some()
    }
}
