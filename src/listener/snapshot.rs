use std::fmt;

use crate::registry::GaugeSummary;

/// Job-scoped counter harvested from the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterEntry {
    /// Full registry name, used when resetting
    pub name: String,
    /// Name with `counter.batch.<run-id>.` stripped
    pub short_key: String,
    pub value: i64,
}

impl CounterEntry {
    pub fn new(name: impl Into<String>, short_key: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            short_key: short_key.into(),
            value,
        }
    }
}

impl fmt::Display for CounterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Counter [name={}, value={}]", self.name, self.value)
    }
}

/// Job-scoped gauge harvested from the registry
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeEntry {
    pub name: String,
    pub short_key: String,
    pub summary: GaugeSummary,
}

impl GaugeEntry {
    pub fn new(
        name: impl Into<String>,
        short_key: impl Into<String>,
        summary: GaugeSummary,
    ) -> Self {
        Self {
            name: name.into(),
            short_key: short_key.into(),
            summary,
        }
    }
}

impl fmt::Display for GaugeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gauge [name={}, {}]", self.name, self.summary)
    }
}

/// Immutable result of one extraction.
///
/// Entries keep the registry's enumeration order. Callers must not rely on that
/// order being stable across extractions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    counters: Vec<CounterEntry>,
    gauges: Vec<GaugeEntry>,
    /// Names under the run's prefix that could not be harvested
    skipped: Vec<String>,
}

impl Snapshot {
    pub fn new(counters: Vec<CounterEntry>, gauges: Vec<GaugeEntry>) -> Self {
        Self {
            counters,
            gauges,
            skipped: Vec::new(),
        }
    }

    pub fn with_skipped(mut self, skipped: Vec<String>) -> Self {
        self.skipped = skipped;
        self
    }

    pub fn counters(&self) -> &[CounterEntry] {
        &self.counters
    }

    pub fn gauges(&self) -> &[GaugeEntry] {
        &self.gauges
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.gauges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counters.len() + self.gauges.len()
    }

    /// Full registry names of every entry, counters first
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.counters
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.gauges.iter().map(|g| g.name.as_str()))
    }

    /// Full names of malformed or mistyped entries scoped to the run
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn counter(&self, short_key: &str) -> Option<&CounterEntry> {
        self.counters.iter().find(|c| c.short_key == short_key)
    }

    pub fn gauge(&self, short_key: &str) -> Option<&GaugeEntry> {
        self.gauges.iter().find(|g| g.short_key == short_key)
    }
}
