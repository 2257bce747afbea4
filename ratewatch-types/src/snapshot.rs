//! Per-entity counter snapshots.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Stable key identifying one monitored entity across polls.
///
/// The key is opaque: a node id, or a composite such as
/// `"my-index-node_id-node1"` for a node-index pair. It must be unique
/// within one poll.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityId(String);

impl EntityId {
    /// Create a new entity id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Raw cumulative counters for one entity at one poll, plus any values
/// derived from them.
///
/// A counter mapped to `None` and a counter missing from the map are the
/// same thing: the field was not reported this poll. Derived values are
/// only ever present when they were measured; a measured rate of zero is
/// stored as `0.0`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CounterSnapshot {
    /// Cumulative counters as reported by the monitored service.
    #[cfg_attr(feature = "serde", serde(default))]
    pub counters: BTreeMap<String, Option<u64>>,

    /// Rates and latencies written by enrichment rules.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "BTreeMap::is_empty")
    )]
    pub derived: BTreeMap<String, f64>,

    /// Milliseconds between the previous poll and this one, present only
    /// when at least one derived value was written.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            rename = "timestampDiff",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub timestamp_diff: Option<u64>,
}

impl CounterSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for a snapshot.
    pub fn builder() -> CounterSnapshotBuilder {
        CounterSnapshotBuilder::new()
    }

    /// Read a counter, `None` if it was not reported.
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied().flatten()
    }

    /// Set a counter value.
    pub fn set_counter(&mut self, name: impl Into<String>, value: u64) {
        self.counters.insert(name.into(), Some(value));
    }

    /// Mark a counter as not reported.
    pub fn clear_counter(&mut self, name: &str) {
        self.counters.remove(name);
    }

    /// Read a derived value.
    pub fn derived(&self, name: &str) -> Option<f64> {
        self.derived.get(name).copied()
    }

    /// Write a derived value.
    pub fn set_derived(&mut self, name: impl Into<String>, value: f64) {
        self.derived.insert(name.into(), value);
    }

    /// True if any derived value has been written.
    pub fn is_enriched(&self) -> bool {
        !self.derived.is_empty()
    }
}

/// Builder for `CounterSnapshot`.
#[derive(Debug, Default)]
pub struct CounterSnapshotBuilder {
    counters: BTreeMap<String, Option<u64>>,
}

impl CounterSnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a reported counter.
    pub fn counter(mut self, name: impl Into<String>, value: u64) -> Self {
        self.counters.insert(name.into(), Some(value));
        self
    }

    /// Record a counter as explicitly not reported.
    pub fn absent(mut self, name: impl Into<String>) -> Self {
        self.counters.insert(name.into(), None);
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> CounterSnapshot {
        CounterSnapshot {
            counters: self.counters,
            derived: BTreeMap::new(),
            timestamp_diff: None,
        }
    }
}
