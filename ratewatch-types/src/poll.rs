//! Poll - every entity snapshot observed in one poll cycle.

use std::collections::BTreeMap;

use crate::{CounterSnapshot, CounterSnapshotBuilder, EntityId, Millis, SchemaVersion};

/// The snapshots collected for one monitored target in one poll cycle.
///
/// Polls are produced by a fetch collaborator, handed to the engine for
/// enrichment, and then emitted downstream.
///
/// # Example
///
/// ```rust
/// use ratewatch_types::{Millis, Poll};
///
/// let poll = Poll::builder()
///     .timestamp_ms(1_000)
///     .entity("node1", |e| e.counter("indexing_index_total", 10))
///     .build();
///
/// assert_eq!(poll.timestamp(), Some(Millis(1_000)));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Poll {
    /// Schema version for forward compatibility.
    #[cfg_attr(feature = "serde", serde(default))]
    pub version: SchemaVersion,

    /// Unix timestamp in milliseconds when the poll was taken.
    ///
    /// `None` means the poll should be stamped when its cycle begins.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub timestamp_ms: Option<u64>,

    /// Snapshot per entity observed in this poll.
    #[cfg_attr(feature = "serde", serde(default))]
    pub entities: BTreeMap<EntityId, CounterSnapshot>,
}

impl Poll {
    /// Create an empty, unstamped poll.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty poll with a specific timestamp.
    pub fn with_timestamp(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            ..Self::default()
        }
    }

    /// Create a builder for constructing polls.
    pub fn builder() -> PollBuilder {
        PollBuilder::new()
    }

    /// The poll timestamp, if one was recorded by the producer.
    pub fn timestamp(&self) -> Option<Millis> {
        self.timestamp_ms.map(Millis)
    }

    /// Check if the poll observed no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities in the poll.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Get the snapshot for a specific entity.
    pub fn get(&self, entity: &str) -> Option<&CounterSnapshot> {
        self.entities.get(entity)
    }

    /// Iterate over all entities.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &CounterSnapshot)> {
        self.entities.iter()
    }
}

/// Builder for constructing `Poll` instances.
#[derive(Debug, Default)]
pub struct PollBuilder {
    timestamp_ms: Option<u64>,
    entities: BTreeMap<EntityId, CounterSnapshot>,
}

impl PollBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    /// Add an entity with counters built using a closure.
    pub fn entity<F>(mut self, id: impl Into<EntityId>, f: F) -> Self
    where
        F: FnOnce(CounterSnapshotBuilder) -> CounterSnapshotBuilder,
    {
        let snapshot = f(CounterSnapshotBuilder::new()).build();
        self.entities.insert(id.into(), snapshot);
        self
    }

    /// Add an entity with a pre-built snapshot.
    pub fn entity_snapshot(mut self, id: impl Into<EntityId>, snapshot: CounterSnapshot) -> Self {
        self.entities.insert(id.into(), snapshot);
        self
    }

    /// Build the poll.
    pub fn build(self) -> Poll {
        Poll {
            version: SchemaVersion::current(),
            timestamp_ms: self.timestamp_ms,
            entities: self.entities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_entities() {
        let poll = Poll::builder()
            .timestamp_ms(11_000)
            .entity("node1", |e| e.counter("indexing_index_total", 30))
            .entity("node2", |e| e.counter("indexing_index_total", 4))
            .build();

        assert_eq!(poll.len(), 2);
        assert_eq!(poll.timestamp(), Some(Millis(11_000)));
        assert!(poll.version.is_compatible());
        assert_eq!(
            poll.get("node2").and_then(|s| s.counter("indexing_index_total")),
            Some(4)
        );
    }

    #[test]
    fn unstamped_poll_has_no_timestamp() {
        let poll = Poll::new();
        assert!(poll.is_empty());
        assert_eq!(poll.timestamp(), None);
        assert_eq!(Poll::with_timestamp(5).timestamp(), Some(Millis(5)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn parses_minimal_json() {
        let json = r#"{
            "timestamp_ms": 1000,
            "entities": {
                "node1": { "counters": { "indexing_index_total": 10 } }
            }
        }"#;

        let poll: Poll = serde_json::from_str(json).unwrap();

        assert_eq!(poll.timestamp(), Some(Millis(1_000)));
        assert_eq!(poll.version, SchemaVersion::current());
        assert_eq!(
            poll.get("node1").and_then(|s| s.counter("indexing_index_total")),
            Some(10)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip() {
        let poll = Poll::builder()
            .timestamp_ms(1_703_160_000_000)
            .entity("node1", |e| e.counter("merges_total", 42).absent("merges_total_time"))
            .build();

        let json = serde_json::to_string(&poll).unwrap();
        let parsed: Poll = serde_json::from_str(&json).unwrap();

        assert_eq!(poll, parsed);
    }
}
