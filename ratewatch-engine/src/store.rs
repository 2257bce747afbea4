//! The previous poll's snapshots, kept for exactly one interval.

use std::collections::BTreeMap;
use std::time::Duration;

use ratewatch_types::{EntityId, Millis};
use tracing::debug;

/// Previous-poll state for one entity type of one monitored target.
///
/// This is the only mutable state the engine touches. It is not
/// synchronized: callers run `begin_cycle`, every enrichment of the
/// cycle, and `commit` without interleaving another cycle on the same
/// store. Provision one store per monitored target (see
/// [`TargetStores`](crate::TargetStores)).
#[derive(Debug, Clone)]
pub struct SnapshotStore<T> {
    /// `None` until the first commit. An empty map is a committed poll
    /// that observed no entities.
    previous: Option<BTreeMap<EntityId, T>>,
    previous_timestamp: Millis,
    current_timestamp: Millis,
}

impl<T> Default for SnapshotStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SnapshotStore<T> {
    /// Create an empty store that has never seen a poll.
    pub fn new() -> Self {
        Self {
            previous: None,
            previous_timestamp: Millis::ZERO,
            current_timestamp: Millis::ZERO,
        }
    }

    /// Stamp the current cycle with the wall clock.
    pub fn begin_cycle(&mut self) -> Millis {
        self.begin_cycle_at(Millis::now())
    }

    /// Stamp the current cycle with a timestamp supplied by the poll.
    ///
    /// Does not touch the previous snapshots.
    pub fn begin_cycle_at(&mut self, timestamp: Millis) -> Millis {
        self.current_timestamp = timestamp;
        timestamp
    }

    /// Timestamp recorded by the last `begin_cycle`.
    pub fn current_timestamp(&self) -> Millis {
        self.current_timestamp
    }

    /// Timestamp of the last committed poll.
    pub fn previous_timestamp(&self) -> Millis {
        self.previous_timestamp
    }

    /// True once any poll has been committed, even an empty one.
    pub fn is_primed(&self) -> bool {
        self.previous.is_some()
    }

    /// The previous snapshot of an entity, if it was observed last poll.
    pub fn previous(&self, entity: &str) -> Option<&T> {
        self.previous.as_ref()?.get(entity)
    }

    /// Every snapshot of the last committed poll.
    pub fn previous_entities(&self) -> Option<&BTreeMap<EntityId, T>> {
        self.previous.as_ref()
    }

    /// Number of entities remembered from the last poll.
    pub fn len(&self) -> usize {
        self.previous.as_ref().map_or(0, BTreeMap::len)
    }

    /// True if no entity is remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time between the previous and the current poll.
    ///
    /// `None` on the very first poll, and when the current timestamp is
    /// earlier than the previous one. A zero-length interval is
    /// `Some(Duration::ZERO)`.
    pub fn interval_elapsed(&self) -> Option<Duration> {
        self.previous.as_ref()?;
        self.current_timestamp
            .checked_sub(self.previous_timestamp)
            .map(Duration::from)
    }

    /// Replace the previous poll with the one just enriched.
    ///
    /// Call exactly once per cycle, after every enrichment of that cycle.
    pub fn commit(&mut self, entities: BTreeMap<EntityId, T>) {
        debug!(
            entities = entities.len(),
            timestamp_ms = self.current_timestamp.as_millis(),
            "committing poll"
        );
        self.previous = Some(entities);
        self.previous_timestamp = self.current_timestamp;
    }

    /// Forget everything, as if no poll had ever been seen.
    pub fn reset(&mut self) {
        self.previous = None;
        self.previous_timestamp = Millis::ZERO;
        self.current_timestamp = Millis::ZERO;
    }
}
