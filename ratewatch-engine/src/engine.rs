//! The delta enrichment algorithm.

use std::collections::BTreeMap;

use ratewatch_types::{CounterSnapshot, EntityId, Millis};
use tracing::{debug, trace};

use crate::{EnrichmentRule, RuleSet, SnapshotStore, TargetStores};

/// A snapshot type the engine can enrich.
///
/// Rules write their own outputs; the engine additionally records how long
/// the measured interval was, so consumers can judge the derived values.
pub trait Entity {
    /// Record the milliseconds between the previous poll and this one.
    fn set_timestamp_diff(&mut self, diff_millis: u64);
}

impl Entity for CounterSnapshot {
    fn set_timestamp_diff(&mut self, diff_millis: u64) {
        self.timestamp_diff = Some(diff_millis);
    }
}

/// What happened to one entity during enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityOutcome {
    /// The entity was present in the previous poll.
    pub history: bool,
    /// Rules that wrote a value.
    pub written: usize,
    /// Rules skipped because a field was missing.
    pub unusable: usize,
    /// Rules skipped because a counter or clock went backwards.
    pub resets: usize,
}

impl EntityOutcome {
    /// True if at least one derived value was written.
    pub fn is_enriched(&self) -> bool {
        self.written > 0
    }
}

/// Totals for one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    /// Entities in the poll.
    pub entities: usize,
    /// Entities with at least one derived value.
    pub enriched: usize,
    /// Entities not seen in the previous poll.
    pub without_history: usize,
    /// Derived values written across all entities.
    pub values_written: usize,
    /// Rule evaluations skipped for missing fields.
    pub unusable: usize,
    /// Rule evaluations skipped for counter resets.
    pub resets: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: &EntityOutcome) {
        self.entities += 1;
        if outcome.is_enriched() {
            self.enriched += 1;
        }
        if !outcome.history {
            self.without_history += 1;
        }
        self.values_written += outcome.written;
        self.unusable += outcome.unusable;
        self.resets += outcome.resets;
    }
}

/// The enriched result of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle<T> {
    /// Timestamp the cycle was stamped with.
    pub timestamp: Millis,
    /// Every entity of the poll, enriched where possible.
    pub entities: BTreeMap<EntityId, T>,
    /// Summary of what was derived.
    pub report: CycleReport,
}

enum RuleOutcome {
    Written,
    Unusable,
    Reset,
}

/// Applies a rule set to consecutive polls.
///
/// # Example
///
/// ```rust
/// use ratewatch_engine::{DeltaEngine, RuleConfig, RuleSet, SnapshotStore};
/// use ratewatch_types::{Millis, Poll};
///
/// let rules = RuleSet::from_configs(&[RuleConfig::rate("index", "indexing_index_total")])?;
/// let engine = DeltaEngine::new(rules);
/// let mut store = SnapshotStore::new();
///
/// let first = Poll::builder()
///     .entity("node1", |e| e.counter("indexing_index_total", 10))
///     .build();
/// engine.run_cycle(&mut store, Some(Millis(1_000)), first.entities);
///
/// let second = Poll::builder()
///     .entity("node1", |e| e.counter("indexing_index_total", 30))
///     .build();
/// let cycle = engine.run_cycle(&mut store, Some(Millis(11_000)), second.entities);
///
/// let node1 = &cycle.entities["node1"];
/// assert_eq!(node1.derived("indexRatePerSecond"), Some(2.0));
/// assert_eq!(node1.timestamp_diff, Some(10_000));
/// # Ok::<(), ratewatch_engine::RuleError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DeltaEngine<T> {
    rules: RuleSet<T>,
}

impl<T: Entity> DeltaEngine<T> {
    /// Create an engine for one entity type.
    pub fn new(rules: RuleSet<T>) -> Self {
        Self { rules }
    }

    /// The rules this engine applies.
    pub fn rules(&self) -> &RuleSet<T> {
        &self.rules
    }

    /// Enrich one entity in place from its previous snapshot.
    ///
    /// Entities absent from the previous poll are left untouched. Each
    /// rule is independent: a rule whose fields are missing, or whose
    /// counter went backwards, leaves its output absent without
    /// affecting the others.
    pub fn enrich_entity(
        &self,
        entity: &str,
        snapshot: &mut T,
        store: &SnapshotStore<T>,
    ) -> EntityOutcome {
        let mut outcome = EntityOutcome::default();

        let Some(previous) = store.previous(entity) else {
            trace!(entity, "no previous snapshot");
            return outcome;
        };
        outcome.history = true;

        for rule in self.rules.iter() {
            match apply_rule(rule, snapshot, previous, store) {
                RuleOutcome::Written => outcome.written += 1,
                RuleOutcome::Unusable => outcome.unusable += 1,
                RuleOutcome::Reset => {
                    debug!(entity, rule = rule.name(), "counter went backwards, skipping");
                    outcome.resets += 1;
                }
            }
        }

        if outcome.is_enriched() {
            if let Some(interval) = store.interval_elapsed() {
                snapshot.set_timestamp_diff(interval.as_millis() as u64);
            }
        }

        outcome
    }

    /// Enrich every entity of a poll against the store's previous poll.
    pub fn enrich_all(
        &self,
        entities: &mut BTreeMap<EntityId, T>,
        store: &SnapshotStore<T>,
    ) -> CycleReport {
        let mut report = CycleReport::default();
        for (id, snapshot) in entities.iter_mut() {
            let outcome = self.enrich_entity(id.as_str(), snapshot, store);
            report.record(&outcome);
        }
        report
    }

    /// Run a whole cycle: stamp, enrich every entity, commit.
    ///
    /// `timestamp` is the poll's own timestamp; `None` stamps the cycle
    /// with the wall clock.
    pub fn run_cycle(
        &self,
        store: &mut SnapshotStore<T>,
        timestamp: Option<Millis>,
        mut entities: BTreeMap<EntityId, T>,
    ) -> Cycle<T>
    where
        T: Clone,
    {
        let timestamp = match timestamp {
            Some(ts) => store.begin_cycle_at(ts),
            None => store.begin_cycle(),
        };

        let report = self.enrich_all(&mut entities, store);
        store.commit(entities.clone());

        debug!(
            timestamp_ms = timestamp.as_millis(),
            entities = report.entities,
            enriched = report.enriched,
            resets = report.resets,
            "cycle complete"
        );

        Cycle {
            timestamp,
            entities,
            report,
        }
    }

    /// Run a cycle against one target's store.
    ///
    /// The target's store stays locked for the whole cycle, so cycles of
    /// the same target never interleave.
    pub fn run_target_cycle(
        &self,
        targets: &TargetStores<T>,
        target: &str,
        timestamp: Option<Millis>,
        entities: BTreeMap<EntityId, T>,
    ) -> Cycle<T>
    where
        T: Clone,
    {
        let store = targets.store(target);
        let mut store = store.lock();
        self.run_cycle(&mut store, timestamp, entities)
    }
}

fn apply_rule<T>(
    rule: &dyn EnrichmentRule<T>,
    current: &mut T,
    previous: &T,
    store: &SnapshotStore<T>,
) -> RuleOutcome {
    if !rule.is_usable(current) || !rule.is_usable(previous) {
        return RuleOutcome::Unusable;
    }

    let new_time = rule.extract_time(current, store.current_timestamp());
    let new_value = rule.extract_value(current);
    let prev_time = rule.extract_time(previous, store.previous_timestamp());
    let prev_value = rule.extract_value(previous);

    if new_time < prev_time || new_value < prev_value {
        return RuleOutcome::Reset;
    }

    let time_delta = rule.normalize_time(new_time - prev_time);
    let value_delta = new_value - prev_value;

    let result = if time_delta > 0.0 && value_delta > 0 {
        rule.combine(time_delta, value_delta)
    } else {
        0.0
    };

    rule.write_result(current, result);
    RuleOutcome::Written
}
