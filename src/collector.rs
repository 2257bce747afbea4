//! Per-target poll processing.

use std::collections::BTreeMap;

use ratewatch_engine::{CycleReport, DeltaEngine, RuleSet, TargetStores};
use ratewatch_types::{CounterSnapshot, EntityId, Millis, Poll};
use tracing::{debug, warn};

/// One poll after enrichment, ready to be emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPoll {
    /// Monitored target the poll belongs to.
    pub target: String,
    /// Timestamp the cycle ran with.
    pub timestamp: Millis,
    /// Every entity of the poll.
    pub entities: BTreeMap<EntityId, CounterSnapshot>,
    /// What was derived.
    pub report: CycleReport,
}

/// Runs every incoming poll through the engine, keeping one history per
/// monitored target.
///
/// # Example
///
/// ```
/// use ratewatch::Collector;
/// use ratewatch_engine::Preset;
/// use ratewatch_types::Poll;
///
/// let collector = Collector::new(Preset::NodeIndex.rule_set().unwrap());
///
/// let poll = Poll::builder()
///     .timestamp_ms(1_000)
///     .entity("my-index-node_id-node1", |e| e.counter("merges_total", 30))
///     .build();
/// let enriched = collector.process("prod", poll);
///
/// assert_eq!(enriched.report.without_history, 1);
/// ```
#[derive(Debug)]
pub struct Collector {
    engine: DeltaEngine<CounterSnapshot>,
    stores: TargetStores<CounterSnapshot>,
}

impl Collector {
    /// Create a collector applying the given rules.
    pub fn new(rules: RuleSet<CounterSnapshot>) -> Self {
        Self {
            engine: DeltaEngine::new(rules),
            stores: TargetStores::new(),
        }
    }

    /// Enrich one poll against the previous poll of the same target.
    ///
    /// Polls without a timestamp are stamped with the wall clock.
    pub fn process(&self, target: &str, poll: Poll) -> EnrichedPoll {
        if !poll.version.is_compatible() {
            warn!(
                target_name = target,
                major = poll.version.major,
                minor = poll.version.minor,
                "poll schema version is not compatible, enriching anyway"
            );
        }

        let timestamp = poll.timestamp();
        let cycle = self
            .engine
            .run_target_cycle(&self.stores, target, timestamp, poll.entities);

        debug!(
            target_name = target,
            entities = cycle.report.entities,
            enriched = cycle.report.enriched,
            "poll processed"
        );

        EnrichedPoll {
            target: target.to_string(),
            timestamp: cycle.timestamp,
            entities: cycle.entities,
            report: cycle.report,
        }
    }

    /// Forget a target's history, e.g. after the cluster was rebuilt.
    pub fn reset(&self, target: &str) -> bool {
        self.stores.reset(target)
    }

    /// Targets seen so far.
    pub fn targets(&self) -> Vec<String> {
        self.stores.targets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratewatch_engine::Preset;

    fn poll(ts: u64, total: u64) -> Poll {
        Poll::builder()
            .timestamp_ms(ts)
            .entity("node1", |e| e.counter("indexing_index_total", total))
            .build()
    }

    fn collector() -> Collector {
        Collector::new(Preset::Node.rule_set().unwrap())
    }

    #[test]
    fn test_second_poll_is_enriched() {
        let collector = collector();

        let first = collector.process("prod", poll(1_000, 10));
        assert_eq!(first.report.enriched, 0);
        assert_eq!(first.timestamp, Millis(1_000));

        let second = collector.process("prod", poll(11_000, 30));
        let node1 = &second.entities["node1"];
        assert_eq!(node1.derived("indexRatePerSecond"), Some(2.0));
        assert_eq!(node1.timestamp_diff, Some(10_000));
        assert_eq!(second.target, "prod");
    }

    #[test]
    fn test_targets_are_isolated() {
        let collector = collector();

        collector.process("prod", poll(1_000, 10));
        let staging = collector.process("staging", poll(11_000, 30));

        assert!(!staging.entities["node1"].is_enriched());
        assert_eq!(collector.targets(), vec!["prod".to_string(), "staging".to_string()]);
    }

    #[test]
    fn test_reset_starts_history_over() {
        let collector = collector();

        collector.process("prod", poll(1_000, 10));
        assert!(collector.reset("prod"));

        let after = collector.process("prod", poll(11_000, 30));
        assert!(!after.entities["node1"].is_enriched());
    }

    #[test]
    fn test_unstamped_poll_uses_wall_clock() {
        let collector = collector();

        let unstamped = Poll::builder()
            .entity("node1", |e| e.counter("indexing_index_total", 10))
            .build();
        let enriched = collector.process("prod", unstamped);

        assert!(enriched.timestamp > Millis::ZERO);
    }
}
