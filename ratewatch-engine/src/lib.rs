//! # ratewatch-engine
//!
//! Turns consecutive polls of cumulative counters into per-interval rates
//! and latencies.
//!
//! Each poll is compared against the previous one for the same target:
//! a rate rule divides a counter's delta by the elapsed seconds, a latency
//! rule divides the delta of a "time spent" counter by the delta of its
//! event count. Only one poll of history is kept.
//!
//! ## Quick Start
//!
//! ```rust
//! use ratewatch_engine::{DeltaEngine, Preset, SnapshotStore};
//! use ratewatch_types::{Millis, Poll};
//!
//! let engine = DeltaEngine::new(Preset::NodeIndex.rule_set()?);
//! let mut store = SnapshotStore::new();
//!
//! let first = Poll::builder()
//!     .entity("my-index-node_id-node1", |e| {
//!         e.counter("merges_total", 30).counter("merges_total_time", 60)
//!     })
//!     .build();
//! engine.run_cycle(&mut store, Some(Millis(1_000)), first.entities);
//!
//! let second = Poll::builder()
//!     .entity("my-index-node_id-node1", |e| {
//!         e.counter("merges_total", 80).counter("merges_total_time", 90)
//!     })
//!     .build();
//! let cycle = engine.run_cycle(&mut store, Some(Millis(11_000)), second.entities);
//!
//! let node = &cycle.entities["my-index-node_id-node1"];
//! assert_eq!(node.derived("mergeRatePerSecond"), Some(5.0));
//! assert_eq!(node.derived("mergeLatencyInMillis"), Some(0.6));
//! # Ok::<(), ratewatch_engine::RuleError>(())
//! ```
//!
//! ## Snapshot shapes
//!
//! The engine is generic over the snapshot type. [`CounterSnapshot`](ratewatch_types::CounterSnapshot)
//! is the map-shaped default wired from [`RuleConfig`]; typed structs such
//! as [`NodeIndexShards`] wire their rules with plain accessor closures.

mod config;
mod engine;
mod error;
mod presets;
mod rule;
mod ruleset;
mod shards;
mod store;
mod targets;

pub use config::RuleConfig;
pub use engine::{Cycle, CycleReport, DeltaEngine, Entity, EntityOutcome};
pub use error::RuleError;
pub use presets::Preset;
pub use rule::{Combinator, EnrichmentRule, Rule};
pub use ruleset::{RuleSet, RuleSetBuilder};
pub use shards::{node_index_shard_rules, NodeIndexShards};
pub use store::SnapshotStore;
pub use targets::TargetStores;
