//! Typed snapshot of one index's shards on one node.

use serde::{Deserialize, Serialize};

use crate::{Entity, Rule, RuleSet};

/// Shard statistics of one index, summed over the shards one node holds.
///
/// Counters are `None` when the node did not report them. Derived fields
/// start out `None` and are filled in by [`node_index_shard_rules`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeIndexShards {
    /// Index name.
    pub index: String,
    /// Entity key, `<index>-node_id-<node_id>`.
    pub index_node: String,
    /// Node holding the shards.
    pub node_id: String,

    /// Cumulative counters summed over the node's shards of this index.
    /// Time counters are in milliseconds.
    #[serde(default)]
    pub get_missing_doc_total: Option<u64>,
    #[serde(default)]
    pub indexing_index_total: Option<u64>,
    #[serde(default)]
    pub indexing_index_total_time: Option<u64>,
    #[serde(default)]
    pub indexing_failed_index_total: Option<u64>,
    #[serde(default)]
    pub merges_total: Option<u64>,
    #[serde(default)]
    pub merges_total_time: Option<u64>,
    #[serde(default)]
    pub search_query_total: Option<u64>,
    #[serde(default)]
    pub search_query_time: Option<u64>,

    /// Derived rates per second, absent until two consecutive polls allow
    /// them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_missing_doc_rate_per_second: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_rate_per_second: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_failed_rate_per_second: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_rate_per_second: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_rate_per_second: Option<f64>,
    /// Derived average latencies in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_latency_in_millis: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_latency_in_millis: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_latency_in_millis: Option<f64>,

    /// Milliseconds since the previous poll, set when anything was derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_diff: Option<u64>,
}

impl NodeIndexShards {
    /// Create an entry with no counters reported yet.
    pub fn new(index: impl Into<String>, node_id: impl Into<String>) -> Self {
        let index = index.into();
        let node_id = node_id.into();
        Self {
            index_node: format!("{}-node_id-{}", index, node_id),
            index,
            node_id,
            ..Default::default()
        }
    }
}

impl Entity for NodeIndexShards {
    fn set_timestamp_diff(&mut self, diff_millis: u64) {
        self.timestamp_diff = Some(diff_millis);
    }
}

/// The node-index rates and latencies, wired to [`NodeIndexShards`] fields.
pub fn node_index_shard_rules() -> RuleSet<NodeIndexShards> {
    RuleSet::builder()
        .rule(Rule::rate(
            "getMissingDoc",
            |s: &NodeIndexShards| s.get_missing_doc_total,
            |s: &mut NodeIndexShards, v| s.get_missing_doc_rate_per_second = Some(v),
        ))
        .rule(Rule::rate(
            "index",
            |s: &NodeIndexShards| s.indexing_index_total,
            |s: &mut NodeIndexShards, v| s.index_rate_per_second = Some(v),
        ))
        .rule(Rule::rate(
            "indexFailed",
            |s: &NodeIndexShards| s.indexing_failed_index_total,
            |s: &mut NodeIndexShards, v| s.index_failed_rate_per_second = Some(v),
        ))
        .rule(Rule::rate(
            "merge",
            |s: &NodeIndexShards| s.merges_total,
            |s: &mut NodeIndexShards, v| s.merge_rate_per_second = Some(v),
        ))
        .rule(Rule::rate(
            "search",
            |s: &NodeIndexShards| s.search_query_total,
            |s: &mut NodeIndexShards, v| s.search_rate_per_second = Some(v),
        ))
        .rule(Rule::latency(
            "index",
            |s: &NodeIndexShards| s.indexing_index_total,
            |s: &NodeIndexShards| s.indexing_index_total_time,
            |s: &mut NodeIndexShards, v| s.index_latency_in_millis = Some(v),
        ))
        .rule(Rule::latency(
            "merge",
            |s: &NodeIndexShards| s.merges_total,
            |s: &NodeIndexShards| s.merges_total_time,
            |s: &mut NodeIndexShards, v| s.merge_latency_in_millis = Some(v),
        ))
        .rule(Rule::latency(
            "search",
            |s: &NodeIndexShards| s.search_query_total,
            |s: &NodeIndexShards| s.search_query_time,
            |s: &mut NodeIndexShards, v| s.search_latency_in_millis = Some(v),
        ))
        .build()
}
