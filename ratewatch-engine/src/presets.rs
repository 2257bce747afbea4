//! Built-in rule sets for the monitored search cluster.

use ratewatch_types::CounterSnapshot;
use serde::{Deserialize, Serialize};

use crate::{RuleConfig, RuleError, RuleSet};

/// A named, ready-made rule configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Per-node statistics.
    Node,
    /// Per node-index pair, aggregated from shard statistics.
    NodeIndex,
}

impl Preset {
    /// The rules this preset registers, in order.
    pub fn rules(self) -> Vec<RuleConfig> {
        match self {
            Preset::Node => vec![
                RuleConfig::rate("index", "indexing_index_total"),
                RuleConfig::rate("indexFailed", "indexing_index_failed"),
                RuleConfig::rate("search", "search_query_total"),
                RuleConfig::rate("merge", "merges_total"),
                RuleConfig::rate("get", "get_total"),
                RuleConfig::rate("refresh", "refresh_total"),
                RuleConfig::rate("flush", "flush_total"),
                RuleConfig::latency(
                    "index",
                    "indexing_index_total",
                    "indexing_index_time_in_millis",
                ),
                RuleConfig::latency("search", "search_query_total", "search_query_time_in_millis"),
                RuleConfig::latency("merge", "merges_total", "merges_total_time_in_millis"),
                RuleConfig::latency("get", "get_total", "get_time_in_millis"),
                RuleConfig::latency("refresh", "refresh_total", "refresh_total_time_in_millis"),
                RuleConfig::latency("flush", "flush_total", "flush_total_time_in_millis"),
            ],
            Preset::NodeIndex => vec![
                RuleConfig::rate("getMissingDoc", "get_missing_doc_total"),
                RuleConfig::rate("index", "indexing_index_total"),
                RuleConfig::rate("indexFailed", "indexing_failed_index_total"),
                RuleConfig::rate("merge", "merges_total"),
                RuleConfig::rate("search", "search_query_total"),
                RuleConfig::latency("index", "indexing_index_total", "indexing_index_total_time"),
                RuleConfig::latency("merge", "merges_total", "merges_total_time"),
                RuleConfig::latency("search", "search_query_total", "search_query_time"),
            ],
        }
    }

    /// Build the preset's rule set.
    pub fn rule_set(self) -> Result<RuleSet<CounterSnapshot>, RuleError> {
        RuleSet::from_configs(&self.rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert_eq!(Preset::Node.rule_set().unwrap().len(), 13);
        assert_eq!(Preset::NodeIndex.rule_set().unwrap().len(), 8);
    }

    #[test]
    fn node_index_outputs() {
        let outputs: Vec<String> = Preset::NodeIndex
            .rules()
            .iter()
            .map(RuleConfig::output_key)
            .collect();

        assert_eq!(
            outputs,
            vec![
                "getMissingDocRatePerSecond",
                "indexRatePerSecond",
                "indexFailedRatePerSecond",
                "mergeRatePerSecond",
                "searchRatePerSecond",
                "indexLatencyInMillis",
                "mergeLatencyInMillis",
                "searchLatencyInMillis",
            ]
        );
    }

    #[test]
    fn deserializes_snake_case() {
        let preset: Preset = serde_json::from_str("\"node_index\"").unwrap();
        assert_eq!(preset, Preset::NodeIndex);
    }
}
