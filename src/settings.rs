//! Startup settings.
//!
//! Settings come from an optional TOML file layered under `RATEWATCH_*`
//! environment variables:
//!
//! ```toml
//! preset = "node_index"
//! target = "prod-cluster"
//! refresh = "10s"
//!
//! [[rules]]
//! name = "refresh"
//! kind = "rate"
//! value_field = "refresh_total"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use ratewatch_engine::{Preset, RuleConfig, RuleSet};
use ratewatch_types::CounterSnapshot;
use serde::Deserialize;

use crate::duration::parse_duration;

/// Target name used when none is configured.
pub const DEFAULT_TARGET: &str = "default";

/// Everything the collector needs to know before the first poll.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Built-in rules registered first.
    pub preset: Option<Preset>,

    /// Extra rules registered after the preset's.
    pub rules: Vec<RuleConfig>,

    /// Name of the monitored target whose history the polls extend.
    pub target: String,

    /// How often to check the source, e.g. `"1s"`.
    pub refresh: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preset: None,
            rules: Vec::new(),
            target: DEFAULT_TARGET.to_string(),
            refresh: "1s".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a file (if it exists) and the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("RATEWATCH"))
            .build()
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        config
            .try_deserialize()
            .context("Invalid settings")
    }

    /// Every configured rule: the preset's first, then the explicit ones.
    pub fn rule_configs(&self) -> Vec<RuleConfig> {
        let mut configs = self.preset.map(Preset::rules).unwrap_or_default();
        configs.extend(self.rules.iter().cloned());
        configs
    }

    /// Build and validate the rule set.
    pub fn rule_set(&self) -> Result<RuleSet<CounterSnapshot>> {
        let configs = self.rule_configs();
        if configs.is_empty() {
            bail!("No enrichment rules configured: set a preset or add [[rules]]")
        }
        Ok(RuleSet::from_configs(&configs)?)
    }

    /// The parsed refresh interval.
    pub fn refresh_interval(&self) -> Result<Duration> {
        parse_duration(&self.refresh)
    }
}
