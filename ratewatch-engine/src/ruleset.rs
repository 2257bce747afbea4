//! The ordered, immutable list of rules for one entity type.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use ratewatch_types::CounterSnapshot;

use crate::{EnrichmentRule, Rule, RuleConfig, RuleError};

/// The rules applied to every entity of one type.
///
/// Built once at startup and shared; cloning is a reference-count bump.
pub struct RuleSet<T> {
    rules: Arc<[Arc<dyn EnrichmentRule<T>>]>,
}

impl<T> RuleSet<T> {
    /// Create a builder for a rule set.
    pub fn builder() -> RuleSetBuilder<T> {
        RuleSetBuilder::new()
    }

    /// A rule set that derives nothing.
    pub fn empty() -> Self {
        RuleSetBuilder::new().build()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over the rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn EnrichmentRule<T> + 'static)> + '_ {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    /// Rule names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|rule| rule.name()).collect()
    }
}

impl RuleSet<CounterSnapshot> {
    /// Build a rule set from declarative configuration.
    ///
    /// Fails if any rule is malformed or two rules share an output field.
    pub fn from_configs(configs: &[RuleConfig]) -> Result<Self, RuleError> {
        let mut outputs = BTreeSet::new();
        let mut builder = RuleSetBuilder::new();

        for config in configs {
            let rule = Rule::from_config(config)?;
            let output = config.output_key();
            if !outputs.insert(output.clone()) {
                return Err(RuleError::DuplicateOutput(output));
            }
            builder = builder.rule(rule);
        }

        Ok(builder.build())
    }
}

impl<T> Clone for RuleSet<T> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
        }
    }
}

impl<T> fmt::Debug for RuleSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<T> Default for RuleSet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builder for `RuleSet`.
pub struct RuleSetBuilder<T> {
    rules: Vec<Arc<dyn EnrichmentRule<T>>>,
}

impl<T> RuleSetBuilder<T> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule.
    pub fn rule<R>(mut self, rule: R) -> Self
    where
        R: EnrichmentRule<T> + 'static,
    {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Freeze the rules.
    pub fn build(self) -> RuleSet<T> {
        RuleSet {
            rules: Arc::from(self.rules),
        }
    }
}

impl<T> Default for RuleSetBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
