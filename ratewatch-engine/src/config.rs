//! Declarative rule configuration for map-shaped snapshots.
//!
//! A [`RuleConfig`] names the counter fields a rule reads; it is turned
//! into a [`Rule<CounterSnapshot>`] once at startup.
//!
//! ```toml
//! [[rules]]
//! name = "index"
//! kind = "rate"
//! value_field = "indexing_index_total"
//!
//! [[rules]]
//! name = "index"
//! kind = "latency"
//! value_field = "indexing_index_total"
//! time_field = "indexing_index_total_time"
//! ```

use ratewatch_types::CounterSnapshot;
use serde::{Deserialize, Serialize};

use crate::{Combinator, Rule, RuleError};

/// Field wiring for one derived metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Prefix of the output field, e.g. `index` -> `indexRatePerSecond`.
    pub name: String,

    /// Which formula to apply.
    pub kind: Combinator,

    /// Cumulative count counter.
    pub value_field: String,

    /// Cumulative time counter in milliseconds (latency rules only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_field: Option<String>,
}

impl RuleConfig {
    /// A rate over `value_field`.
    pub fn rate(name: impl Into<String>, value_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Combinator::Rate,
            value_field: value_field.into(),
            time_field: None,
        }
    }

    /// A latency of `time_field` per unit of `value_field`.
    pub fn latency(
        name: impl Into<String>,
        value_field: impl Into<String>,
        time_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: Combinator::Latency,
            value_field: value_field.into(),
            time_field: Some(time_field.into()),
        }
    }

    /// The derived field this rule writes.
    pub fn output_key(&self) -> String {
        format!("{}{}", self.name, self.kind.output_suffix())
    }

    /// Check the wiring is complete for the rule's kind.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.name.trim().is_empty() {
            return Err(RuleError::EmptyName);
        }
        if self.value_field.is_empty() {
            return Err(RuleError::EmptyField {
                rule: self.name.clone(),
                field: "value_field",
            });
        }

        match (self.kind, self.time_field.as_deref()) {
            (Combinator::Rate, Some(_)) => Err(RuleError::UnexpectedTimeField(self.name.clone())),
            (Combinator::Latency, None) => Err(RuleError::MissingTimeField(self.name.clone())),
            (Combinator::Latency, Some("")) => Err(RuleError::EmptyField {
                rule: self.name.clone(),
                field: "time_field",
            }),
            _ => Ok(()),
        }
    }
}

impl Rule<CounterSnapshot> {
    /// Build a rule that reads and writes named fields of a
    /// [`CounterSnapshot`].
    pub fn from_config(config: &RuleConfig) -> Result<Self, RuleError> {
        config.validate()?;

        let value_field = config.value_field.clone();
        let output = config.output_key();
        let value = move |s: &CounterSnapshot| s.counter(&value_field);
        let write = move |s: &mut CounterSnapshot, v: f64| s.set_derived(output.as_str(), v);

        let rule = match (config.kind, config.time_field.clone()) {
            (Combinator::Latency, Some(time_field)) => Rule::latency(
                config.name.clone(),
                value,
                move |s: &CounterSnapshot| s.counter(&time_field),
                write,
            ),
            _ => Rule::rate(config.name.clone(), value, write),
        };

        Ok(rule)
    }
}
