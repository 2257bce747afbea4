//! Error types for rule registration.

use thiserror::Error;

/// Errors raised while registering enrichment rules at startup.
///
/// Enrichment itself never fails; only a malformed rule configuration is
/// rejected, before the first poll cycle runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The rule has no name, so its output key would be just a suffix.
    #[error("rule name must not be empty")]
    EmptyName,

    /// A field reference is an empty string.
    #[error("rule `{rule}` has an empty {field}")]
    EmptyField {
        /// Name of the offending rule.
        rule: String,
        /// Which field reference was empty.
        field: &'static str,
    },

    /// Latency rules divide a time counter by a count and need both.
    #[error("latency rule `{0}` requires a time_field")]
    MissingTimeField(String),

    /// Rate rules use the poll clock as their time basis.
    #[error("rate rule `{0}` must not set a time_field")]
    UnexpectedTimeField(String),

    /// Two rules would write the same derived field.
    #[error("derived field `{0}` is produced by more than one rule")]
    DuplicateOutput(String),
}
