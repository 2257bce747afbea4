//! Enrichment rules: how one derived metric is computed from a snapshot.

use std::fmt;
use std::sync::Arc;

use ratewatch_types::Millis;
use serde::{Deserialize, Serialize};

/// One derived metric over a snapshot type `T`.
///
/// Rules are stateless and registered once at startup. The engine calls
/// [`is_usable`](EnrichmentRule::is_usable) on both the new and the
/// previous snapshot before trusting any extraction; the extract methods
/// are never called on a snapshot that failed that check.
pub trait EnrichmentRule<T>: Send + Sync {
    /// Short name used in logs, e.g. `"index"`.
    fn name(&self) -> &str;

    /// True iff every field this rule reads is present.
    fn is_usable(&self, snapshot: &T) -> bool;

    /// The raw cumulative counter.
    fn extract_value(&self, snapshot: &T) -> u64;

    /// The time basis in milliseconds: either a cumulative time counter
    /// or the poll timestamp itself.
    fn extract_time(&self, snapshot: &T, poll_timestamp: Millis) -> u64;

    /// Convert a raw millisecond delta into the unit `combine` expects.
    fn normalize_time(&self, raw_millis: u64) -> f64;

    /// Produce the final value from non-zero deltas.
    fn combine(&self, time_delta: f64, value_delta: u64) -> f64;

    /// Store the computed value on the snapshot.
    fn write_result(&self, snapshot: &mut T, value: f64);
}

/// The two formulas the engine ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// Events per second: `value_delta / seconds`.
    Rate,
    /// Milliseconds per event: `time_delta_millis / value_delta`.
    Latency,
}

impl Combinator {
    /// Rates work in seconds, latencies stay in milliseconds.
    pub fn normalize_time(self, raw_millis: u64) -> f64 {
        match self {
            Combinator::Rate => raw_millis as f64 / 1_000.0,
            Combinator::Latency => raw_millis as f64,
        }
    }

    /// Apply the formula.
    pub fn combine(self, time_delta: f64, value_delta: u64) -> f64 {
        match self {
            Combinator::Rate => value_delta as f64 / time_delta,
            Combinator::Latency => time_delta / value_delta as f64,
        }
    }

    /// Suffix appended to a rule name to form its output field.
    pub fn output_suffix(self) -> &'static str {
        match self {
            Combinator::Rate => "RatePerSecond",
            Combinator::Latency => "LatencyInMillis",
        }
    }
}

type Accessor<T> = Arc<dyn Fn(&T) -> Option<u64> + Send + Sync>;
type Writer<T> = Arc<dyn Fn(&mut T, f64) + Send + Sync>;

/// Where a rule reads its time basis from.
enum TimeBasis<T> {
    /// The poll's wall-clock timestamp, shared by every rate rule.
    PollClock,
    /// A cumulative "time spent" counter on the snapshot.
    Counter(Accessor<T>),
}

impl<T> Clone for TimeBasis<T> {
    fn clone(&self) -> Self {
        match self {
            TimeBasis::PollClock => TimeBasis::PollClock,
            TimeBasis::Counter(f) => TimeBasis::Counter(Arc::clone(f)),
        }
    }
}

/// A rule wired from plain accessor functions.
///
/// # Example
///
/// ```rust
/// use ratewatch_engine::{Combinator, Rule};
///
/// #[derive(Default)]
/// struct NodeStats {
///     index_total: Option<u64>,
///     index_rate: Option<f64>,
/// }
///
/// let rule = Rule::rate(
///     "index",
///     |s: &NodeStats| s.index_total,
///     |s: &mut NodeStats, v| s.index_rate = Some(v),
/// );
/// assert_eq!(rule.combinator(), Combinator::Rate);
/// ```
pub struct Rule<T> {
    name: String,
    combinator: Combinator,
    value: Accessor<T>,
    time: TimeBasis<T>,
    write: Writer<T>,
}

impl<T> Rule<T> {
    /// A rate rule: counter delta per second of poll-clock time.
    pub fn rate<V, W>(name: impl Into<String>, value: V, write: W) -> Self
    where
        V: Fn(&T) -> Option<u64> + Send + Sync + 'static,
        W: Fn(&mut T, f64) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            combinator: Combinator::Rate,
            value: Arc::new(value),
            time: TimeBasis::PollClock,
            write: Arc::new(write),
        }
    }

    /// A latency rule: time-counter delta per unit of count delta.
    pub fn latency<V, C, W>(name: impl Into<String>, value: V, time: C, write: W) -> Self
    where
        V: Fn(&T) -> Option<u64> + Send + Sync + 'static,
        C: Fn(&T) -> Option<u64> + Send + Sync + 'static,
        W: Fn(&mut T, f64) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            combinator: Combinator::Latency,
            value: Arc::new(value),
            time: TimeBasis::Counter(Arc::new(time)),
            write: Arc::new(write),
        }
    }

    /// The formula this rule applies.
    pub fn combinator(&self) -> Combinator {
        self.combinator
    }
}

impl<T> Clone for Rule<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            combinator: self.combinator,
            value: Arc::clone(&self.value),
            time: self.time.clone(),
            write: Arc::clone(&self.write),
        }
    }
}

impl<T> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("combinator", &self.combinator)
            .field("poll_clock", &matches!(self.time, TimeBasis::PollClock))
            .finish()
    }
}

impl<T> EnrichmentRule<T> for Rule<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_usable(&self, snapshot: &T) -> bool {
        let time_ok = match &self.time {
            TimeBasis::PollClock => true,
            TimeBasis::Counter(time) => time(snapshot).is_some(),
        };
        time_ok && (self.value)(snapshot).is_some()
    }

    fn extract_value(&self, snapshot: &T) -> u64 {
        (self.value)(snapshot).unwrap_or_default()
    }

    fn extract_time(&self, snapshot: &T, poll_timestamp: Millis) -> u64 {
        match &self.time {
            TimeBasis::PollClock => poll_timestamp.as_millis(),
            TimeBasis::Counter(time) => time(snapshot).unwrap_or_default(),
        }
    }

    fn normalize_time(&self, raw_millis: u64) -> f64 {
        self.combinator.normalize_time(raw_millis)
    }

    fn combine(&self, time_delta: f64, value_delta: u64) -> f64 {
        self.combinator.combine(time_delta, value_delta)
    }

    fn write_result(&self, snapshot: &mut T, value: f64) {
        (self.write)(snapshot, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Stats {
        total: Option<u64>,
        time: Option<u64>,
        out: Option<f64>,
    }

    fn latency_rule() -> Rule<Stats> {
        Rule::latency(
            "search",
            |s: &Stats| s.total,
            |s: &Stats| s.time,
            |s: &mut Stats, v| s.out = Some(v),
        )
    }

    #[test]
    fn rate_normalizes_to_seconds() {
        assert_eq!(Combinator::Rate.normalize_time(10_000), 10.0);
        assert_eq!(Combinator::Rate.combine(10.0, 20), 2.0);
    }

    #[test]
    fn latency_stays_in_millis() {
        assert_eq!(Combinator::Latency.normalize_time(10), 10.0);
        assert_eq!(Combinator::Latency.combine(10.0, 20), 0.5);
    }

    #[test]
    fn output_suffixes() {
        assert_eq!(Combinator::Rate.output_suffix(), "RatePerSecond");
        assert_eq!(Combinator::Latency.output_suffix(), "LatencyInMillis");
    }

    #[test]
    fn rate_rule_reads_poll_clock() {
        let rule = Rule::rate("search", |s: &Stats| s.total, |s: &mut Stats, v| s.out = Some(v));
        let stats = Stats {
            total: Some(5),
            ..Default::default()
        };

        assert!(rule.is_usable(&stats));
        assert_eq!(rule.extract_time(&stats, Millis(1_234)), 1_234);
        assert_eq!(rule.extract_value(&stats), 5);
    }

    #[test]
    fn latency_rule_needs_both_fields() {
        let rule = latency_rule();

        let only_total = Stats {
            total: Some(5),
            ..Default::default()
        };
        let only_time = Stats {
            time: Some(5),
            ..Default::default()
        };
        let both = Stats {
            total: Some(5),
            time: Some(70),
            out: None,
        };

        assert!(!rule.is_usable(&only_total));
        assert!(!rule.is_usable(&only_time));
        assert!(rule.is_usable(&both));
        assert_eq!(rule.extract_time(&both, Millis(1_234)), 70);
    }

    #[test]
    fn write_result_stores_value() {
        let rule = latency_rule();
        let mut stats = Stats::default();

        rule.write_result(&mut stats, 0.25);
        assert_eq!(stats.out, Some(0.25));
    }

    #[test]
    fn combinator_deserializes_lowercase() {
        let kind: Combinator = serde_json::from_str("\"latency\"").unwrap();
        assert_eq!(kind, Combinator::Latency);
    }
}
