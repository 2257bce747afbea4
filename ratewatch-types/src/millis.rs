//! Millisecond clock values.
//!
//! Poll timestamps and the intervals between them are both carried as whole
//! milliseconds, matching the unit the monitored service reports its
//! cumulative time counters in.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A quantity of milliseconds.
///
/// Used both as a point in time (milliseconds since the Unix epoch) and as
/// the length of an interval between two polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Millis(pub u64);

impl Millis {
    /// Zero milliseconds.
    pub const ZERO: Millis = Millis(0);

    /// Create from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Create from seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000))
    }

    /// The current wall-clock time as milliseconds since the Unix epoch.
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Self(d.as_millis() as u64))
            .unwrap_or_default()
    }

    /// Get the value in milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Get the value in fractional seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// `self - earlier`, or `None` if `earlier` is later than `self`.
    pub const fn checked_sub(self, earlier: Millis) -> Option<Millis> {
        match self.0.checked_sub(earlier.0) {
            Some(diff) => Some(Millis(diff)),
            None => None,
        }
    }

    /// Convert to a standard Duration.
    pub const fn to_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for Millis {
    fn from(d: Duration) -> Self {
        Self(d.as_millis() as u64)
    }
}

impl From<Millis> for Duration {
    fn from(m: Millis) -> Self {
        Duration::from_millis(m.0)
    }
}

impl From<u64> for Millis {
    fn from(millis: u64) -> Self {
        Self(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        let m = Millis::from(Duration::from_millis(1500));
        assert_eq!(m.as_millis(), 1500);
        assert!((m.as_secs_f64() - 1.5).abs() < f64::EPSILON);

        let d: Duration = m.into();
        assert_eq!(d, Duration::from_millis(1500));
        assert_eq!(Millis::from_secs(10), Millis(10_000));
        assert_eq!(Millis::from_secs(u64::MAX), Millis(u64::MAX));
    }

    #[test]
    fn checked_sub_rejects_backwards_clock() {
        let earlier = Millis(1_000);
        let later = Millis(11_000);

        assert_eq!(later.checked_sub(earlier), Some(Millis(10_000)));
        assert_eq!(earlier.checked_sub(later), None);
        assert_eq!(earlier.checked_sub(earlier), Some(Millis::ZERO));
    }

    #[test]
    fn now_is_after_epoch() {
        assert!(Millis::now() > Millis::ZERO);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&Millis(42)).unwrap();
        assert_eq!(json, "42");
    }
}
