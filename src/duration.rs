use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to milliseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("s", 1_000.0),
    ("m", 60_000.0),
    ("h", 3_600_000.0),
];

/// Parse refresh intervals like "500ms", "2s", "1.5m"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            if !val.is_finite() || val < 0.0 {
                bail!("Duration must be a non-negative number: {}", s)
            }
            let duration = Duration::from_micros((val * multiplier * 1_000.0) as u64);
            if duration.is_zero() {
                bail!("Duration must be at least one microsecond: {}", s)
            }
            return Ok(duration);
        }
    }

    bail!("Unknown duration format: {}", s)
}
