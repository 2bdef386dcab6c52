//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    if let Some(ns) = duration.num_nanoseconds() {
        Some(ns as f64 / NANOS_PER_SECOND as f64)
    }
    else {
        None
    }
}

/// Convert a millisecond period given as a float into a `std` duration.
///
/// Negative and NaN periods are treated as zero, periods too long to
/// represent saturate at the longest `Duration`.
pub fn millis_to_duration(millis: f64) -> std::time::Duration {
    if millis.is_nan() || millis <= 0.0 {
        return std::time::Duration::from_secs(0)
    }

    let secs = millis / 1000.0;
    if secs >= u64::MAX as f64 {
        std::time::Duration::new(u64::MAX, 999_999_999)
    }
    else {
        std::time::Duration::from_secs_f64(secs)
    }
}
