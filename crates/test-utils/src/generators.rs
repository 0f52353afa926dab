//! Generators for timestamp and data series.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// `count` timestamps starting at the given UTC time, `step_secs` apart.
///
/// # Example
///
/// ```
/// use test_utils::timestamps;
///
/// let times = timestamps((2022, 11, 17, 12, 0, 0), 300, 2);
/// assert_eq!(times[1].timestamp(), 1668686700);
/// ```
pub fn timestamps(
    start: (i32, u32, u32, u32, u32, u32),
    step_secs: i64,
    count: usize,
) -> Vec<DateTime<Utc>> {
    let (y, mo, d, h, mi, s) = start;
    let first = Utc
        .with_ymd_and_hms(y, mo, d, h, mi, s)
        .single()
        .expect("Invalid start timestamp");
    (0..count)
        .map(|i| first + Duration::seconds(step_secs * i as i64))
        .collect()
}

/// Values `0, 1, 2, ...` scaled by `step`, for data whose range is easy to check.
pub fn ramp(count: usize, step: f64) -> Vec<f64> {
    (0..count).map(|i| i as f64 * step).collect()
}
