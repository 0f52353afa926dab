//! Time fields for AMOF files.
//!
//! Every AMOF file carries the same time as several parallel variables
//! (unix time, day of year, year, month, ...) plus the coverage attributes
//! and a date stamp in the file name. [`get_times`] derives all of them
//! from one sequence of timestamps.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// Parallel time fields derived from a sequence of timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeFields {
    /// Seconds since 1970-01-01T00:00:00Z, including fractional seconds.
    pub unix_times: Vec<f64>,
    /// Ordinal day of the year (1 = January 1st).
    pub day_of_year: Vec<u32>,
    /// Ordinal day plus the time of day as a fraction of a day.
    pub fractional_day_of_year: Vec<f64>,
    pub years: Vec<i32>,
    pub months: Vec<u32>,
    pub days: Vec<u32>,
    pub hours: Vec<u32>,
    pub minutes: Vec<u32>,
    /// Seconds including the fractional part.
    pub seconds: Vec<f64>,
    /// Earliest unix time (`time_coverage_start`).
    pub coverage_start_unix: f64,
    /// Latest unix time (`time_coverage_end`).
    pub coverage_end_unix: f64,
    /// Date stamp for the file name.
    pub file_date: String,
}

impl TimeFields {
    /// Number of timestamps.
    pub fn len(&self) -> usize {
        self.unix_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unix_times.is_empty()
    }

    /// Coverage start formatted as an ISO 8601 string.
    pub fn coverage_start_iso(&self) -> String {
        format_unix(self.coverage_start_unix)
    }

    /// Coverage end formatted as an ISO 8601 string.
    pub fn coverage_end_iso(&self) -> String {
        format_unix(self.coverage_end_unix)
    }
}

/// Derive every AMOF time field from `times`.
///
/// The file date is as precise as the timestamps allow: it starts at the
/// year and adds month, day, `-hour`, minute and second for as long as all
/// timestamps agree on that component. Timestamps covering more than one
/// calendar year are rejected.
pub fn get_times(times: &[DateTime<Utc>]) -> CommonResult<TimeFields> {
    let first = times.first().ok_or(CommonError::EmptyTimes)?;

    if let Some(other) = times.iter().find(|t| t.year() != first.year()) {
        return Err(CommonError::YearSpan {
            first: first.year(),
            last: other.year(),
        });
    }

    let unix_times: Vec<f64> = times.iter().map(unix_seconds).collect();
    let seconds: Vec<f64> = times
        .iter()
        .map(|t| t.second() as f64 + t.timestamp_subsec_micros() as f64 / 1_000_000.0)
        .collect();
    let fractional_day_of_year = times
        .iter()
        .zip(&seconds)
        .map(|(t, s)| {
            t.ordinal() as f64
                + t.hour() as f64 / 24.0
                + t.minute() as f64 / (24.0 * 60.0)
                + s / (24.0 * 60.0 * 60.0)
        })
        .collect();

    let coverage_start_unix = unix_times.iter().copied().fold(f64::INFINITY, f64::min);
    let coverage_end_unix = unix_times
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(TimeFields {
        day_of_year: times.iter().map(|t| t.ordinal()).collect(),
        fractional_day_of_year,
        years: times.iter().map(|t| t.year()).collect(),
        months: times.iter().map(|t| t.month()).collect(),
        days: times.iter().map(|t| t.day()).collect(),
        hours: times.iter().map(|t| t.hour()).collect(),
        minutes: times.iter().map(|t| t.minute()).collect(),
        seconds,
        unix_times,
        coverage_start_unix,
        coverage_end_unix,
        file_date: file_date(times),
    })
}

fn unix_seconds(t: &DateTime<Utc>) -> f64 {
    t.timestamp() as f64 + t.timestamp_subsec_micros() as f64 / 1_000_000.0
}

fn format_unix(unix: f64) -> String {
    let secs = unix.floor() as i64;
    let nanos = ((unix - secs as f64) * 1e9).round() as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos.min(999_999_999))
        .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Date stamp at the finest precision shared by every timestamp.
fn file_date(times: &[DateTime<Utc>]) -> String {
    let first = &times[0];
    let same = |f: fn(&DateTime<Utc>) -> u32| times.iter().all(|t| f(t) == f(first));

    let mut date = format!("{:04}", first.year());
    if !same(|t| t.month()) {
        return date;
    }
    date.push_str(&format!("{:02}", first.month()));
    if !same(|t| t.day()) {
        return date;
    }
    date.push_str(&format!("{:02}", first.day()));
    if !same(|t| t.hour()) {
        return date;
    }
    date.push_str(&format!("-{:02}", first.hour()));
    if !same(|t| t.minute()) {
        return date;
    }
    date.push_str(&format!("{:02}", first.minute()));
    if !same(|t| t.second()) {
        return date;
    }
    date.push_str(&format!("{:02}", first.second()));
    date
}
