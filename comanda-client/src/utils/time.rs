//! Date-range helpers for the reporting screens
//!
//! All boundaries are computed in UTC; rows carry RFC 3339 timestamps.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

/// Midnight at the start of the given instant's day
pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Midnight of the Monday of the given instant's ISO week
pub fn week_start_monday(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_from_monday = now.weekday().num_days_from_monday() as i64;
    day_start(now - Duration::days(days_from_monday))
}

/// Whole minutes between two instants, rounded to nearest
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - start).num_seconds();
    (seconds as f64 / 60.0).round() as i64
}
