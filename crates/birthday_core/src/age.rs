//! Coarse relative-age formatting.
//!
//! # Responsibility
//! - Turn a birth date into a short phrase such as `a year ago`.
//!
//! # Invariants
//! - Exactly one unit is used: the coarsest one whose threshold applies.
//! - Never fails; callers guarantee a birth date exists.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = 60.0 * MS_PER_SECOND;
const MS_PER_HOUR: f64 = 60.0 * MS_PER_MINUTE;
const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;
/// 400 Gregorian years hold 146097 days and 4800 months.
const MONTHS_PER_DAY: f64 = 4_800.0 / 146_097.0;

const SECONDS_THRESHOLD: f64 = 45.0;
const MINUTES_THRESHOLD: f64 = 45.0;
const HOURS_THRESHOLD: f64 = 22.0;
const DAYS_THRESHOLD: f64 = 26.0;
const MONTHS_THRESHOLD: f64 = 11.0;

/// Formats the age of someone born on `birth_date` as seen at `now`.
pub fn humanize_age(birth_date: NaiveDate, now: NaiveDateTime) -> String {
    humanize_delta(birth_date.and_time(NaiveTime::MIN) - now)
}

/// Formats a signed duration relative to now.
///
/// Negative values are in the past (`... ago`), others in the future
/// (`in ...`).
pub fn humanize_delta(delta: TimeDelta) -> String {
    let phrase = coarse_phrase(delta.num_milliseconds().unsigned_abs() as f64);
    if delta < TimeDelta::zero() {
        format!("{phrase} ago")
    } else {
        format!("in {phrase}")
    }
}

fn coarse_phrase(abs_ms: f64) -> String {
    let seconds = (abs_ms / MS_PER_SECOND).round();
    let minutes = (abs_ms / MS_PER_MINUTE).round();
    let hours = (abs_ms / MS_PER_HOUR).round();
    let exact_days = abs_ms / MS_PER_DAY;
    let days = exact_days.round();
    let exact_months = exact_days * MONTHS_PER_DAY;
    let months = exact_months.round();
    let years = (exact_months / 12.0).round();

    if seconds < SECONDS_THRESHOLD {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < MINUTES_THRESHOLD {
        format!("{minutes} minutes")
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < HOURS_THRESHOLD {
        format!("{hours} hours")
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < DAYS_THRESHOLD {
        format!("{days} days")
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < MONTHS_THRESHOLD {
        format!("{months} months")
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        format!("{years} years")
    }
}
