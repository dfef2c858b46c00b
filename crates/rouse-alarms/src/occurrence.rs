//! Pure trigger-instant computation.
//!
//! Both functions are deterministic in the injected `now` — they never
//! read the system clock, which keeps every caller unit-testable.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use rouse_core::{ClockTime, Weekday};

/// Earliest instant strictly after `now` with the given time-of-day.
///
/// An alarm set for exactly "now" rolls to tomorrow — it must never fire
/// in the past. `None` only when chrono cannot form the candidate date,
/// which cannot happen for a validated [`ClockTime`].
pub fn next_one_shot(now: DateTime<Utc>, time: ClockTime) -> Option<DateTime<Utc>> {
    let candidate = at_time(now.date_naive(), time)?;
    if candidate > now {
        Some(candidate)
    } else {
        Some(candidate + Duration::days(1))
    }
}

/// Earliest instant strictly after `now` on `day` at the given time-of-day.
pub fn next_weekly(now: DateTime<Utc>, time: ClockTime, day: Weekday) -> Option<DateTime<Utc>> {
    let today = Weekday::from_chrono(now.weekday());
    let days_until = (i64::from(day.index()) - i64::from(today.index())).rem_euclid(7);
    let candidate = at_time(now.date_naive() + Duration::days(days_until), time)?;
    if candidate > now {
        Some(candidate)
    } else {
        // Same weekday but the time already passed — push a full week.
        Some(candidate + Duration::days(7))
    }
}

fn at_time(date: chrono::NaiveDate, time: ClockTime) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(u32::from(time.hour()), u32::from(time.minute()), 0)?;
    Some(Utc.from_utc_datetime(&naive))
}
