//! Per-entry occurrence duration.

use chrono::{NaiveTime, TimeDelta, Timelike};

pub const MINUTES_PER_DAY: i64 = 1440;

/// Minutes since midnight, ignoring seconds.
#[must_use]
pub fn minutes_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// ## Summary
/// Duration of each occurrence of a recurring entry.
///
/// Only the clock times matter: the date carried by `end_at` is ignored. A
/// difference of zero or less wraps past midnight, so equal start and end
/// times yield a full day. Without an end time the duration is zero.
#[must_use]
pub fn recurring_duration(start: NaiveTime, end: Option<NaiveTime>) -> TimeDelta {
    let Some(end) = end else {
        return TimeDelta::zero();
    };

    let mut minutes = minutes_of_day(end) - minutes_of_day(start);
    if minutes <= 0 {
        minutes += MINUTES_PER_DAY;
    }
    TimeDelta::minutes(minutes)
}
