//! The one-year UTC window occurrences are clipped to.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

/// ## Summary
/// `[<year>-01-01 00:00:00, <year>-12-31 23:59:59]` in UTC, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionWindow {
    year: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ExpansionWindow {
    /// Returns `None` when the year is outside chrono's supported range.
    #[must_use]
    pub fn for_year(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)?.and_hms_opt(23, 59, 59)?;
        Some(Self {
            year,
            start: start.and_utc(),
            end: end.and_utc(),
        })
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Bounds handed to the rule engine, widened by a second on each side so
    /// its range checks cannot drop the window edges.
    pub(crate) fn rule_engine_bounds(&self) -> (DateTime<rrule::Tz>, DateTime<rrule::Tz>) {
        let margin = TimeDelta::seconds(1);
        (
            (self.start - margin).with_timezone(&rrule::Tz::UTC),
            (self.end + margin).with_timezone(&rrule::Tz::UTC),
        )
    }
}
