//! Diagnostic sampling of an entry's occurrences.

use chrono::{DateTime, NaiveDate, Utc};

use crate::entry::Occurrence;
use crate::timestamp::format_utc;

const EDGE_COUNT: usize = 2;

/// ## Summary
/// A small slice of an expansion worth logging: the first two occurrences,
/// the first one on or after November 1 of the window year, and the last two.
///
/// November sits after the northern-hemisphere DST change, so the sample shows
/// both offsets for most fallback zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceSample<'a> {
    pub total: usize,
    pub first: &'a [Occurrence],
    pub from_november: Option<&'a Occurrence>,
    pub last: &'a [Occurrence],
}

/// Samples `occurrences`, which must already be sorted by start.
#[must_use]
pub fn sample_occurrences(occurrences: &[Occurrence], year: i32) -> OccurrenceSample<'_> {
    let november = NaiveDate::from_ymd_opt(year, 11, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc());

    OccurrenceSample {
        total: occurrences.len(),
        first: &occurrences[..occurrences.len().min(EDGE_COUNT)],
        from_november: november
            .and_then(|cutoff| occurrences.iter().find(|occ| occ.start >= cutoff)),
        last: &occurrences[occurrences.len().saturating_sub(EDGE_COUNT)..],
    }
}

impl OccurrenceSample<'_> {
    /// Logs the sample at debug level.
    pub fn log(&self, rule: Option<&str>) {
        tracing::debug!(
            rule = rule.unwrap_or(""),
            total = self.total,
            first = ?starts(self.first),
            from_november = ?self.from_november.map(|occ| format_utc(&occ.start)),
            last = ?starts(self.last),
            "Occurrence sample"
        );
    }
}

fn starts(occurrences: &[Occurrence]) -> Vec<String> {
    occurrences.iter().map(|occ| format_utc(&occ.start)).collect()
}

/// First occurrence starting at or after `now`, at second resolution.
#[must_use]
pub fn next_after(occurrences: &[Occurrence], now: DateTime<Utc>) -> Option<&Occurrence> {
    let now = chrono::SubsecRound::trunc_subsecs(now, 0);
    occurrences.iter().find(|occ| occ.start >= now)
}
