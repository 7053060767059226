//! Occurrence expansion for listing date entries.
//!
//! Each entry is either a one-off event or a recurrence rule. Rules are
//! evaluated by the `rrule` crate in the entry's source timezone and clipped
//! to a one-year UTC window; everything is then merged, sorted and searched
//! for the next upcoming start.

use causeway_core::config::ExpanderSettings;
use chrono::{DateTime, Datelike, NaiveDateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::duration::recurring_duration;
use crate::entry::{DateEntry, Expansion, Occurrence};
use crate::error::{ExpandError, ExpandResult};
use crate::rule::{RuleText, ZonePolicy};
use crate::sample::{next_after, sample_occurrences};
use crate::timestamp;
use crate::timezone::{TimeZoneResolver, convert_to_utc_lenient};
use crate::window::ExpansionWindow;

/// ## Summary
/// Upper bound on occurrences produced by one rule; also the largest batch the
/// rule engine hands out. Minutely rules hit it within a couple of months.
pub const MAX_OCCURRENCES_PER_ENTRY: u16 = u16::MAX;

/// ## Summary
/// Expands date entries into concrete UTC occurrences.
///
/// Holds only configuration. The current instant, the window and the timezone
/// cache are supplied per call, so identical inputs always give identical
/// output.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceExpander {
    settings: ExpanderSettings,
}

impl OccurrenceExpander {
    #[must_use]
    pub fn new(settings: ExpanderSettings) -> Self {
        Self { settings }
    }

    /// ## Summary
    /// Window for the configured year, or the year of `now` when unset.
    #[must_use]
    pub fn window_for(&self, now: DateTime<Utc>) -> Option<ExpansionWindow> {
        ExpansionWindow::for_year(self.settings.window_year.unwrap_or_else(|| now.year()))
    }

    /// ## Summary
    /// Expands `entries` for the window derived from `now` (see
    /// [`Self::window_for`]).
    pub fn expand_at(
        &self,
        entries: &[DateEntry],
        now: DateTime<Utc>,
        resolver: &mut TimeZoneResolver,
    ) -> Expansion {
        match self.window_for(now) {
            Some(window) => self.expand(entries, window, now, resolver),
            None => {
                tracing::error!(
                    window_year = ?self.settings.window_year,
                    "Window year out of range; no occurrences produced"
                );
                Expansion::default()
            }
        }
    }

    /// ## Summary
    /// Expands every entry, merges the results in start order and picks the
    /// first occurrence starting at or after `now`.
    ///
    /// Entries that cannot be parsed or expanded are logged and skipped; the
    /// rest of the batch is unaffected.
    #[tracing::instrument(skip_all, fields(entries = entries.len(), year = window.year()))]
    pub fn expand(
        &self,
        entries: &[DateEntry],
        window: ExpansionWindow,
        now: DateTime<Utc>,
        resolver: &mut TimeZoneResolver,
    ) -> Expansion {
        let fallback = resolver.resolve_or_utc(&self.settings.default_timezone);

        let mut occurrences = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            match self.expand_entry(entry, window, fallback, resolver) {
                Ok(mut produced) => {
                    if self.settings.verbose {
                        sample_occurrences(&produced, window.year()).log(entry.rule_text());
                    }
                    occurrences.append(&mut produced);
                }
                Err(err @ (ExpandError::MissingTimestamp(_) | ExpandError::Timestamp { .. })) => {
                    tracing::warn!(index, error = %err, "Dropping date entry");
                }
                Err(err) => {
                    tracing::warn!(
                        index,
                        rule = entry.rule_text().unwrap_or(""),
                        error = %err,
                        "Recurrence expansion failed; entry contributes no occurrences"
                    );
                }
            }
        }

        occurrences.sort_by_key(|occ| occ.start);
        let next = next_after(&occurrences, now).map(|occ| occ.start);

        tracing::debug!(
            occurrences = occurrences.len(),
            next = ?next.as_ref().map(timestamp::format_utc),
            "Expanded date entries"
        );

        Expansion { occurrences, next }
    }

    /// ## Summary
    /// Expands one entry.
    ///
    /// ## Errors
    /// Returns an error if `start_at` is missing or unparseable, or if the
    /// recurrence rule cannot be parsed or evaluated.
    pub fn expand_entry(
        &self,
        entry: &DateEntry,
        window: ExpansionWindow,
        fallback: Tz,
        resolver: &mut TimeZoneResolver,
    ) -> ExpandResult<Vec<Occurrence>> {
        let start_at = timestamp::parse_optional("start_at", entry.start_at.as_deref())?;
        let end_at = match timestamp::parse_optional("end_at", entry.end_at.as_deref()) {
            Ok(end_at) => Some(end_at),
            Err(err) => {
                tracing::debug!(error = %err, "No usable end time; using zero duration");
                None
            }
        };

        match entry.rule_text() {
            Some(text) => self.expand_recurring(text, start_at, end_at, window, fallback, resolver),
            None => Ok(expand_single(start_at, end_at, window, fallback)
                .into_iter()
                .collect()),
        }
    }

    fn expand_recurring(
        &self,
        text: &str,
        start_at: NaiveDateTime,
        end_at: Option<NaiveDateTime>,
        window: ExpansionWindow,
        fallback: Tz,
        resolver: &mut TimeZoneResolver,
    ) -> ExpandResult<Vec<Occurrence>> {
        let rule = RuleText::parse(text)?;
        let policy = rule.zone_policy(self.settings.treat_z_as_local);
        let tz = match &policy {
            ZonePolicy::RuleTzid(tzid) => resolver.resolve_or_utc(tzid),
            ZonePolicy::Utc => Tz::UTC,
            ZonePolicy::UtcMarkerAsLocal | ZonePolicy::Fallback => fallback,
        };

        // With Z-as-local the DTSTART clock value is kept and only its zone
        // changes, so the rule repeats at the same local hour across DST.
        let seed = rule.dtstart().map_or(start_at, |dtstart| dtstart.local);
        let duration = recurring_duration(start_at.time(), end_at.map(|end| end.time()));

        let rule_set_text = rule.to_rule_set_text(seed, tz, &policy);
        tracing::trace!(
            policy = ?policy,
            tz = tz.name(),
            duration_minutes = duration.num_minutes(),
            rule_set = %rule_set_text,
            "Evaluating recurrence rule"
        );

        let rule_set: RRuleSet = rule_set_text.parse()?;
        let (after, before) = window.rule_engine_bounds();
        let result = rule_set.after(after).before(before).all(MAX_OCCURRENCES_PER_ENTRY);

        if result.limited {
            tracing::warn!(
                rule = %text,
                limit = MAX_OCCURRENCES_PER_ENTRY,
                "Recurrence rule truncated at occurrence limit"
            );
        }

        Ok(result
            .dates
            .iter()
            .filter_map(|occ| occurrence_from_rule(occ, duration, tz, window))
            .collect())
    }
}

/// End is wall-clock start plus duration in the source zone, so a two-hour
/// event stays two local hours even when it spans a DST change.
fn occurrence_from_rule(
    occ: &DateTime<rrule::Tz>,
    duration: TimeDelta,
    tz: Tz,
    window: ExpansionWindow,
) -> Option<Occurrence> {
    let start = occ.with_timezone(&Utc);
    if !window.contains(start) {
        return None;
    }
    let end = convert_to_utc_lenient(occ.naive_local() + duration, tz);
    Some(Occurrence::new(start, end))
}

fn expand_single(
    start_at: NaiveDateTime,
    end_at: Option<NaiveDateTime>,
    window: ExpansionWindow,
    tz: Tz,
) -> Option<Occurrence> {
    let start = convert_to_utc_lenient(start_at, tz);
    if !window.contains(start) {
        tracing::trace!(start = %timestamp::format_utc(&start), "One-off entry outside window");
        return None;
    }
    let end = end_at.map_or(start, |end_at| convert_to_utc_lenient(end_at, tz));
    Some(Occurrence::new(start, end))
}
