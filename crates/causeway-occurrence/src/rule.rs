//! Recurrence rule text as delivered by the upstream API.
//!
//! The text is an RRULE body, optionally preceded by a `DTSTART` line whose
//! timezone convention varies (`TZID`, trailing `Z`, or floating). This module
//! pulls the `DTSTART` apart from the rest so the expander can decide which
//! zone the rule runs in, then re-emits a rule set the `rrule` crate accepts.

use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;

use crate::error::{ExpandError, ExpandResult};
use crate::timezone::convert_to_utc_lenient;

const DTSTART: &str = "DTSTART";

/// Property names passed through to the rule engine.
const PASSTHROUGH_PROPERTIES: [&str; 4] = ["RRULE", "EXRULE", "RDATE", "EXDATE"];

/// Properties whose `UNTIL` part is re-anchored to the emitted `DTSTART`.
const UNTIL_PROPERTIES: [&str; 2] = ["RRULE", "EXRULE"];

const UTC_STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Timezone convention of an embedded `DTSTART`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DtStartForm {
    /// `DTSTART;TZID=<name>:...`
    Zoned(String),
    /// `DTSTART:...Z`
    Utc,
    /// Neither `TZID` nor `Z`.
    Floating,
}

/// The `DTSTART` clock value together with its timezone convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtStart {
    pub local: NaiveDateTime,
    pub form: DtStartForm,
}

/// Which zone an entry's rule is evaluated in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZonePolicy {
    /// The rule names its own zone.
    RuleTzid(String),
    /// `Z` marker honoured as a real UTC instant.
    Utc,
    /// `Z` marker reinterpreted as wall-clock time in the fallback zone.
    UtcMarkerAsLocal,
    /// No zone information in the rule.
    Fallback,
}

/// Parsed recurrence rule text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleText {
    dtstart: Option<DtStart>,
    lines: Vec<String>,
}

impl RuleText {
    /// ## Summary
    /// Splits rule text into its `DTSTART` and the remaining rule lines.
    ///
    /// Bare bodies such as `FREQ=WEEKLY;BYDAY=TU` become `RRULE:` lines.
    ///
    /// ## Errors
    /// Returns `ExpandError::Rule` when the `DTSTART` is malformed or
    /// repeated, or when no rule lines remain.
    pub fn parse(text: &str) -> ExpandResult<Self> {
        let mut dtstart = None;
        let mut lines = Vec::new();

        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            match property_name(line) {
                Some(name) if name.eq_ignore_ascii_case(DTSTART) => {
                    if dtstart.is_some() {
                        return Err(ExpandError::Rule("multiple DTSTART lines".to_string()));
                    }
                    dtstart = Some(parse_dtstart(line)?);
                }
                Some(name)
                    if PASSTHROUGH_PROPERTIES
                        .iter()
                        .any(|known| name.eq_ignore_ascii_case(known)) =>
                {
                    lines.push(line.to_string());
                }
                Some(name) => {
                    return Err(ExpandError::Rule(format!("unsupported property {name}")));
                }
                None => lines.push(format!("RRULE:{line}")),
            }
        }

        if lines.is_empty() {
            return Err(ExpandError::Rule("no recurrence rule".to_string()));
        }

        tracing::trace!(dtstart = ?dtstart, lines = lines.len(), "Parsed rule text");
        Ok(Self { dtstart, lines })
    }

    #[must_use]
    pub fn dtstart(&self) -> Option<&DtStart> {
        self.dtstart.as_ref()
    }

    /// ## Summary
    /// Decides the zone the rule runs in.
    ///
    /// A `TZID` wins; a `Z` marker means UTC unless `treat_z_as_local` is set;
    /// anything else uses the fallback zone.
    #[must_use]
    pub fn zone_policy(&self, treat_z_as_local: bool) -> ZonePolicy {
        match self.dtstart.as_ref().map(|dtstart| &dtstart.form) {
            Some(DtStartForm::Zoned(tzid)) => ZonePolicy::RuleTzid(tzid.clone()),
            Some(DtStartForm::Utc) if treat_z_as_local => ZonePolicy::UtcMarkerAsLocal,
            Some(DtStartForm::Utc) => ZonePolicy::Utc,
            Some(DtStartForm::Floating) | None => ZonePolicy::Fallback,
        }
    }

    /// ## Summary
    /// Renders a rule set anchored at `seed` wall-clock time in `tz`.
    ///
    /// Any `DTSTART` from the original text is replaced by the seed. The
    /// emitted `DTSTART` is never floating, so a floating `UNTIL` is read as
    /// wall-clock time in `tz` and rewritten in UTC. Under
    /// [`ZonePolicy::UtcMarkerAsLocal`] a `Z` suffixed `UNTIL` is read the
    /// same way as the `DTSTART`.
    #[must_use]
    pub fn to_rule_set_text(&self, seed: NaiveDateTime, tz: Tz, policy: &ZonePolicy) -> String {
        let utc_until_is_local = matches!(policy, ZonePolicy::UtcMarkerAsLocal);

        let mut out = dtstart_line(seed, tz);
        for line in &self.lines {
            out.push('\n');
            out.push_str(&anchor_until(line, tz, utc_until_is_local));
        }
        out
    }
}

/// `DTSTART` line for the rule engine. UTC keeps the `Z` form.
fn dtstart_line(seed: NaiveDateTime, tz: Tz) -> String {
    let stamp = seed.format("%Y%m%dT%H%M%S");
    if tz == Tz::UTC {
        format!("{DTSTART}:{stamp}Z")
    } else {
        format!("{DTSTART};TZID={}:{stamp}", tz.name())
    }
}

/// Rewrites the `UNTIL` part of an `RRULE`/`EXRULE` line as a UTC instant
/// when it is wall-clock time in `tz`. Other lines are returned unchanged.
fn anchor_until(line: &str, tz: Tz, utc_until_is_local: bool) -> String {
    let is_rule_line = property_name(line)
        .is_some_and(|name| UNTIL_PROPERTIES.iter().any(|known| name.eq_ignore_ascii_case(known)));
    let Some((head, body)) = line.split_once(':').filter(|_| is_rule_line) else {
        return line.to_string();
    };

    let parts: Vec<String> = body
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.trim().eq_ignore_ascii_case("UNTIL") => {
                match local_until(value.trim(), utc_until_is_local) {
                    Some(local) => {
                        let until = convert_to_utc_lenient(local, tz);
                        format!("{key}={}", until.format(UTC_STAMP_FORMAT))
                    }
                    None => part.to_string(),
                }
            }
            _ => part.to_string(),
        })
        .collect();

    format!("{head}:{}", parts.join(";"))
}

/// Wall-clock value of an `UNTIL`, or `None` when it is already a UTC instant
/// or unparseable. A date-only `UNTIL` covers the whole day.
fn local_until(value: &str, utc_until_is_local: bool) -> Option<NaiveDateTime> {
    let stamp = match value.strip_suffix(['Z', 'z']) {
        Some(stamp) if utc_until_is_local => stamp,
        Some(_) => return None,
        None => value,
    };

    if stamp.len() == 8 {
        NaiveDate::parse_from_str(stamp, "%Y%m%d")
            .ok()
            .and_then(|date| date.and_hms_opt(23, 59, 59))
    } else {
        NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%S").ok()
    }
}

/// Returns the property name of a content line, or `None` for a bare rule
/// body (`FREQ=...`).
fn property_name(line: &str) -> Option<&str> {
    let idx = line.find([':', ';', '='])?;
    if line[idx..].starts_with('=') {
        None
    } else {
        Some(&line[..idx])
    }
}

fn parse_dtstart(line: &str) -> ExpandResult<DtStart> {
    let malformed = || ExpandError::Rule(format!("malformed DTSTART: {line}"));

    let (head, value) = line.split_once(':').ok_or_else(malformed)?;
    let value = value.trim();

    let mut tzid = None;
    let mut date_only = false;
    for param in head.split(';').skip(1) {
        let Some((key, param_value)) = param.split_once('=') else {
            return Err(malformed());
        };
        let param_value = param_value.trim().trim_matches('"');
        if key.eq_ignore_ascii_case("TZID") {
            tzid = Some(param_value.to_string());
        } else if key.eq_ignore_ascii_case("VALUE") {
            date_only = param_value.eq_ignore_ascii_case("DATE");
        }
    }

    let (stamp, utc_marker) = match value.strip_suffix(['Z', 'z']) {
        Some(stamp) => (stamp, true),
        None => (value, false),
    };

    let local = if date_only || stamp.len() == 8 {
        NaiveDate::parse_from_str(stamp, "%Y%m%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    } else {
        NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%S").ok()
    }
    .ok_or_else(malformed)?;

    let form = match (tzid, utc_marker) {
        (Some(tzid), _) => DtStartForm::Zoned(tzid),
        (None, true) => DtStartForm::Utc,
        (None, false) => DtStartForm::Floating,
    };

    Ok(DtStart { local, form })
}
