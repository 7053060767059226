//! Timezone resolution and local/UTC conversion for source wall-clock times.
//!
//! Uses ICU4X for Windows timezone ID to IANA mapping and alias
//! canonicalization.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;
use std::collections::HashMap;
use std::str::FromStr;

/// Error during timezone conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Unknown or invalid timezone identifier.
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// Non-existent time during DST gap.
    #[error("Non-existent time (DST gap): {0}")]
    NonExistentTime(String),
}

/// Resolver for timezone identifiers.
///
/// Keeps a cache of resolved names so a batch import resolves each distinct
/// `TZID` once. Owned by the caller and passed in explicitly.
#[derive(Debug, Default)]
pub struct TimeZoneResolver {
    cache: HashMap<String, Tz>,
}

impl TimeZoneResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Resolves a timezone identifier to a `chrono_tz::Tz`.
    ///
    /// Accepts IANA names and aliases, Windows zone names, `Z`/`UTC`/`GMT`
    /// and whole-hour numeric offsets.
    ///
    /// ## Errors
    ///
    /// Returns `ConversionError::UnknownTimezone` if the name cannot be resolved.
    ///
    /// ## Side Effects
    ///
    /// Caches successful resolutions to avoid repeated parsing.
    pub fn resolve(&mut self, tzid: &str) -> Result<Tz, ConversionError> {
        if let Some(tz) = self.cache.get(tzid) {
            return Ok(*tz);
        }

        let normalized = normalize_tzid(tzid);

        let tz = Tz::from_str(&normalized)
            .map_err(|_e| ConversionError::UnknownTimezone(tzid.to_string()))?;

        self.cache.insert(tzid.to_string(), tz);

        Ok(tz)
    }

    /// ## Summary
    /// Resolves a name, substituting UTC when it is unknown.
    ///
    /// Never fails: a bad zone must not abort an import.
    pub fn resolve_or_utc(&mut self, tzid: &str) -> Tz {
        match self.resolve(tzid) {
            Ok(tz) => tz,
            Err(err) => {
                tracing::warn!(tzid = %tzid, error = %err, "Unresolvable timezone, falling back to UTC");
                Tz::UTC
            }
        }
    }
}

/// Normalizes timezone identifiers to names `chrono-tz` understands.
fn normalize_tzid(tzid: &str) -> String {
    let trimmed = tzid.trim();

    let stripped = trimmed
        .strip_prefix("/mozilla.org/")
        .or_else(|| trimmed.strip_prefix("/softwarestudio.org/"))
        .unwrap_or(trimmed);

    if matches!(stripped, "Z" | "z" | "UTC" | "utc" | "GMT" | "gmt") {
        return "UTC".to_string();
    }

    if let Some(etc) = offset_to_etc_zone(stripped) {
        return etc;
    }

    let windows_parser = WindowsParser::new();
    if let Some(tz) = windows_parser.parse(stripped, None) {
        let iana_parser = IanaParserExtended::new();
        for entry in iana_parser.iter() {
            if entry.time_zone == tz {
                return entry.canonical.to_string();
            }
        }
    }

    // Handles aliases like Europe/Kiev -> Europe/Kyiv
    let iana_parser = IanaParserExtended::new();
    let parsed = iana_parser.parse(stripped);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    stripped.to_string()
}

/// Maps `+02:00`, `-0500`, `UTC+10` and friends to the `Etc/GMT` zone with the
/// same offset. The `Etc` zones only cover whole hours, and their sign is
/// inverted (`Etc/GMT-2` is UTC+2).
fn offset_to_etc_zone(value: &str) -> Option<String> {
    let body = value
        .strip_prefix("UTC")
        .or_else(|| value.strip_prefix("GMT"))
        .unwrap_or(value);

    let (sign, digits) = match body.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes != 0 || !(0..=14).contains(&hours) {
        return None;
    }

    let offset = sign * hours;
    Some(match offset {
        0 => "UTC".to_string(),
        // Etc/GMT sign convention is POSIX style, opposite to ISO 8601
        o if o > 0 => format!("Etc/GMT-{o}"),
        o => format!("Etc/GMT+{}", -o),
    })
}

/// ## Summary
/// Converts a local datetime to UTC in the given zone.
///
/// Ambiguous times (DST fold) resolve to the earlier instant.
///
/// ## Errors
///
/// Returns `ConversionError::NonExistentTime` for times inside a DST gap.
pub fn convert_to_utc(local_time: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, ConversionError> {
    match tz.from_local_datetime(&local_time) {
        LocalResult::None => Err(ConversionError::NonExistentTime(format!(
            "{local_time} in timezone {}",
            tz.name()
        ))),
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(dt1, _dt2) => Ok(dt1.with_timezone(&Utc)),
    }
}

/// ## Summary
/// Converts a local datetime to UTC, shifting non-existent times forward by
/// one hour instead of failing.
#[must_use]
pub fn convert_to_utc_lenient(local_time: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match convert_to_utc(local_time, tz) {
        Ok(dt) => dt,
        Err(err) => {
            tracing::debug!(error = %err, "Shifting local time across DST gap");
            let shifted = local_time + TimeDelta::hours(1);
            convert_to_utc(shifted, tz)
                // Gaps are never longer than an hour in tzdb; treat the wall
                // clock as UTC if one ever is.
                .unwrap_or_else(|_e| shifted.and_utc())
        }
    }
}
