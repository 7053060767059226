//! Wall-clock timestamp parsing and the fixed-width storage format.
//!
//! Upstream payloads carry naive `YYYY-MM-DD HH:MM:SS` strings; stored
//! occurrences use the same layout in UTC, which keeps lexicographic and
//! chronological order identical.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{ExpandError, ExpandResult};

/// Storage format for occurrence timestamps.
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted input layouts, most common first.
const INPUT_FORMATS: [&str; 4] = [
    STORAGE_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// ## Summary
/// Parses a source-naive wall-clock timestamp.
///
/// ## Errors
/// Returns `ExpandError::Timestamp` if the value matches none of the accepted
/// layouts.
pub fn parse_wall_clock(field: &'static str, value: &str) -> ExpandResult<NaiveDateTime> {
    let trimmed = value.trim();
    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ExpandError::Timestamp {
            field,
            value: value.to_string(),
        })
}

/// ## Summary
/// Parses an optional field, treating `None` and blank text as missing.
///
/// ## Errors
/// Returns `ExpandError::MissingTimestamp` for absent values and
/// `ExpandError::Timestamp` for unparseable ones.
pub fn parse_optional(field: &'static str, value: Option<&str>) -> ExpandResult<NaiveDateTime> {
    match value.map(str::trim) {
        None | Some("") => Err(ExpandError::MissingTimestamp(field)),
        Some(text) => parse_wall_clock(field, text),
    }
}

/// ## Summary
/// Formats a UTC instant in the storage layout.
#[must_use]
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format(STORAGE_FORMAT).to_string()
}

/// Serde adapter for `DateTime<Utc>` in the storage layout.
pub mod storage_format {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    use super::STORAGE_FORMAT;

    /// ## Errors
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&dt.format(STORAGE_FORMAT))
    }

    /// ## Errors
    /// Fails when the string is not in the storage layout.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, STORAGE_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(D::Error::custom)
    }

    /// Same layout for `Option<DateTime<Utc>>`; `None` is `null`.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        /// ## Errors
        /// Propagates serializer errors.
        #[expect(
            clippy::ref_option,
            reason = "serde `with` adapters receive a reference to the field"
        )]
        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// ## Errors
        /// Fails when a present value is not in the storage layout.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapped(#[serde(with = "super")] DateTime<Utc>);

            let wrapped = Option::<Wrapped>::deserialize(deserializer)?;
            Ok(wrapped.map(|Wrapped(dt)| dt))
        }
    }
}
