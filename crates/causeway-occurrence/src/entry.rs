//! Input date entries and expanded occurrences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::timestamp::{self, storage_format};

/// ## Summary
/// One element of a listing's upstream `dates` array.
///
/// Fields are kept as raw text. Values that are not strings read as absent,
/// so a bad value only drops this entry and never fails deserialization of
/// the whole listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateEntry {
    #[serde(default, deserialize_with = "text_or_none")]
    pub start_at: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub end_at: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub rrule: Option<String>,
}

impl DateEntry {
    #[must_use]
    pub fn new(start_at: &str, end_at: &str, rrule: &str) -> Self {
        Self {
            start_at: Some(start_at.to_string()),
            end_at: Some(end_at.to_string()),
            rrule: Some(rrule.to_string()),
        }
    }

    /// Recurrence rule text, `None` when absent or blank.
    #[must_use]
    pub fn rule_text(&self) -> Option<&str> {
        self.rrule
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

fn text_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(Some(text)),
        serde_json::Value::Null => Ok(None),
        other => {
            tracing::warn!(value = %other, "Ignoring non-string date entry field");
            Ok(None)
        }
    }
}

/// One concrete event instance in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    #[serde(rename = "occurrence_start", with = "storage_format")]
    pub start: DateTime<Utc>,
    #[serde(rename = "occurrence_end", with = "storage_format")]
    pub end: DateTime<Utc>,
}

impl Occurrence {
    /// Builds an occurrence, clamping `end` so it never precedes `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// `occurrence_start` in the storage layout.
    #[must_use]
    pub fn start_string(&self) -> String {
        timestamp::format_utc(&self.start)
    }

    /// `occurrence_end` in the storage layout.
    #[must_use]
    pub fn end_string(&self) -> String {
        timestamp::format_utc(&self.end)
    }
}

/// Result of expanding one listing's date entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expansion {
    pub occurrences: Vec<Occurrence>,
    #[serde(default, with = "storage_format::option")]
    pub next: Option<DateTime<Utc>>,
}

impl Expansion {
    /// `next` in the storage layout.
    #[must_use]
    pub fn next_string(&self) -> Option<String> {
        self.next.as_ref().map(timestamp::format_utc)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}
