//! Listing-level batch helpers around the expander.
//!
//! Mirrors the shape of the upstream listing payload closely enough to feed
//! `dates` arrays straight from the API response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entry::{DateEntry, Occurrence};
use crate::expander::OccurrenceExpander;
use crate::timestamp::storage_format;
use crate::timezone::TimeZoneResolver;

/// Upstream listing, reduced to the fields expansion needs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListingPayload {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default, deserialize_with = "entries_or_empty")]
    pub dates: Vec<DateEntry>,
}

/// A single listing or an array of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListingBatch {
    Many(Vec<ListingPayload>),
    One(ListingPayload),
}

impl ListingBatch {
    #[must_use]
    pub fn into_listings(self) -> Vec<ListingPayload> {
        match self {
            Self::Many(listings) => listings,
            Self::One(listing) => vec![listing],
        }
    }
}

/// Derived fields written back onto a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingOccurrences {
    pub id: serde_json::Value,
    pub occurrences: Vec<Occurrence>,
    #[serde(with = "storage_format::option")]
    pub next_occurrence: Option<DateTime<Utc>>,
}

/// ## Summary
/// Expands each listing in turn with one shared timezone cache.
#[tracing::instrument(skip_all, fields(listings = listings.len()))]
pub fn expand_listings(
    expander: &OccurrenceExpander,
    listings: &[ListingPayload],
    now: DateTime<Utc>,
    resolver: &mut TimeZoneResolver,
) -> Vec<ListingOccurrences> {
    listings
        .iter()
        .map(|listing| {
            let expansion = expander.expand_at(&listing.dates, now, resolver);
            tracing::debug!(
                id = %listing.id,
                dates = listing.dates.len(),
                occurrences = expansion.occurrences.len(),
                "Expanded listing"
            );
            ListingOccurrences {
                id: listing.id.clone(),
                occurrences: expansion.occurrences,
                next_occurrence: expansion.next,
            }
        })
        .collect()
}

/// `null` reads as no dates; elements that are not date objects are skipped.
fn entries_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<DateEntry>, D::Error> {
    let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();

    Ok(values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match DateEntry::deserialize(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(index, error = %err, "Skipping malformed date entry");
                None
            }
        })
        .collect())
}
