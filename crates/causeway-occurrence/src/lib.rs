//! Occurrence expansion for Causeway listing dates.
//!
//! Turns the `dates` array of an upstream listing (one-off times and
//! recurrence rules with mixed timezone conventions) into a sorted list of UTC
//! occurrences inside one calendar year, plus the next upcoming one.

pub mod duration;
pub mod entry;
pub mod error;
pub mod expander;
pub mod listing;
pub mod rule;
pub mod sample;
pub mod timestamp;
pub mod timezone;
pub mod window;

pub use entry::{DateEntry, Expansion, Occurrence};
pub use expander::OccurrenceExpander;
pub use listing::{ListingBatch, ListingOccurrences, ListingPayload, expand_listings};
pub use timezone::TimeZoneResolver;
pub use window::ExpansionWindow;

// Lets the shared case table name this crate the same way integration tests do.
#[cfg(test)]
extern crate self as causeway_occurrence;
