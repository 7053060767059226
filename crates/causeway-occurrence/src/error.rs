use thiserror::Error;

/// Per-entry expansion errors.
///
/// None of these escape the batch call; they decide whether an entry is
/// dropped or contributes zero occurrences.
#[derive(Error, Debug)]
pub enum ExpandError {
    #[error("Missing timestamp: {0}")]
    MissingTimestamp(&'static str),

    #[error("Invalid timestamp {field}: {value}")]
    Timestamp { field: &'static str, value: String },

    #[error("Invalid recurrence rule: {0}")]
    Rule(String),

    #[error("Recurrence rule engine error: {0}")]
    RuleEngine(#[from] rrule::RRuleError),
}

pub type ExpandResult<T> = std::result::Result<T, ExpandError>;
