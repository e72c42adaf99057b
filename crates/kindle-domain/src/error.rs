//! Domain error types

use thiserror::Error;

/// Errors raised while constructing or parsing domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A civil date string was not `YYYY-MM-DD` or named no real day
    #[error("Invalid civil date: {0}")]
    InvalidDate(String),

    /// An identifier string was not a UUID
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// A tag (habit kind, visibility, streak class) was not recognised
    #[error("Unknown {kind}: {value}")]
    UnknownTag {
        /// What was being parsed
        kind: &'static str,
        /// The rejected input
        value: String,
    },

    /// A habit field was out of range
    #[error("Invalid habit: {0}")]
    InvalidHabit(String),

    /// A UTC offset outside +/-14 hours
    #[error("Invalid UTC offset: {0} minutes")]
    InvalidOffset(i32),

    /// A day was found in more than one of the full/ember sets
    #[error("Day {0} is recorded as both full and ember")]
    OverlappingDay(String),
}
