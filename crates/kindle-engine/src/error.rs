//! Error types for engine operations

use kindle_domain::traits::StoreFailure;
use kindle_domain::DomainError;
use thiserror::Error;

/// Errors that can occur during engine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Referenced user, habit or group does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A freeze spend costs more than the user holds
    #[error("Insufficient streak freezes: {available} available, {needed} needed")]
    InsufficientCurrency {
        /// Freezes the user holds
        available: u32,
        /// Freezes the recovery costs
        needed: u32,
    },

    /// There is no gap that a freeze could bridge
    #[error("No streak recovery available")]
    NoRecoveryAvailable,

    /// A versioned write lost to a concurrent writer and nothing was
    /// written; the operation may be retried
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

/// Map a backend error into [`EngineError::Conflict`] or [`EngineError::Store`]
pub(crate) fn store_err<E: StoreFailure>(err: E) -> EngineError {
    if err.is_conflict() {
        EngineError::Conflict(err.to_string())
    } else {
        EngineError::Store(err.to_string())
    }
}
