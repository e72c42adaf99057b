//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Engine error
    #[error(transparent)]
    Engine(#[from] kindle_engine::EngineError),

    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] kindle_store::StoreError),

    /// Malformed id, date or tag
    #[error("Invalid input: {0}")]
    Domain(#[from] kindle_domain::DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No user selected
    #[error("No active user. Pass --user or run 'kindle user use <name>'.")]
    NoActiveUser,
}
