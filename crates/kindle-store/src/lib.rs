//! Kindle Storage Layer
//!
//! Implements the domain store traits on SQLite.
//!
//! # Architecture
//!
//! - One row per user, habit and group; habit ledgers are JSON columns
//! - One JSON document per user for streak state, replaced as a unit and
//!   guarded by a version column (optimistic concurrency)
//! - A single connection behind a mutex, so the store can be shared
//!   between threads
//!
//! # Examples
//!
//! ```no_run
//! use kindle_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for habit and streak operations
//! ```

#![warn(missing_docs)]

mod groups;
mod habits;
mod streaks;
mod users;

use chrono::{DateTime, Utc};
use kindle_domain::traits::{Repository, StoreFailure};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Versioned document changed since it was read
    #[error("Write conflict: expected version {expected:?}, found {found:?}")]
    Conflict {
        /// Version the writer read
        expected: Option<u64>,
        /// Version currently stored
        found: Option<u64>,
    },
}

/// How long a statement waits for another connection's write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based implementation of the Kindle store traits
///
/// # Thread Safety
///
/// The connection sits behind a mutex; every trait method holds it for the
/// duration of one statement or transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kindle_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("kindle.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        // Other kindle processes may hold the write lock briefly
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn().execute_batch(schema)?;
        tracing::debug!("Store schema initialized");
        Ok(())
    }

    /// Lock the connection
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Repository for SqliteStore {
    type Error = StoreError;
}

impl StoreFailure for StoreError {
    fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Convert a raw id to bytes for storage
pub(crate) fn id_to_bytes(value: u128) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Convert stored bytes back to a raw id
pub(crate) fn bytes_to_id(bytes: &[u8]) -> Result<u128, StoreError> {
    let arr: [u8; 16] = bytes.try_into().map_err(|_| {
        StoreError::InvalidData(format!("Expected 16 bytes for an id, got {}", bytes.len()))
    })?;
    Ok(u128::from_be_bytes(arr))
}

pub(crate) fn time_to_text(t: &DateTime<Utc>) -> String {
    t.to_rfc3339()
}

pub(crate) fn text_to_time(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(format!("Bad timestamp '{}': {}", s, e)))
}
