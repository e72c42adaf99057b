//! StreakStore implementation
//!
//! A user's streak state is one JSON document. Writes compare the stored
//! version with the one the caller read and fail with
//! [`StoreError::Conflict`] on mismatch, so no partial or stale state is
//! ever persisted.

use crate::{id_to_bytes, time_to_text, SqliteStore, StoreError};
use chrono::Utc;
use kindle_domain::traits::{StreakStore, Versioned};
use kindle_domain::{StreakState, UserId};
use rusqlite::{params, OptionalExtension, TransactionBehavior};

impl StreakStore for SqliteStore {
    fn load_streak(&self, user: UserId) -> Result<Option<Versioned<StreakState>>, Self::Error> {
        let row: Option<(i64, String)> = self
            .conn()
            .query_row(
                "SELECT version, document FROM streaks WHERE user_id = ?1",
                params![id_to_bytes(user.value())],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((version, document)) => Ok(Some(Versioned {
                version: to_version(version)?,
                value: serde_json::from_str(&document)?,
            })),
            None => Ok(None),
        }
    }

    fn save_streak(
        &self,
        user: UserId,
        state: &StreakState,
        expected_version: Option<u64>,
    ) -> Result<u64, Self::Error> {
        let document = serde_json::to_string(state)?;
        let now = time_to_text(&Utc::now());
        let key = id_to_bytes(user.value());

        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let found: Option<i64> = tx
            .query_row(
                "SELECT version FROM streaks WHERE user_id = ?1",
                params![&key],
                |row| row.get(0),
            )
            .optional()?;
        let found = found.map(to_version).transpose()?;

        if found != expected_version {
            tracing::debug!(user = %user, ?expected_version, ?found, "Streak write conflict");
            return Err(StoreError::Conflict {
                expected: expected_version,
                found,
            });
        }

        let next = expected_version.map_or(1, |v| v + 1);
        match expected_version {
            None => {
                tx.execute(
                    "INSERT INTO streaks (user_id, version, document, updated_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![&key, next as i64, document, now],
                )?;
            }
            Some(v) => {
                tx.execute(
                    "UPDATE streaks SET version = ?2, document = ?3, updated_at = ?4
                     WHERE user_id = ?1 AND version = ?5",
                    params![&key, next as i64, document, now, v as i64],
                )?;
            }
        }
        tx.commit()?;

        tracing::debug!(user = %user, version = next, "Streak state saved");
        Ok(next)
    }
}

fn to_version(raw: i64) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(|_| StoreError::InvalidData(format!("Negative version: {}", raw)))
}
