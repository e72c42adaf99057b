//! HabitStore implementation
//!
//! Edits, ledger toggles and group links write disjoint columns. A toggle
//! reads and rewrites the ledger inside one immediate transaction, so two
//! processes toggling the same habit never lose each other's entries.

use crate::{bytes_to_id, id_to_bytes, text_to_time, time_to_text, SqliteStore, StoreError};
use kindle_domain::traits::HabitStore;
use kindle_domain::{CivilDate, GroupId, Habit, HabitId, HabitKind, UserId, Visibility};
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use std::collections::BTreeSet;

const HABIT_COLUMNS: &str = "id, user_id, name, identity, kind, goal, active_days, \
     duration_target, completions, visibility, group_id, created_at";

/// Raw column values of one habits row
struct HabitRow {
    id: Vec<u8>,
    user_id: Vec<u8>,
    name: String,
    identity: String,
    kind: String,
    goal: i64,
    active_days: String,
    duration_target: Option<i64>,
    completions: String,
    visibility: String,
    group_id: Option<Vec<u8>>,
    created_at: String,
}

impl HabitRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            identity: row.get(3)?,
            kind: row.get(4)?,
            goal: row.get(5)?,
            active_days: row.get(6)?,
            duration_target: row.get(7)?,
            completions: row.get(8)?,
            visibility: row.get(9)?,
            group_id: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    fn into_habit(self) -> Result<Habit, StoreError> {
        let kind = HabitKind::parse(&self.kind)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown habit kind: {}", self.kind)))?;
        let visibility = Visibility::parse(&self.visibility).ok_or_else(|| {
            StoreError::InvalidData(format!("Unknown visibility: {}", self.visibility))
        })?;
        let active_days: BTreeSet<u8> = serde_json::from_str(&self.active_days)?;
        let completions: BTreeSet<CivilDate> = serde_json::from_str(&self.completions)?;
        let group_link = match self.group_id {
            Some(bytes) => Some(GroupId::from_value(bytes_to_id(&bytes)?)),
            None => None,
        };

        Ok(Habit {
            id: HabitId::from_value(bytes_to_id(&self.id)?),
            user_id: UserId::from_value(bytes_to_id(&self.user_id)?),
            name: self.name,
            identity: self.identity,
            kind,
            goal: to_u32(self.goal, "goal")?,
            active_days,
            duration_target: self
                .duration_target
                .map(|v| to_u32(v, "duration_target"))
                .transpose()?,
            completions,
            visibility,
            group_link,
            created_at: text_to_time(&self.created_at)?,
        })
    }
}

fn to_u32(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{} out of range: {}", column, value)))
}

impl HabitStore for SqliteStore {
    fn insert_habit(&self, habit: &Habit) -> Result<(), Self::Error> {
        let active_days = serde_json::to_string(&habit.active_days)?;
        let completions = serde_json::to_string(&habit.completions)?;
        self.conn().execute(
            &format!(
                "INSERT INTO habits ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                HABIT_COLUMNS
            ),
            params![
                id_to_bytes(habit.id.value()),
                id_to_bytes(habit.user_id.value()),
                &habit.name,
                &habit.identity,
                habit.kind.as_str(),
                habit.goal,
                active_days,
                habit.duration_target,
                completions,
                habit.visibility.as_str(),
                habit.group_link.map(|g| id_to_bytes(g.value())),
                time_to_text(&habit.created_at),
            ],
        )?;
        tracing::debug!(habit = %habit.id, user = %habit.user_id, "Habit inserted");
        Ok(())
    }

    fn update_habit(&self, habit: &Habit) -> Result<(), Self::Error> {
        let active_days = serde_json::to_string(&habit.active_days)?;
        let changed = self.conn().execute(
            "UPDATE habits SET name = ?2, identity = ?3, kind = ?4, goal = ?5, active_days = ?6,
                duration_target = ?7, visibility = ?8
             WHERE id = ?1",
            params![
                id_to_bytes(habit.id.value()),
                &habit.name,
                &habit.identity,
                habit.kind.as_str(),
                habit.goal,
                active_days,
                habit.duration_target,
                habit.visibility.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("habit {}", habit.id)));
        }
        Ok(())
    }

    fn toggle_completion(&self, habit: HabitId, day: CivilDate) -> Result<Option<bool>, Self::Error> {
        let key = id_to_bytes(habit.value());
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let stored: Option<String> = tx
            .query_row(
                "SELECT completions FROM habits WHERE id = ?1",
                params![&key],
                |row| row.get(0),
            )
            .optional()?;
        let Some(stored) = stored else {
            return Ok(None);
        };

        let mut completions: BTreeSet<CivilDate> = serde_json::from_str(&stored)?;
        let completed = if completions.remove(&day) {
            false
        } else {
            completions.insert(day);
            true
        };
        tx.execute(
            "UPDATE habits SET completions = ?2 WHERE id = ?1",
            params![&key, serde_json::to_string(&completions)?],
        )?;
        tx.commit()?;

        tracing::debug!(habit = %habit, %day, completed, "Completion toggled");
        Ok(Some(completed))
    }

    fn set_group_link(&self, habit: HabitId, group: Option<GroupId>) -> Result<bool, Self::Error> {
        let changed = self.conn().execute(
            "UPDATE habits SET group_id = ?2 WHERE id = ?1",
            params![id_to_bytes(habit.value()), group.map(|g| id_to_bytes(g.value()))],
        )?;
        Ok(changed > 0)
    }

    fn get_habit(&self, id: HabitId) -> Result<Option<Habit>, Self::Error> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS),
                params![id_to_bytes(id.value())],
                HabitRow::from_row,
            )
            .optional()?;
        row.map(HabitRow::into_habit).transpose()
    }

    fn habits_for_user(&self, user: UserId) -> Result<Vec<Habit>, Self::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM habits WHERE user_id = ?1 ORDER BY created_at, id",
            HABIT_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![id_to_bytes(user.value())], HabitRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(HabitRow::into_habit).collect()
    }

    fn delete_habit(&self, id: HabitId) -> Result<bool, Self::Error> {
        let removed = self
            .conn()
            .execute("DELETE FROM habits WHERE id = ?1", params![id_to_bytes(id.value())])?;
        Ok(removed > 0)
    }
}
