//! GroupStore implementation

use crate::{bytes_to_id, id_to_bytes, text_to_time, time_to_text, SqliteStore, StoreError};
use kindle_domain::traits::GroupStore;
use kindle_domain::{
    CivilDate, Group, GroupId, GroupMember, GroupStreak, HabitId, UserId,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

struct GroupRow {
    id: Vec<u8>,
    name: String,
    group_streak: i64,
    last_completed_date: Option<String>,
    created_at: String,
}

impl GroupRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            group_streak: row.get(2)?,
            last_completed_date: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

fn load_members(conn: &Connection, group: &[u8]) -> Result<Vec<GroupMember>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT user_id, habit_id FROM squad_members WHERE group_id = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map(params![group], |row| {
            Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Option<Vec<u8>>>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(user, habit)| {
            Ok(GroupMember {
                user_id: UserId::from_value(bytes_to_id(&user)?),
                habit_id: match habit {
                    Some(bytes) => Some(HabitId::from_value(bytes_to_id(&bytes)?)),
                    None => None,
                },
            })
        })
        .collect()
}

fn assemble(conn: &Connection, row: GroupRow) -> Result<Group, StoreError> {
    let members = load_members(conn, &row.id)?;
    let last_completed_date_ist = row
        .last_completed_date
        .map(|s| {
            s.parse::<CivilDate>()
                .map_err(|e| StoreError::InvalidData(e.to_string()))
        })
        .transpose()?;
    let group_streak = u32::try_from(row.group_streak).map_err(|_| {
        StoreError::InvalidData(format!("group_streak out of range: {}", row.group_streak))
    })?;

    Ok(Group {
        id: GroupId::from_value(bytes_to_id(&row.id)?),
        name: row.name,
        members,
        streak: GroupStreak {
            group_streak,
            last_completed_date_ist,
        },
        created_at: text_to_time(&row.created_at)?,
    })
}

fn write_members(tx: &Transaction<'_>, group: &Group) -> Result<(), StoreError> {
    let key = id_to_bytes(group.id.value());
    tx.execute("DELETE FROM squad_members WHERE group_id = ?1", params![&key])?;
    let mut stmt = tx.prepare(
        "INSERT INTO squad_members (group_id, user_id, habit_id, position) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, member) in group.members.iter().enumerate() {
        stmt.execute(params![
            &key,
            id_to_bytes(member.user_id.value()),
            member.habit_id.map(|h| id_to_bytes(h.value())),
            position as i64,
        ])?;
    }
    Ok(())
}

impl GroupStore for SqliteStore {
    fn insert_group(&self, group: &Group) -> Result<(), Self::Error> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO squads (id, name, group_streak, last_completed_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id_to_bytes(group.id.value()),
                &group.name,
                group.streak.group_streak,
                group.streak.last_completed_date_ist.map(|d| d.to_string()),
                time_to_text(&group.created_at),
            ],
        )?;
        write_members(&tx, group)?;
        tx.commit()?;
        tracing::debug!(group = %group.id, members = group.members.len(), "Group inserted");
        Ok(())
    }

    fn update_group(&self, group: &Group) -> Result<(), Self::Error> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE squads SET name = ?2, group_streak = ?3, last_completed_date = ?4 WHERE id = ?1",
            params![
                id_to_bytes(group.id.value()),
                &group.name,
                group.streak.group_streak,
                group.streak.last_completed_date_ist.map(|d| d.to_string()),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("group {}", group.id)));
        }
        write_members(&tx, group)?;
        tx.commit()?;
        Ok(())
    }

    fn get_group(&self, id: GroupId) -> Result<Option<Group>, Self::Error> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT id, name, group_streak, last_completed_date, created_at
                 FROM squads WHERE id = ?1",
                params![id_to_bytes(id.value())],
                GroupRow::from_row,
            )
            .optional()?;
        row.map(|r| assemble(&conn, r)).transpose()
    }

    fn list_groups(&self) -> Result<Vec<Group>, Self::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, group_streak, last_completed_date, created_at
             FROM squads ORDER BY created_at, id",
        )?;
        let rows = stmt
            .query_map([], GroupRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(|r| assemble(&conn, r)).collect()
    }

    fn remove_habit_links(&self, habit: HabitId) -> Result<usize, Self::Error> {
        let cleared = self.conn().execute(
            "UPDATE squad_members SET habit_id = NULL WHERE habit_id = ?1",
            params![id_to_bytes(habit.value())],
        )?;
        if cleared > 0 {
            tracing::debug!(habit = %habit, cleared, "Group links cleared");
        }
        Ok(cleared)
    }
}
