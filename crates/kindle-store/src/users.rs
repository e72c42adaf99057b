//! UserStore implementation

use crate::{bytes_to_id, id_to_bytes, text_to_time, time_to_text, SqliteStore, StoreError};
use kindle_domain::traits::UserStore;
use kindle_domain::{User, UserId};
use rusqlite::{params, OptionalExtension};

struct UserRow {
    id: Vec<u8>,
    name: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
        })
    }

    fn into_user(self) -> Result<User, StoreError> {
        Ok(User {
            id: UserId::from_value(bytes_to_id(&self.id)?),
            name: self.name,
            created_at: text_to_time(&self.created_at)?,
        })
    }
}

impl UserStore for SqliteStore {
    fn insert_user(&self, user: &User) -> Result<(), Self::Error> {
        self.conn().execute(
            "INSERT INTO users (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![id_to_bytes(user.id.value()), &user.name, time_to_text(&user.created_at)],
        )?;
        Ok(())
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, name, created_at FROM users WHERE id = ?1",
                params![id_to_bytes(id.value())],
                UserRow::from_row,
            )
            .optional()?;
        row.map(UserRow::into_user).transpose()
    }

    fn list_users(&self) -> Result<Vec<User>, Self::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM users ORDER BY created_at, id")?;
        let rows = stmt
            .query_map([], UserRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(UserRow::into_user).collect()
    }
}
