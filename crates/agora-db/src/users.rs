use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::models::{self, UserRow};
use crate::{Database, Result};

impl Database {
    pub fn create_user(&self, id: Uuid, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    id.to_string(),
                    username,
                    password_hash,
                    Utc::now().to_rfc3339()
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, created_at FROM users ORDER BY created_at",
            )?;

            let rows = stmt
                .query_map([], row_to_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt.query_row([username], row_to_user).optional()?;

    Ok(row)
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: models::uuid_col(row, 0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        created_at: models::ts_col(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;

    #[test]
    fn create_and_fetch_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        db.create_user(id, "alice", "hash").unwrap();

        let user = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.password, "hash");

        assert!(db.get_user_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(Uuid::new_v4(), "alice", "hash").unwrap();

        let err = db
            .create_user(Uuid::new_v4(), "alice", "other")
            .unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn list_returns_everyone() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(Uuid::new_v4(), "alice", "h1").unwrap();
        db.create_user(Uuid::new_v4(), "bob", "h2").unwrap();

        let users = db.list_users().unwrap();
        assert_eq!(users.len(), 2);
    }
}
