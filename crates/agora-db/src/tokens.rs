use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::models::{self, TokenRow};
use crate::{Database, Result};

impl Database {
    /// Store the caller's freshly issued token. A user holds at most one
    /// token row; re-login overwrites the stored token instead of adding a
    /// second row. `id` and `secret` are only used when the row does not
    /// exist yet.
    pub fn upsert_token(&self, user_id: Uuid, token: &str, id: Uuid, secret: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let updated = tx.execute(
                "UPDATE tokens SET token = ?1 WHERE user_id = ?2",
                params![token, user_id.to_string()],
            )?;
            if updated == 0 {
                tx.execute(
                    "INSERT INTO tokens (id, token, secret, user_id) VALUES (?1, ?2, ?3, ?4)",
                    params![id.to_string(), token, secret, user_id.to_string()],
                )?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Exact string match against the stored tokens. A syntactically valid
    /// signed token that is not the current row for its user resolves to
    /// `None` and must be treated as unauthorized.
    pub fn get_token(&self, token: &str) -> Result<Option<TokenRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, token, secret, user_id FROM tokens WHERE token = ?1",
                    [token],
                    |row| {
                        Ok(TokenRow {
                            id: models::uuid_col(row, 0)?,
                            token: row.get(1)?,
                            secret: row.get(2)?,
                            user_id: models::uuid_col(row, 3)?,
                        })
                    },
                )
                .optional()?;

            Ok(row)
        })
    }
}
