use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::models::{self, PostRow};
use crate::{Database, Result, StoreError};

impl Database {
    pub fn create_post(
        &self,
        id: Uuid,
        user_id: Uuid,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, user_id, body, likes_count, dislikes_count, created_at)
                 VALUES (?1, ?2, ?3, 0, 0, ?4)",
                params![
                    id.to_string(),
                    user_id.to_string(),
                    body,
                    created_at.to_rfc3339()
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, body, likes_count, dislikes_count, created_at, edited_at
                 FROM posts
                 ORDER BY created_at",
            )?;

            let rows = stmt
                .query_map([], row_to_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_post(&self, id: Uuid) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, body, likes_count, dislikes_count, created_at, edited_at
                     FROM posts WHERE id = ?1",
                    [id.to_string()],
                    row_to_post,
                )
                .optional()?;

            Ok(row)
        })
    }

    /// Replace the body of the caller's own post. Absent posts are
    /// `NotFound`; posts owned by someone else are `NotOwner`.
    pub fn edit_post(&self, user_id: Uuid, post_id: Uuid, body: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let owner: Option<String> = tx
                .query_row(
                    "SELECT user_id FROM posts WHERE id = ?1",
                    [post_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(owner) = owner else {
                return Err(StoreError::NotFound);
            };
            if owner != user_id.to_string() {
                return Err(StoreError::NotOwner);
            }

            tx.execute(
                "UPDATE posts SET body = ?1, edited_at = ?2 WHERE id = ?3",
                params![body, Utc::now().to_rfc3339(), post_id.to_string()],
            )?;

            tx.commit()?;
            Ok(())
        })
    }

    /// Hard-delete the caller's own post. The single id+owner filter makes
    /// absent and foreign posts indistinguishable: both are `NotFound`.
    /// Reaction rows go with the post via the cascade.
    pub fn delete_post(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM posts WHERE id = ?1 AND user_id = ?2",
                params![post_id.to_string(), user_id.to_string()],
            )?;
            if affected == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: models::uuid_col(row, 0)?,
        user_id: models::uuid_col(row, 1)?,
        body: row.get(2)?,
        likes_count: row.get(3)?,
        dislikes_count: row.get(4)?,
        created_at: models::ts_col(row, 5)?,
        edited_at: models::opt_ts_col(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::api::ReactionKind;

    fn seed_user(db: &Database, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        db.create_user(id, name, "hash").unwrap();
        id
    }

    #[test]
    fn create_and_list() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");

        let id = Uuid::new_v4();
        db.create_post(id, alice, "hello world", Utc::now()).unwrap();

        let posts = db.list_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, id);
        assert_eq!(posts[0].likes_count, 0);
        assert_eq!(posts[0].dislikes_count, 0);
        assert!(posts[0].edited_at.is_none());
    }

    #[test]
    fn edit_is_owner_only() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let id = Uuid::new_v4();
        db.create_post(id, alice, "original", Utc::now()).unwrap();

        let err = db.edit_post(bob, id, "defaced").unwrap_err();
        assert!(matches!(err, StoreError::NotOwner));

        let err = db.edit_post(alice, Uuid::new_v4(), "nothing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        db.edit_post(alice, id, "revised").unwrap();
        let row = db.get_post(id).unwrap().unwrap();
        assert_eq!(row.body, "revised");
        assert!(row.edited_at.is_some());
    }

    #[test]
    fn delete_is_owner_only_and_physical() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let id = Uuid::new_v4();
        db.create_post(id, alice, "short-lived", Utc::now()).unwrap();

        let err = db.delete_post(bob, id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        db.delete_post(alice, id).unwrap();
        assert!(db.get_post(id).unwrap().is_none());

        let err = db.delete_post(alice, id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn delete_cascades_reaction_rows() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let id = Uuid::new_v4();
        db.create_post(id, alice, "reacted", Utc::now()).unwrap();
        db.react_to_post(bob, id, ReactionKind::Like).unwrap();

        db.delete_post(alice, id).unwrap();
        assert_eq!(db.post_reaction_counts(id).unwrap(), (0, 0));
    }
}
