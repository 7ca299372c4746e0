use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::models::{self, InboxRow, MessageRow};
use crate::{Database, Result, StoreError};

impl Database {
    pub fn insert_message(
        &self,
        id: Uuid,
        sender_id: Uuid,
        recipient_id: Uuid,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, recipient_id, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.to_string(),
                    sender_id.to_string(),
                    recipient_id.to_string(),
                    body,
                    created_at.to_rfc3339()
                ],
            )?;
            Ok(())
        })
    }

    /// Inbox listing: active messages addressed to the recipient, joined
    /// with the sender's username and the message-wide reaction flags in a
    /// single query.
    pub fn inbox(&self, recipient_id: Uuid) -> Result<Vec<InboxRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.sender_id, m.recipient_id, m.body, m.created_at, m.edited_at,
                        m.is_deleted, u.username,
                        EXISTS(SELECT 1 FROM message_likes l WHERE l.message_id = m.id),
                        EXISTS(SELECT 1 FROM message_dislikes d WHERE d.message_id = m.id)
                 FROM messages m
                 LEFT JOIN users u ON u.id = m.sender_id
                 WHERE m.recipient_id = ?1 AND m.is_deleted = 0
                 ORDER BY m.created_at",
            )?;

            let rows = stmt
                .query_map([recipient_id.to_string()], |row| {
                    Ok(InboxRow {
                        message: MessageRow {
                            id: models::uuid_col(row, 0)?,
                            sender_id: models::uuid_col(row, 1)?,
                            recipient_id: models::uuid_col(row, 2)?,
                            body: row.get(3)?,
                            created_at: models::ts_col(row, 4)?,
                            edited_at: models::opt_ts_col(row, 5)?,
                            is_deleted: row.get(6)?,
                        },
                        sender_username: row.get(7)?,
                        is_liked: row.get(8)?,
                        is_disliked: row.get(9)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Update the body of the caller's own active message. An empty
    /// replacement body leaves the message untouched but still reports
    /// success; a missing, foreign or soft-deleted target is `NotFound`
    /// either way.
    pub fn edit_message(&self, sender_id: Uuid, message_id: Uuid, new_body: &str) -> Result<()> {
        self.with_conn(|conn| {
            if new_body.is_empty() {
                let exists = conn
                    .query_row(
                        "SELECT 1 FROM messages
                         WHERE id = ?1 AND sender_id = ?2 AND is_deleted = 0",
                        params![message_id.to_string(), sender_id.to_string()],
                        |row| row.get::<_, i64>(0),
                    )
                    .optional()?;
                return exists.map(|_| ()).ok_or(StoreError::NotFound);
            }

            let affected = conn.execute(
                "UPDATE messages SET body = ?1, edited_at = ?2
                 WHERE id = ?3 AND sender_id = ?4 AND is_deleted = 0",
                params![
                    new_body,
                    Utc::now().to_rfc3339(),
                    message_id.to_string(),
                    sender_id.to_string()
                ],
            )?;
            if affected == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }

    /// Flip the soft-delete flag on the caller's own active message. The
    /// filter excludes already-deleted rows, so a second delete is
    /// `NotFound` rather than an idempotent success.
    pub fn soft_delete_message(&self, sender_id: Uuid, message_id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE messages SET is_deleted = 1
                 WHERE id = ?1 AND sender_id = ?2 AND is_deleted = 0",
                params![message_id.to_string(), sender_id.to_string()],
            )?;
            if affected == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_user(db: &Database, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        db.create_user(id, name, "hash").unwrap();
        id
    }

    fn send(db: &Database, from: Uuid, to: Uuid, body: &str) -> Uuid {
        let id = Uuid::new_v4();
        db.insert_message(id, from, to, body, Utc::now()).unwrap();
        id
    }

    #[test]
    fn inbox_lists_only_active_messages_for_recipient() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let to_bob = send(&db, alice, bob, "hi bob");
        send(&db, bob, alice, "hi alice");

        let inbox = db.inbox(bob).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].message.id, to_bob);
        assert_eq!(inbox[0].message.body, "hi bob");
        assert_eq!(inbox[0].sender_username.as_deref(), Some("alice"));
        assert!(!inbox[0].is_liked);
        assert!(!inbox[0].is_disliked);

        db.soft_delete_message(alice, to_bob).unwrap();
        assert!(db.inbox(bob).unwrap().is_empty());
    }

    #[test]
    fn edit_updates_body_and_edited_at() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let msg = send(&db, alice, bob, "first");

        db.edit_message(alice, msg, "second").unwrap();

        let inbox = db.inbox(bob).unwrap();
        assert_eq!(inbox[0].message.body, "second");
        assert!(inbox[0].message.edited_at.is_some());
    }

    #[test]
    fn empty_body_is_a_silent_no_op() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let msg = send(&db, alice, bob, "first");

        db.edit_message(alice, msg, "").unwrap();

        let inbox = db.inbox(bob).unwrap();
        assert_eq!(inbox[0].message.body, "first");
        assert!(inbox[0].message.edited_at.is_none());

        // The existence check still applies to the no-op path.
        let err = db.edit_message(alice, Uuid::new_v4(), "").unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn only_the_sender_may_edit_or_delete() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let msg = send(&db, alice, bob, "hi");

        let err = db.edit_message(bob, msg, "hacked").unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        let err = db.soft_delete_message(bob, msg).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn double_delete_surfaces_not_found() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let msg = send(&db, alice, bob, "hi");

        db.soft_delete_message(alice, msg).unwrap();
        let err = db.soft_delete_message(alice, msg).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        // Deleted messages cannot be edited back to life either.
        let err = db.edit_message(alice, msg, "revived").unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
