use agora_types::api::ReactionKind;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::{Database, Result, StoreError};

fn counter_column(kind: ReactionKind) -> &'static str {
    match kind {
        ReactionKind::Like => "likes_count",
        ReactionKind::Dislike => "dislikes_count",
    }
}

impl Database {
    pub fn like_message(&self, user_id: Uuid, message_id: Uuid) -> Result<()> {
        self.react_to_message(user_id, message_id, "message_likes")
    }

    pub fn dislike_message(&self, user_id: Uuid, message_id: Uuid) -> Result<()> {
        self.react_to_message(user_id, message_id, "message_dislikes")
    }

    /// Likes and dislikes share the check sequence but live in separate
    /// tables with no mutual exclusion between them. Check order: own
    /// content, duplicate, existence. The sender check runs against the
    /// message row regardless of its deleted flag, so reacting to one's own
    /// deleted message is refused as own content, not as missing.
    fn react_to_message(&self, user_id: Uuid, message_id: Uuid, table: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let sender: Option<String> = tx
                .query_row(
                    "SELECT sender_id FROM messages WHERE id = ?1",
                    [message_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            if sender.as_deref() == Some(user_id.to_string().as_str()) {
                return Err(StoreError::OwnContent);
            }

            let duplicate = tx
                .query_row(
                    &format!("SELECT 1 FROM {table} WHERE user_id = ?1 AND message_id = ?2"),
                    params![user_id.to_string(), message_id.to_string()],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            if duplicate.is_some() {
                return Err(StoreError::DuplicateReaction);
            }

            let active = tx
                .query_row(
                    "SELECT 1 FROM messages WHERE id = ?1 AND is_deleted = 0",
                    [message_id.to_string()],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            if active.is_none() {
                return Err(StoreError::NotFound);
            }

            tx.execute(
                &format!("INSERT INTO {table} (id, user_id, message_id) VALUES (?1, ?2, ?3)"),
                params![
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    message_id.to_string()
                ],
            )?;

            tx.commit()?;
            Ok(())
        })
    }

    /// React to a post. At most one reaction row per (user, post); switching
    /// kinds replaces the old row and moves its counter within the same
    /// transaction. The replacement step runs before the own-post check;
    /// if the own-post refusal fires, the transaction unwinds the
    /// decrement it already made.
    pub fn react_to_post(&self, user_id: Uuid, post_id: Uuid, kind: ReactionKind) -> Result<()> {
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

            let existing: Option<(String, String)> = tx
                .query_row(
                    "SELECT id, reaction_type FROM post_reactions
                     WHERE user_id = ?1 AND post_id = ?2",
                    params![user_id.to_string(), post_id.to_string()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            if let Some((existing_id, existing_type)) = existing {
                if existing_type == kind.as_str() {
                    return Err(StoreError::DuplicateReaction);
                }
                let existing_kind = match existing_type.as_str() {
                    "like" => ReactionKind::Like,
                    _ => ReactionKind::Dislike,
                };
                let column = counter_column(existing_kind);
                tx.execute(
                    &format!("UPDATE posts SET {column} = {column} - 1 WHERE id = ?1"),
                    [post_id.to_string()],
                )?;
                tx.execute(
                    "DELETE FROM post_reactions WHERE id = ?1",
                    [existing_id],
                )?;
            }

            if owner == user_id.to_string() {
                return Err(StoreError::OwnContent);
            }

            let column = counter_column(kind);
            tx.execute(
                &format!("UPDATE posts SET {column} = {column} + 1 WHERE id = ?1"),
                [post_id.to_string()],
            )?;
            tx.execute(
                "INSERT INTO post_reactions (id, user_id, post_id, reaction_type)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    post_id.to_string(),
                    kind.as_str()
                ],
            )?;

            tx.commit()?;
            Ok(())
        })
    }

    /// Recount reaction rows per kind for a post. The stored counters must
    /// always agree with these numbers.
    pub fn post_reaction_counts(&self, post_id: Uuid) -> Result<(i64, i64)> {
        self.with_conn(|conn| {
            let count = |kind: &str| -> Result<i64> {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM post_reactions
                     WHERE post_id = ?1 AND reaction_type = ?2",
                    params![post_id.to_string(), kind],
                    |row| row.get(0),
                )?)
            };
            Ok((count("like")?, count("dislike")?))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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

    fn post(db: &Database, owner: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        db.create_post(id, owner, "a post", Utc::now()).unwrap();
        id
    }

    fn counters(db: &Database, post_id: Uuid) -> (i64, i64) {
        let row = db.get_post(post_id).unwrap().unwrap();
        (row.likes_count, row.dislikes_count)
    }

    #[test]
    fn own_message_cannot_be_reacted_to() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let msg = send(&db, alice, bob, "hi");

        let err = db.like_message(alice, msg).unwrap_err();
        assert!(matches!(err, StoreError::OwnContent));
        let err = db.dislike_message(alice, msg).unwrap_err();
        assert!(matches!(err, StoreError::OwnContent));
    }

    #[test]
    fn duplicate_reaction_rejected() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let msg = send(&db, alice, bob, "hi");

        db.like_message(bob, msg).unwrap();
        let err = db.like_message(bob, msg).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateReaction));
    }

    #[test]
    fn like_and_dislike_are_independent() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let msg = send(&db, alice, bob, "hi");

        // No mutual exclusion between the two tables: the same user can
        // hold both on one message.
        db.like_message(bob, msg).unwrap();
        db.dislike_message(bob, msg).unwrap();

        let inbox = db.inbox(bob).unwrap();
        assert!(inbox[0].is_liked);
        assert!(inbox[0].is_disliked);
    }

    #[test]
    fn deleted_message_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let msg = send(&db, alice, bob, "hi");
        db.soft_delete_message(alice, msg).unwrap();

        let err = db.like_message(bob, msg).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        // The sender check fires before the existence check, so the sender
        // still sees OwnContent on their own deleted message.
        let err = db.like_message(alice, msg).unwrap_err();
        assert!(matches!(err, StoreError::OwnContent));
    }

    #[test]
    fn switching_reaction_replaces_row_and_moves_counter() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let post_id = post(&db, alice);

        db.react_to_post(bob, post_id, ReactionKind::Like).unwrap();
        assert_eq!(counters(&db, post_id), (1, 0));

        db.react_to_post(bob, post_id, ReactionKind::Dislike)
            .unwrap();
        assert_eq!(counters(&db, post_id), (0, 1));
        assert_eq!(db.post_reaction_counts(post_id).unwrap(), (0, 1));

        let err = db
            .react_to_post(bob, post_id, ReactionKind::Dislike)
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateReaction));
    }

    #[test]
    fn own_post_cannot_be_reacted_to() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let post_id = post(&db, alice);

        let err = db
            .react_to_post(alice, post_id, ReactionKind::Like)
            .unwrap_err();
        assert!(matches!(err, StoreError::OwnContent));
        assert_eq!(counters(&db, post_id), (0, 0));
    }

    #[test]
    fn react_keeps_counters_when_owner_reacts_after_seeded_row() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let post_id = post(&db, alice);

        // Seed a pre-existing like from the owner directly; no route can
        // create one, but the replacement step must still unwind cleanly if
        // one is ever present.
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO post_reactions (id, user_id, post_id, reaction_type)
                 VALUES (?1, ?2, ?3, 'like')",
                params![
                    Uuid::new_v4().to_string(),
                    alice.to_string(),
                    post_id.to_string()
                ],
            )?;
            conn.execute(
                "UPDATE posts SET likes_count = 1 WHERE id = ?1",
                [post_id.to_string()],
            )?;
            Ok(())
        })
        .unwrap();

        let err = db
            .react_to_post(alice, post_id, ReactionKind::Dislike)
            .unwrap_err();
        assert!(matches!(err, StoreError::OwnContent));

        // The replacement decrement ran before the own-post refusal but the
        // transaction rolled it back: row and counters are intact.
        assert_eq!(counters(&db, post_id), (1, 0));
        assert_eq!(db.post_reaction_counts(post_id).unwrap(), (1, 0));
    }

    #[test]
    fn missing_post_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let bob = seed_user(&db, "bob");

        let err = db
            .react_to_post(bob, Uuid::new_v4(), ReactionKind::Like)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn counter_scenario_end_to_end() {
        let db = Database::open_in_memory().unwrap();
        let u1 = seed_user(&db, "u1");
        let u2 = seed_user(&db, "u2");
        let post_id = post(&db, u1);

        db.react_to_post(u2, post_id, ReactionKind::Like).unwrap();
        assert_eq!(counters(&db, post_id), (1, 0));

        db.react_to_post(u2, post_id, ReactionKind::Dislike).unwrap();
        assert_eq!(counters(&db, post_id), (0, 1));

        let err = db
            .react_to_post(u1, post_id, ReactionKind::Like)
            .unwrap_err();
        assert!(matches!(err, StoreError::OwnContent));

        // Counters always reconcile with the reaction rows.
        assert_eq!(
            counters(&db, post_id),
            db.post_reaction_counts(post_id).unwrap()
        );
    }
}
