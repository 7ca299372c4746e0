use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        -- One row per user: re-login overwrites the token column in place.
        CREATE TABLE IF NOT EXISTS tokens (
            id          TEXT PRIMARY KEY,
            token       TEXT NOT NULL,
            secret      TEXT NOT NULL,
            user_id     TEXT NOT NULL UNIQUE REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            sender_id       TEXT NOT NULL REFERENCES users(id),
            recipient_id    TEXT NOT NULL REFERENCES users(id),
            body            TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            edited_at       TEXT,
            is_deleted      INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_messages_recipient
            ON messages(recipient_id, is_deleted);

        -- Likes and dislikes on messages live in separate tables with no
        -- mutual exclusion between them.
        CREATE TABLE IF NOT EXISTS message_likes (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            message_id  TEXT NOT NULL REFERENCES messages(id),
            UNIQUE(user_id, message_id)
        );

        CREATE INDEX IF NOT EXISTS idx_message_likes_message
            ON message_likes(message_id);

        CREATE TABLE IF NOT EXISTS message_dislikes (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            message_id  TEXT NOT NULL REFERENCES messages(id),
            UNIQUE(user_id, message_id)
        );

        CREATE INDEX IF NOT EXISTS idx_message_dislikes_message
            ON message_dislikes(message_id);

        CREATE TABLE IF NOT EXISTS posts (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id),
            body            TEXT NOT NULL,
            likes_count     INTEGER NOT NULL DEFAULT 0,
            dislikes_count  INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL,
            edited_at       TEXT
        );

        CREATE TABLE IF NOT EXISTS post_reactions (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id),
            post_id         TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            reaction_type   TEXT NOT NULL,
            UNIQUE(user_id, post_id)
        );

        CREATE INDEX IF NOT EXISTS idx_post_reactions_post
            ON post_reactions(post_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
