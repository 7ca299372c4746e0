use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Entity absent, or excluded by the soft-delete filter.
    #[error("Record not found")]
    NotFound,

    /// The identical reaction is already in place.
    #[error("Reaction already set")]
    DuplicateReaction,

    /// The caller tried to react to their own message or post.
    #[error("Cannot react to own content")]
    OwnContent,

    /// The caller does not own the entity they tried to mutate.
    #[error("Not the owner")]
    NotOwner,

    /// Timestamp parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
