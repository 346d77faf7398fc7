//! SQLite error type

use thiserror::Error;

/// Error type for SQLite operations
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database error from sqlx
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed
    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    /// Stored value could not be decoded (corrupt enum/JSON column)
    #[error("Invalid stored value in {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
