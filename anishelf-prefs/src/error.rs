//! Error types for preference storage.

use thiserror::Error;

/// Result type for preference backend operations.
pub type PrefsResult<T> = Result<T, PrefsError>;

/// Errors a preference backend can report.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding the backend was poisoned by a panicking writer.
    #[error("preference store lock poisoned")]
    Poisoned,

    /// The backend refuses writes (disabled or over quota).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
