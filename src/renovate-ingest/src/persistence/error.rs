//! Persistence error types.

use thiserror::Error;

/// Errors raised while writing or reading the datastore.
///
/// Any error during a write leaves the previously committed batch in place.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// The database URL/path was blank.
    #[error("database URL must not be blank")]
    BlankDatabaseUrl,

    /// Establishing a `SQLite` connection failed.
    #[error("failed to connect to SQLite database: {message}")]
    ConnectionFailed { message: String },

    /// Running pending migrations failed.
    #[error("failed to run database migrations: {message}")]
    MigrationFailed { message: String },

    /// Enabling foreign key enforcement failed.
    #[error("failed to enable foreign keys: {message}")]
    ForeignKeysEnableFailed { message: String },

    /// Replacing the stored batch failed and was rolled back.
    #[error("failed to write run batch, previous data kept: {message}")]
    WriteFailed { message: String },

    /// Reading stored rows failed.
    #[error("failed to read stored rows: {message}")]
    ReadFailed { message: String },

    /// Another run holds the lock file.
    #[error("another run is in progress (lock '{path}' is held)")]
    RunInProgress { path: String },

    /// The lock file could not be opened or locked.
    #[error("failed to lock '{path}': {message}")]
    LockFailed { path: String, message: String },
}
