//! Persistence of run batches.
//!
//! Each run replaces the full contents of the datastore in one transaction:
//! readers see either the previous batch or the new one, never a mix. The
//! schema is managed with Diesel migrations embedded in the crate.

mod error;
mod lock;
mod rows;
pub mod schema;
mod sqlite;

pub use error::PersistenceError;
pub use lock::RunLock;
pub use rows::{BatchRows, DependencyUpdateRow, OnboardingStatusRow, PullRequestRow};
pub use sqlite::{SqliteDatastore, MIGRATIONS};

/// Transactional storage for run batches.
///
/// Implementations block; async callers run them on a blocking thread.
pub trait Datastore: Send + Sync {
    /// Atomically replaces every stored row with `rows`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the write fails. The previously
    /// stored rows are then left untouched.
    fn replace_all(&self, rows: &BatchRows) -> Result<(), PersistenceError>;

    /// Reads every stored row, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the read fails.
    fn snapshot(&self) -> Result<BatchRows, PersistenceError>;
}
