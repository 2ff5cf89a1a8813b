//! Exclusive run lock.

use super::PersistenceError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const IN_MEMORY: &str = ":memory:";

/// Advisory lock on `<database>.lock`, held for the whole run.
///
/// The lock is released when the guard is dropped or the process exits, so a
/// crashed run never blocks the next one. In-memory databases are not shared
/// between processes and take no lock.
#[derive(Debug)]
pub struct RunLock {
    held: Option<(PathBuf, File)>,
}

impl RunLock {
    /// Takes the lock for `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::RunInProgress`] if another run holds the
    /// lock, or [`PersistenceError::LockFailed`] if it cannot be taken.
    pub fn acquire(database_url: &str) -> Result<Self, PersistenceError> {
        let database_url = database_url.trim();
        if database_url.is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }
        if database_url == IN_MEMORY {
            return Ok(Self { held: None });
        }

        let path = PathBuf::from(format!("{database_url}.lock"));
        let lock_failed = |error: std::io::Error| PersistenceError::LockFailed {
            path: path.display().to_string(),
            message: error.to_string(),
        };

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(lock_failed)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "Run lock acquired");
                Ok(Self {
                    held: Some((path, file)),
                })
            }
            Err(ref error) if error.kind() == ErrorKind::WouldBlock => {
                Err(PersistenceError::RunInProgress {
                    path: path.display().to_string(),
                })
            }
            Err(error) => Err(lock_failed(error)),
        }
    }

    /// Returns the lock file path, if a lock is held.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.held.as_ref().map(|(path, _)| path.as_path())
    }
}
