//! Diesel-backed `SQLite` datastore.

use super::rows::{BatchRows, DependencyUpdateRow, OnboardingStatusRow, PullRequestRow};
use super::schema::{dependency_update, pull_request, repository_onboarding_status};
use super::{Datastore, PersistenceError};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Embedded Diesel migrations shipped with the crate.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Rows per `INSERT` statement, well below `SQLite`'s bound parameter limit.
const INSERT_CHUNK: usize = 500;

/// A `SQLite` database holding the latest committed run batch.
pub struct SqliteDatastore {
    connection: Mutex<SqliteConnection>,
}

impl std::fmt::Debug for SqliteDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatastore").finish_non_exhaustive()
    }
}

impl SqliteDatastore {
    /// Opens the database at `database_url` and runs pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the database cannot be opened or
    /// migrated.
    pub fn open(database_url: &str) -> Result<Self, PersistenceError> {
        let database_url = database_url.trim();
        if database_url.is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }

        let mut connection = SqliteConnection::establish(database_url).map_err(|error| {
            PersistenceError::ConnectionFailed {
                message: error.to_string(),
            }
        })?;

        sql_query("PRAGMA foreign_keys = ON;")
            .execute(&mut connection)
            .map_err(|error| PersistenceError::ForeignKeysEnableFailed {
                message: error.to_string(),
            })?;

        let applied = connection
            .run_pending_migrations(MIGRATIONS)
            .map_err(|error| PersistenceError::MigrationFailed {
                message: error.to_string(),
            })?;
        debug!(database = %database_url, migrations = applied.len(), "Database ready");

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, SqliteConnection>, PersistenceError> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::ConnectionFailed {
                message: "connection mutex poisoned".to_string(),
            })
    }
}

impl Datastore for SqliteDatastore {
    fn replace_all(&self, rows: &BatchRows) -> Result<(), PersistenceError> {
        let mut connection = self.connection()?;

        connection
            .immediate_transaction(|conn| {
                diesel::delete(dependency_update::table).execute(conn)?;
                diesel::delete(pull_request::table).execute(conn)?;
                diesel::delete(repository_onboarding_status::table).execute(conn)?;

                for chunk in rows.pull_requests.chunks(INSERT_CHUNK) {
                    diesel::insert_into(pull_request::table)
                        .values(chunk)
                        .execute(conn)?;
                }
                for chunk in rows.dependency_updates.chunks(INSERT_CHUNK) {
                    diesel::insert_into(dependency_update::table)
                        .values(chunk)
                        .execute(conn)?;
                }
                for chunk in rows.onboarding.chunks(INSERT_CHUNK) {
                    diesel::insert_into(repository_onboarding_status::table)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok::<_, diesel::result::Error>(())
            })
            .map_err(|error| PersistenceError::WriteFailed {
                message: error.to_string(),
            })?;

        info!(
            pull_requests = rows.pull_requests.len(),
            dependency_updates = rows.dependency_updates.len(),
            onboarding_samples = rows.onboarding.len(),
            "Run batch committed"
        );
        Ok(())
    }

    fn snapshot(&self) -> Result<BatchRows, PersistenceError> {
        let mut connection = self.connection()?;
        let read_failed = |error: diesel::result::Error| PersistenceError::ReadFailed {
            message: error.to_string(),
        };

        let pull_requests = pull_request::table
            .order(pull_request::id)
            .select(PullRequestRow::as_select())
            .load(&mut *connection)
            .map_err(read_failed)?;
        let dependency_updates = dependency_update::table
            .order(dependency_update::id)
            .select(DependencyUpdateRow::as_select())
            .load(&mut *connection)
            .map_err(read_failed)?;
        let onboarding = repository_onboarding_status::table
            .order(repository_onboarding_status::id)
            .select(OnboardingStatusRow::as_select())
            .load(&mut *connection)
            .map_err(read_failed)?;

        Ok(BatchRows {
            pull_requests,
            dependency_updates,
            onboarding,
        })
    }
}
