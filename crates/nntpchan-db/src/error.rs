//! Top-level error type for the data layer.

use rusqlite::ffi;
use thiserror::Error;

use crate::migrations::MigrationError;
use crate::pool::PoolError;
use crate::schema::SchemaError;
use crate::target::UrlError;

/// Errors returned by [`Database`](crate::Database) and the row helpers.
#[derive(Debug, Error)]
pub enum DbError {
    /// The configured database URL could not be parsed.
    #[error("invalid database url: {0}")]
    Url(#[from] UrlError),

    /// The pool could not open its connections.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// No connection could be checked out of the pool in time.
    #[error("failed to acquire database connection: {0}")]
    Acquire(#[from] r2d2::Error),

    /// A migration could not be applied; its changes were rolled back.
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// The tables exist but differ from the declared schema.
    #[error("database schema mismatch: {0}")]
    Schema(#[from] SchemaError),

    /// A statement failed, including constraint violations.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    /// Returns `true` if a UNIQUE or PRIMARY KEY constraint rejected the write.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self.extended_code(),
            Some(ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        )
    }

    /// Returns `true` if a FOREIGN KEY constraint rejected the write.
    pub fn is_foreign_key_violation(&self) -> bool {
        self.extended_code() == Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
    }

    fn extended_code(&self) -> Option<i32> {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => Some(err.extended_code),
            _ => None,
        }
    }
}
