//! The owned database handle handed to the rest of the frontend.

use std::fmt;

use crate::error::DbError;
use crate::migrations::run_migrations;
use crate::pool::{create_pool, DbConn, DbPool, DbRuntimeSettings};
use crate::schema::verify_schema;
use crate::target::DbTarget;

/// A pooled connection to the frontend database.
///
/// Built once at startup and passed to whatever needs connections. Cloning
/// is cheap and every clone shares the same pool.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    target: DbTarget,
}

impl Database {
    /// Opens the database at `url` and brings its schema up to date.
    ///
    /// Pending migrations are applied and the resulting tables are checked
    /// against [`schema::TABLES`](crate::schema::TABLES) before the handle is
    /// returned, so no caller can observe a half-initialized schema.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Url` for an unusable URL, `DbError::Pool` if the
    /// database cannot be opened, and `DbError::Migration` or
    /// `DbError::Schema` if the schema cannot be brought into shape.
    pub fn open(url: &str, settings: DbRuntimeSettings) -> Result<Self, DbError> {
        let db = Self::open_without_migrations(url, settings)?;
        db.migrate()?;
        tracing::info!(db = %db.target, "database ready");
        Ok(db)
    }

    /// Opens the database without touching its schema.
    ///
    /// For processes that only need connections and leave migrations to a
    /// dedicated step.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Url` or `DbError::Pool`.
    pub fn open_without_migrations(
        url: &str,
        settings: DbRuntimeSettings,
    ) -> Result<Self, DbError> {
        let target = DbTarget::parse(url)?;
        let pool = create_pool(&target, settings)?;
        Ok(Self { pool, target })
    }

    /// Applies pending migrations and verifies the schema.
    ///
    /// Returns the number of migrations applied; `0` when already current.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if a connection cannot be acquired, a migration
    /// fails, or the tables do not match their declaration.
    pub fn migrate(&self) -> Result<usize, DbError> {
        let conn = self.connect()?;
        let applied = run_migrations(&conn)?;
        verify_schema(&conn)?;
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
        Ok(applied)
    }

    /// Checks out a connection.
    ///
    /// The connection belongs to the caller until dropped, at which point it
    /// returns to the pool. Concurrent callers get distinct connections.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Acquire` if no connection becomes available within
    /// the configured connect timeout.
    pub fn connect(&self) -> Result<DbConn, DbError> {
        Ok(self.pool.get()?)
    }

    /// Where this database lives.
    pub fn target(&self) -> &DbTarget {
        &self.target
    }

    /// Number of connections currently open, idle or checked out.
    pub fn open_connections(&self) -> u32 {
        self.pool.state().connections
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("target", &self.target)
            .field("max_size", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TABLES;

    fn fast_settings() -> DbRuntimeSettings {
        DbRuntimeSettings {
            connect_timeout_ms: 250,
            ..DbRuntimeSettings::default()
        }
    }

    #[test]
    fn open_creates_tables() {
        let db = Database::open("sqlite::memory:", fast_settings()).expect("open");
        let conn = db.connect().expect("connect");
        for table in TABLES {
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                    [table.name],
                    |row| row.get(0),
                )
                .expect("should query sqlite_master");
            assert!(exists, "{} should exist", table.name);
        }
    }

    #[test]
    fn migrate_is_idempotent() {
        let db = Database::open(":memory:", fast_settings()).expect("open");
        assert_eq!(db.migrate().expect("second migrate"), 0);
    }

    #[test]
    fn open_without_migrations_leaves_schema_alone() {
        let db = Database::open_without_migrations(":memory:", fast_settings()).expect("open");
        let conn = db.connect().expect("connect");
        let tables: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'", [], |row| {
                row.get(0)
            })
            .expect("should count tables");
        assert_eq!(tables, 0);
        drop(conn);

        assert_eq!(db.migrate().expect("migrate"), 3);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let err = Database::open("mysql://localhost/frontend", fast_settings())
            .expect_err("mysql should be rejected");
        assert!(matches!(err, DbError::Url(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn exhausted_pool_times_out() {
        let settings = DbRuntimeSettings {
            pool_max_size: 1,
            ..fast_settings()
        };
        let db = Database::open(":memory:", settings).expect("open");
        let _held = db.connect().expect("first connection");
        assert_eq!(db.open_connections(), 1);

        let err = db.connect().expect_err("pool of one is exhausted");
        assert!(matches!(err, DbError::Acquire(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn divergent_existing_table_fails_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("frontend.db");
        {
            let conn = rusqlite::Connection::open(&path).expect("open raw");
            conn.execute_batch("CREATE TABLE frontend_posts (id TEXT PRIMARY KEY);")
                .expect("create divergent table");
        }

        let url = format!("sqlite://{}", path.display());
        let err = Database::open(&url, fast_settings()).expect_err("schema should not verify");
        assert!(matches!(err, DbError::Schema(_)), "unexpected error: {err:?}");
    }
}
