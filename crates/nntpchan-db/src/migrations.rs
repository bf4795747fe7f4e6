//! Embedded SQL migration runner.
//!
//! Migrations are SQL files embedded at compile time. They run sequentially
//! on startup, tracked by the `_frontend_migrations` table. Each migration
//! runs exactly once per database, even when several processes open the
//! same file at the same time.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use thiserror::Error;

/// A single embedded migration.
struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. New migrations are appended here.
const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "000_init",
        sql: include_str!("migrations/000_init.sql"),
    },
    Migration {
        name: "001_frontend_posts",
        sql: include_str!("migrations/001_frontend_posts.sql"),
    },
    Migration {
        name: "002_frontend_files",
        sql: include_str!("migrations/002_frontend_files.sql"),
    },
];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A SQL statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),
}

/// Runs all pending migrations against the given connection.
///
/// Migrations that have already been applied (tracked in
/// `_frontend_migrations`) are skipped. New migrations are applied in order
/// and recorded, each in its own transaction together with its tracking row.
///
/// # Errors
///
/// Returns `MigrationError` if any migration fails to execute or if the
/// migration tracking table cannot be queried.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, MIGRATIONS)
}

/// Names of all embedded migrations, in application order.
pub fn migration_names() -> impl Iterator<Item = &'static str> {
    MIGRATIONS.iter().map(|m| m.name)
}

const TRACKING_TABLE: &str = "CREATE TABLE IF NOT EXISTS _frontend_migrations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);";

fn run_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    conn.execute_batch(TRACKING_TABLE)
        .map_err(|e| MigrationError::ExecutionFailed {
            name: "_frontend_migrations_bootstrap".to_string(),
            source: e,
        })?;

    let mut applied = 0;
    for migration in migrations {
        if apply_migration(conn, migration)? {
            applied += 1;
        }
    }
    Ok(applied)
}

/// Applies one migration unless it is already recorded.
///
/// The check and the apply share one `BEGIN IMMEDIATE` transaction, so
/// processes migrating the same file concurrently take turns and only the
/// first one applies it. Returns `true` if this call applied it.
fn apply_migration(conn: &Connection, migration: &Migration) -> Result<bool, MigrationError> {
    let failed = |e| MigrationError::ExecutionFailed {
        name: migration.name.to_string(),
        source: e,
    };

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(failed)?;

    let recorded: bool = tx
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM _frontend_migrations WHERE name = ?1)",
            [migration.name],
            |row| row.get(0),
        )
        .map_err(MigrationError::StateQuery)?;

    if recorded {
        tracing::debug!(
            migration = migration.name,
            "migration already applied, skipping"
        );
        // Nothing was written; dropping the transaction releases the lock.
        return Ok(false);
    }

    tracing::info!(migration = migration.name, "applying migration");

    tx.execute_batch(migration.sql).map_err(failed)?;
    tx.execute(
        "INSERT INTO _frontend_migrations (name) VALUES (?1)",
        [migration.name],
    )
    .map_err(failed)?;
    tx.commit().map_err(failed)?;

    Ok(true)
}
