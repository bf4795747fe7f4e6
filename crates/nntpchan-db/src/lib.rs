//! Data layer for the nntpchan web frontend.
//!
//! Declares the `frontend_posts` and `frontend_files` tables, creates them
//! through embedded migrations, and hands out pooled SQLite connections via
//! [`Database`].
//!
//! # Design decisions
//!
//! - **Explicit handle**: [`Database`] is constructed by the caller and
//!   passed around; there is no process-wide engine.
//! - **Schema created on open**: [`Database::open`] runs pending migrations
//!   and verifies the result. Processes that must not touch the schema use
//!   [`Database::open_without_migrations`].
//! - **SQLite with WAL mode and foreign keys on**: every pooled connection
//!   enforces the `frontend_files.parent` reference.
//!
//! # Usage
//!
//! ```rust,ignore
//! use nntpchan_db::{Database, DbRuntimeSettings};
//!
//! let db = Database::open("sqlite://frontend.db", DbRuntimeSettings::default())?;
//! let conn = db.connect()?;
//! nntpchan_db::insert_post(&conn, &post)?;
//! ```

mod database;
mod error;
mod files;
mod migrations;
mod pool;
mod posts;
pub mod schema;
mod target;

pub use database::Database;
pub use error::DbError;
pub use files::{insert_file, list_files_for_post};
pub use migrations::{migration_names, run_migrations, MigrationError};
pub use pool::{create_pool, DbConn, DbPool, DbRuntimeSettings, PoolError};
pub use posts::{
    get_post, get_post_by_hash, has_article, insert_post, list_posts_in_newsgroup, list_replies,
};
pub use schema::{verify_schema, SchemaError};
pub use target::{DbTarget, UrlError};
