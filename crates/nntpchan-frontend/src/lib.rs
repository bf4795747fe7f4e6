//! Startup plumbing for the nntpchan web frontend: configuration and
//! logging, plus the `nntpchan-migrate` binary that prepares the database.

pub mod config;

use tracing_subscriber::EnvFilter;

pub use config::{load_config, Config, ConfigError};

/// Installs the global tracing subscriber described by `logging`.
///
/// An unparseable level falls back to `info`.
pub fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Opens the configured database, applying pending migrations.
///
/// # Errors
///
/// Returns the `DbError` from [`nntpchan_db::Database::open`].
pub fn open_database(config: &Config) -> Result<nntpchan_db::Database, nntpchan_db::DbError> {
    nntpchan_db::Database::open(&config.db_url, config.database.runtime_settings())
}
