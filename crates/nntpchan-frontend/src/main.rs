//! `nntpchan-migrate`: creates or updates the frontend database schema.
//!
//! Usage: `nntpchan-migrate [config-path]`. Exits non-zero if the database
//! cannot be opened or its schema cannot be brought up to date.

use std::process::ExitCode;

use nntpchan_frontend::{init_tracing, load_config, open_database};

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("NNTPCHAN_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn main() -> ExitCode {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = match load_config(selected_config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    match open_database(&config) {
        Ok(db) => {
            tracing::info!(db = %db.target(), "frontend database is up to date");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to prepare frontend database");
            ExitCode::FAILURE
        }
    }
}
