//! Frontend configuration loading from file and environment variables.

use nntpchan_db::DbRuntimeSettings;
use serde::Deserialize;
use thiserror::Error;

/// Top-level frontend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database URL, e.g. `sqlite:///var/lib/nntpchan/frontend.db`.
    #[serde(default = "default_db_url")]
    pub db_url: String,

    /// Connection pool tunables.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "nntpchan_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_db_url() -> String {
    "sqlite://nntpchan-frontend.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DbRuntimeSettings::default().busy_timeout_ms
}

fn default_pool_max_size() -> u32 {
    DbRuntimeSettings::default().pool_max_size
}

fn default_connect_timeout_ms() -> u64 {
    DbRuntimeSettings::default().connect_timeout_ms
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_url: default_db_url(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    /// Converts to the settings the pool is built with.
    pub fn runtime_settings(&self) -> DbRuntimeSettings {
        DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
            connect_timeout_ms: self.connect_timeout_ms,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `NNTPCHAN_DB_URL` overrides `db_url`
/// - `NNTPCHAN_DB_POOL_MAX_SIZE` overrides `database.pool_max_size`
/// - `NNTPCHAN_DB_BUSY_TIMEOUT_MS` overrides `database.busy_timeout_ms`
/// - `NNTPCHAN_DB_CONNECT_TIMEOUT_MS` overrides `database.connect_timeout_ms`
/// - `NNTPCHAN_LOG_LEVEL` overrides `logging.level`
/// - `NNTPCHAN_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies `NNTPCHAN_*` overrides read through `lookup`.
///
/// Numeric values that fail to parse are ignored.
fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("NNTPCHAN_DB_URL") {
        config.db_url = url;
    }
    if let Some(size) = lookup("NNTPCHAN_DB_POOL_MAX_SIZE") {
        if let Ok(parsed) = size.parse() {
            config.database.pool_max_size = parsed;
        }
    }
    if let Some(timeout) = lookup("NNTPCHAN_DB_BUSY_TIMEOUT_MS") {
        if let Ok(parsed) = timeout.parse() {
            config.database.busy_timeout_ms = parsed;
        }
    }
    if let Some(timeout) = lookup("NNTPCHAN_DB_CONNECT_TIMEOUT_MS") {
        if let Ok(parsed) = timeout.parse() {
            config.database.connect_timeout_ms = parsed;
        }
    }
    if let Some(level) = lookup("NNTPCHAN_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("NNTPCHAN_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).expect("missing file is not an error");
        assert!(config.db_url.starts_with("sqlite://"));
        assert_eq!(config.database.pool_max_size, 8);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn reads_db_url_and_tunables() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"
db_url = "sqlite:///srv/nntpchan/frontend.db"

[database]
pool_max_size = 2

[logging]
json = true
"#
        )
        .expect("write config");

        let config = load_config(file.path().to_str()).expect("should parse");
        assert_eq!(config.db_url, "sqlite:///srv/nntpchan/frontend.db");
        assert_eq!(config.database.pool_max_size, 2);
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert!(config.logging.json);

        let settings = config.database.runtime_settings();
        assert_eq!(settings.pool_max_size, 2);
        assert_eq!(settings.connect_timeout_ms, 5_000);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "db_url = [").expect("write config");
        let err = load_config(file.path().to_str()).expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("NNTPCHAN_DB_URL", "sqlite::memory:"),
            ("NNTPCHAN_DB_POOL_MAX_SIZE", "not-a-number"),
            ("NNTPCHAN_DB_BUSY_TIMEOUT_MS", "750"),
            ("NNTPCHAN_DB_CONNECT_TIMEOUT_MS", "1500"),
            ("NNTPCHAN_LOG_JSON", "1"),
        ]);

        let mut config = Config::default();
        apply_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.db_url, "sqlite::memory:");
        assert_eq!(config.database.pool_max_size, 8, "bad numbers are ignored");
        assert_eq!(config.database.busy_timeout_ms, 750);
        assert_eq!(config.database.connect_timeout_ms, 1_500);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }
}
