//! Parsing of the configured database URL.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    /// A SQLite database file. Created if it does not exist, but its parent
    /// directory must.
    File(PathBuf),

    /// A private in-memory database shared by every connection of one pool.
    ///
    /// `name` is unique per parse, so two pools never see each other's data.
    Memory { name: String },
}

/// Errors produced when a database URL cannot be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    /// The URL was empty or only whitespace.
    #[error("database url is empty")]
    Empty,

    /// A `sqlite:` URL without a path.
    #[error("database url '{0}' has no path")]
    MissingPath(String),

    /// A URL naming a backend other than SQLite, e.g. `postgres://`.
    ///
    /// Only SQLite deployments are supported; a PostgreSQL database has to be
    /// exported to a SQLite file first.
    #[error("unsupported database scheme '{0}', only sqlite is supported")]
    UnsupportedScheme(String),
}

impl DbTarget {
    /// Parses a database URL.
    ///
    /// Accepted forms:
    /// - `:memory:`, `sqlite::memory:`, `sqlite://:memory:`
    /// - `sqlite://<path>` and `sqlite:<path>`; `sqlite:///abs/file.db` is absolute
    /// - a bare filesystem path
    ///
    /// # Errors
    ///
    /// Returns `UrlError` for empty input, a `sqlite:` URL without a path, or
    /// any other `<scheme>://` URL.
    pub fn parse(url: &str) -> Result<Self, UrlError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(UrlError::Empty);
        }

        let rest = if let Some(rest) = url.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = url.strip_prefix("sqlite:") {
            rest
        } else if let Some((scheme, _)) = url.split_once("://") {
            return Err(UrlError::UnsupportedScheme(scheme.to_string()));
        } else {
            url
        };

        if rest.is_empty() {
            return Err(UrlError::MissingPath(url.to_string()));
        }

        if rest == ":memory:" {
            return Ok(Self::Memory {
                name: format!("nntpchan-{}", Uuid::new_v4().simple()),
            });
        }

        Ok(Self::File(PathBuf::from(rest)))
    }

    /// Returns the string handed to SQLite when opening a connection.
    ///
    /// In-memory targets use a shared-cache URI so that all pooled
    /// connections open the same database.
    pub(crate) fn open_string(&self) -> String {
        match self {
            Self::File(path) => path.to_string_lossy().into_owned(),
            Self::Memory { name } => format!("file:{name}?mode=memory&cache=shared"),
        }
    }

    /// Returns `true` for in-memory targets.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory { .. })
    }
}

impl fmt::Display for DbTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "sqlite://{}", path.display()),
            Self::Memory { .. } => f.write_str("sqlite::memory:"),
        }
    }
}
