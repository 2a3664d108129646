//! Connection setup for the blog store.
//!
//! Callers get a `rusqlite::Connection` from one of the `open_*` functions
//! and hand it to [`crate::repo::blog_repo::SqliteBlogRepository`]. The
//! `blogs` schema is created or upgraded before the connection is returned,
//! and its version lives in `PRAGMA user_version`.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_with_options};

pub type DbResult<T> = Result<T, DbError>;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Failure while opening, configuring or migrating a blog database.
#[derive(Debug)]
pub enum DbError {
    /// Driver error from SQLite, passed through untouched.
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build with a later `blogs` schema.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "blog database is at schema version {db_version}, this build only knows up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Connection settings for [`open_db_with_options`].
///
/// Deserializable so host applications can embed it in their own config
/// files; every field falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbOptions {
    /// Database file. `None` opens a private in-memory database.
    pub path: Option<PathBuf>,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// Emits every executed statement at `trace` level, with text literals
    /// such as titles and content replaced by `?`.
    pub log_statements: bool,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log_statements: false,
        }
    }
}

impl DbOptions {
    /// Options for a file-backed database with default tuning.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }
}
