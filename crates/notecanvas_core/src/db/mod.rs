//! Note store bootstrap: where the database lives, how it is opened and
//! migrated, and what can go wrong on the way.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Nothing reads or writes notes before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{close_db, open_db, open_db_in_memory, open_target};

pub type DbResult<T> = Result<T, DbError>;

/// Backing storage for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    File(PathBuf),
    /// Private, empty database dropped with its connection.
    Memory,
}

impl DbTarget {
    /// Short label used in `mode=` log fields.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

impl Display for DbTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => f.write_str(":memory:"),
        }
    }
}

/// Note store bootstrap failure.
#[derive(Debug)]
pub enum DbError {
    /// SQLite could not open the target at all.
    Open {
        target: DbTarget,
        source: rusqlite::Error,
    },
    /// SQLite refused to release the connection.
    Close(rusqlite::Error),
    /// The file was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => {
                write!(f, "failed to open note store `{target}`: {source}")
            }
            Self::Close(err) => write!(f, "failed to close note store: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "note store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Close(err) | Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{DbError, DbTarget};
    use std::error::Error;
    use std::path::PathBuf;

    #[test]
    fn target_labels_and_display() {
        let file = DbTarget::File(PathBuf::from("/data/notes.sqlite3"));
        assert_eq!(file.mode(), "file");
        assert_eq!(file.to_string(), "/data/notes.sqlite3");
        assert_eq!(DbTarget::Memory.mode(), "memory");
        assert_eq!(DbTarget::Memory.to_string(), ":memory:");
    }

    #[test]
    fn open_error_names_target_and_keeps_source() {
        let err = DbError::Open {
            target: DbTarget::File(PathBuf::from("/nowhere/notes.sqlite3")),
            source: rusqlite::Error::InvalidQuery,
        };
        assert!(err.to_string().contains("`/nowhere/notes.sqlite3`"));
        assert!(err.source().is_some());

        let future = DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 2,
        };
        assert!(future.source().is_none());
        assert!(future.to_string().contains("9 is newer than supported 2"));
    }
}
