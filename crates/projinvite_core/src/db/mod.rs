//! SQLite storage for the project and assignment relations.
//!
//! # Responsibility
//! - Open connections configured for the invitation workflow.
//! - Keep the on-disk schema at the version this binary understands.
//!
//! # Invariants
//! - Connections handed out have migrations applied and the schema verified.
//! - A database written by a newer binary is refused, not downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or preparing the invitation database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// `user_version` is ahead of every migration this binary ships.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A table or index the workflow depends on is absent.
    MissingSchemaObject {
        kind: &'static str,
        name: &'static str,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "invitation schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::MissingSchemaObject { kind, name } => {
                write!(f, "invitation schema is missing {kind} `{name}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
