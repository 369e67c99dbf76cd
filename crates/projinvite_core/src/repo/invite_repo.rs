//! Invitation storage contract shared by every backend.
//!
//! # Responsibility
//! - Define the session-scoped read/append API used by the orchestrator.
//! - Classify failures into "storage unavailable" and "write failed".

use crate::db::DbError;
use crate::model::assignment::Assignment;
use crate::model::project::{Project, ProjectId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Underlying cause of a storage failure.
#[derive(Debug)]
pub enum StoreFault {
    Db(DbError),
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidData(String),
}

impl Display for StoreFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for StoreFault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreFault {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreFault {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for StoreFault {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreFault {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Storage accessor error.
#[derive(Debug)]
pub enum RepoError {
    /// The store could not be locked, reached, or parsed.
    Unavailable(StoreFault),
    /// Appending an assignment failed; existing records are untouched.
    Write(StoreFault),
}

impl RepoError {
    pub fn unavailable(fault: impl Into<StoreFault>) -> Self {
        Self::Unavailable(fault.into())
    }

    pub fn write(fault: impl Into<StoreFault>) -> Self {
        Self::Write(fault.into())
    }

    pub fn fault(&self) -> &StoreFault {
        match self {
            Self::Unavailable(fault) | Self::Write(fault) => fault,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(fault) => write!(f, "invitation storage unavailable: {fault}"),
            Self::Write(fault) => write!(f, "invitation storage write failed: {fault}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.fault())
    }
}

/// Exclusive access to the invitation store for one submission.
///
/// The storage lock is held from `InviteRepository::begin` until this value
/// is dropped, on success and error paths alike.
pub trait InviteSession {
    /// Loads every project in storage order.
    fn load_projects(&mut self) -> RepoResult<Vec<Project>>;

    /// Loads every assignment in storage order.
    fn load_assignments(&mut self) -> RepoResult<Vec<Assignment>>;

    /// Durably appends one assignment.
    ///
    /// Either the record is fully written or existing records are unchanged.
    fn append_assignment(&mut self, email: &str, project_id: &ProjectId) -> RepoResult<()>;
}

/// Backend-agnostic invitation store.
pub trait InviteRepository {
    /// Acquires the storage lock, blocking until it is available.
    fn begin(&self) -> RepoResult<Box<dyn InviteSession + '_>>;

    /// Returns a short backend label for diagnostics.
    fn backend(&self) -> &'static str;

    fn load_projects(&self) -> RepoResult<Vec<Project>> {
        self.begin()?.load_projects()
    }

    fn load_assignments(&self) -> RepoResult<Vec<Assignment>> {
        self.begin()?.load_assignments()
    }

    fn append_assignment(&self, email: &str, project_id: &ProjectId) -> RepoResult<()> {
        self.begin()?.append_assignment(email, project_id)
    }
}

impl<T: InviteRepository + ?Sized> InviteRepository for Box<T> {
    fn begin(&self) -> RepoResult<Box<dyn InviteSession + '_>> {
        (**self).begin()
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}

impl<T: InviteRepository + ?Sized> InviteRepository for std::sync::Arc<T> {
    fn begin(&self) -> RepoResult<Box<dyn InviteSession + '_>> {
        (**self).begin()
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}
