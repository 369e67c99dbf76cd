//! SQLite-backed invitation store.
//!
//! # Responsibility
//! - Read `projects` and `assignments` in insertion order.
//! - Serialize submissions with an in-process mutex plus `BEGIN IMMEDIATE`,
//!   which takes SQLite's database-wide write lock for other processes.
//!
//! # Invariants
//! - A session owns exactly one open transaction until it appends or drops.
//! - Dropping an unfinished session rolls the transaction back.

use crate::db::{open_db, open_db_in_memory};
use crate::model::assignment::Assignment;
use crate::model::project::{Project, ProjectId};
use crate::repo::invite_repo::{
    InviteRepository, InviteSession, RepoError, RepoResult, StoreFault,
};
use log::warn;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Invitation store backed by one SQLite connection.
pub struct SqliteInviteRepository {
    conn: Mutex<Connection>,
}

impl SqliteInviteRepository {
    /// Wraps an already migrated connection (see `crate::db::open_db`).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let conn = open_db(path).map_err(RepoError::unavailable)?;
        Ok(Self::new(conn))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        let conn = open_db_in_memory().map_err(RepoError::unavailable)?;
        Ok(Self::new(conn))
    }

    /// Runs `f` against the raw connection outside of any session.
    ///
    /// Used by provisioning and diagnostics; submission code goes through
    /// `begin` instead.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }
}

impl InviteRepository for SqliteInviteRepository {
    fn begin(&self) -> RepoResult<Box<dyn InviteSession + '_>> {
        // A poisoned guard still owns a usable connection; any transaction
        // left behind by the panicking holder was rolled back on its drop.
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute_batch("BEGIN IMMEDIATE;")
            .map_err(RepoError::unavailable)?;
        Ok(Box::new(SqliteInviteSession {
            conn,
            in_transaction: true,
        }))
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

struct SqliteInviteSession<'repo> {
    conn: MutexGuard<'repo, Connection>,
    in_transaction: bool,
}

impl InviteSession for SqliteInviteSession<'_> {
    fn load_projects(&mut self) -> RepoResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM projects ORDER BY rowid ASC;")
            .map_err(RepoError::unavailable)?;
        let mut rows = stmt.query([]).map_err(RepoError::unavailable)?;
        let mut projects = Vec::new();

        while let Some(row) = rows.next().map_err(RepoError::unavailable)? {
            let value = row.get_ref(0).map_err(RepoError::unavailable)?;
            let id = parse_project_id(value)
                .map_err(RepoError::unavailable)?
                .ok_or_else(|| {
                    RepoError::unavailable(StoreFault::InvalidData(
                        "empty project id in projects.id".to_string(),
                    ))
                })?;
            projects.push(Project::new(id));
        }

        Ok(projects)
    }

    fn load_assignments(&mut self) -> RepoResult<Vec<Assignment>> {
        let mut stmt = self
            .conn
            .prepare("SELECT email, project_id FROM assignments ORDER BY rowid ASC;")
            .map_err(RepoError::unavailable)?;
        let mut rows = stmt.query([]).map_err(RepoError::unavailable)?;
        let mut assignments = Vec::new();

        while let Some(row) = rows.next().map_err(RepoError::unavailable)? {
            let email: String = row.get(0).map_err(RepoError::unavailable)?;
            let value = row.get_ref(1).map_err(RepoError::unavailable)?;
            let project_id = parse_project_id(value).map_err(RepoError::unavailable)?;
            assignments.push(Assignment { email, project_id });
        }

        Ok(assignments)
    }

    fn append_assignment(&mut self, email: &str, project_id: &ProjectId) -> RepoResult<()> {
        if !self.in_transaction {
            return Err(RepoError::write(StoreFault::InvalidData(
                "session already committed".to_string(),
            )));
        }

        self.conn
            .execute(
                "INSERT INTO assignments (email, project_id) VALUES (?1, ?2);",
                params![email, project_id.as_str()],
            )
            .map_err(RepoError::write)?;
        self.conn
            .execute_batch("COMMIT;")
            .map_err(RepoError::write)?;
        self.in_transaction = false;
        Ok(())
    }
}

impl Drop for SqliteInviteSession<'_> {
    fn drop(&mut self) {
        if !self.in_transaction {
            return;
        }
        if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
            warn!("event=session_rollback module=repo status=error backend=sqlite error={err}");
        }
    }
}

fn parse_project_id(value: ValueRef<'_>) -> Result<Option<ProjectId>, StoreFault> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(id) => Ok(Some(ProjectId::from(id))),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|_| {
                StoreFault::InvalidData("project id is not valid UTF-8".to_string())
            })?;
            Ok(ProjectId::new(text).ok())
        }
        other => Err(StoreFault::InvalidData(format!(
            "unsupported project id column type `{:?}`",
            other.data_type()
        ))),
    }
}
