//! Flat-file invitation store.
//!
//! # Responsibility
//! - Keep `projects.json` and `assignments.json` in one data directory.
//! - Serialize submissions across threads and processes with an advisory
//!   lock on `invites.lock`.
//!
//! # Invariants
//! - `assignments.json` is only ever replaced by an atomic rename of a fully
//!   written and fsynced temp file from the same directory, followed by an
//!   fsync of the directory itself on unix.
//! - A missing `assignments.json` reads as "no assignments yet"; a missing
//!   `projects.json` is an unavailable store.

use crate::model::assignment::Assignment;
use crate::model::project::{Project, ProjectId};
use crate::repo::invite_repo::{
    InviteRepository, InviteSession, RepoError, RepoResult, StoreFault,
};
use fs2::FileExt;
use log::warn;
use serde::de::DeserializeOwned;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;

pub const PROJECTS_FILE_NAME: &str = "projects.json";
pub const ASSIGNMENTS_FILE_NAME: &str = "assignments.json";
pub const LOCK_FILE_NAME: &str = "invites.lock";

/// Invitation store backed by JSON files in one directory.
pub struct FileInviteRepository {
    dir: PathBuf,
    // fs2 locks are per open file description; the mutex keeps threads of
    // this process from racing between opening and locking the lock file.
    local: Mutex<()>,
}

impl FileInviteRepository {
    /// Uses `dir` as the data directory. The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            local: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    pub fn projects_path(&self) -> PathBuf {
        self.dir.join(PROJECTS_FILE_NAME)
    }

    pub fn assignments_path(&self) -> PathBuf {
        self.dir.join(ASSIGNMENTS_FILE_NAME)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE_NAME)
    }
}

impl InviteRepository for FileInviteRepository {
    fn begin(&self) -> RepoResult<Box<dyn InviteSession + '_>> {
        let local = self.local.lock().unwrap_or_else(PoisonError::into_inner);
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())
            .map_err(RepoError::unavailable)?;
        FileExt::lock_exclusive(&lock_file).map_err(RepoError::unavailable)?;

        Ok(Box::new(FileInviteSession {
            repo: self,
            lock_file,
            _local: local,
        }))
    }

    fn backend(&self) -> &'static str {
        "files"
    }
}

struct FileInviteSession<'repo> {
    repo: &'repo FileInviteRepository,
    lock_file: File,
    _local: MutexGuard<'repo, ()>,
}

impl FileInviteSession<'_> {
    fn read_assignments(&self) -> Result<Vec<Assignment>, StoreFault> {
        match read_json::<Vec<Assignment>>(&self.repo.assignments_path()) {
            Ok(rows) => Ok(rows),
            Err(StoreFault::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(fault) => Err(fault),
        }
    }
}

impl InviteSession for FileInviteSession<'_> {
    fn load_projects(&mut self) -> RepoResult<Vec<Project>> {
        read_json::<Vec<Project>>(&self.repo.projects_path()).map_err(RepoError::Unavailable)
    }

    fn load_assignments(&mut self) -> RepoResult<Vec<Assignment>> {
        self.read_assignments().map_err(RepoError::Unavailable)
    }

    fn append_assignment(&mut self, email: &str, project_id: &ProjectId) -> RepoResult<()> {
        let mut rows = self.read_assignments().map_err(RepoError::Write)?;
        rows.push(Assignment::new(email, project_id.clone()));
        replace_json(self.repo.dir(), &self.repo.assignments_path(), &rows)
            .map_err(RepoError::Write)
    }
}

impl Drop for FileInviteSession<'_> {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.lock_file) {
            warn!("event=session_unlock module=repo status=error backend=files error={err}");
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreFault> {
    let file = File::open(path)?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    Ok(value)
}

fn replace_json<T: serde::Serialize>(dir: &Path, path: &Path, value: &T) -> Result<(), StoreFault> {
    let mut temp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(temp.as_file_mut(), value)?;
    temp.as_file_mut().write_all(b"\n")?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| StoreFault::Io(err.error))?;
    sync_dir(dir)?;
    Ok(())
}

/// Flushes the directory entry so the rename survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), StoreFault> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), StoreFault> {
    Ok(())
}
