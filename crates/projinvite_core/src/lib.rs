//! Core invitation workflow for ProjInvite.
//! This crate is the single source of truth for assignment invariants.

pub mod client;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use client::manage_api::{
    InvitationApi, InvitationError, InvitationResponse, ManageApiClient,
};
pub use config::{resolve_config_path, AppConfig, ConfigError, ManageToken, StorageConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::assignment::Assignment;
pub use model::project::{Project, ProjectId};
pub use repo::file_invite_repo::FileInviteRepository;
pub use repo::invite_repo::{InviteRepository, InviteSession, RepoError, RepoResult, StoreFault};
pub use repo::sqlite_invite_repo::SqliteInviteRepository;
pub use service::assignment_selector::{is_already_assigned, pick_next_project};
pub use service::invite_service::{InviteReceipt, InviteService, SubmitError};

/// Storage backend chosen at startup.
pub type DynInviteRepository = Box<dyn InviteRepository + Send + Sync>;

/// Service wired from `AppConfig`.
pub type ConfiguredInviteService = InviteService<DynInviteRepository, ManageApiClient>;

/// Opens the backend described by `storage`.
pub fn open_repository(storage: &StorageConfig) -> RepoResult<DynInviteRepository> {
    match storage {
        StorageConfig::Sqlite { path } => Ok(Box::new(SqliteInviteRepository::open(path)?)),
        StorageConfig::Files { dir } => {
            if !dir.is_dir() {
                return Err(RepoError::unavailable(StoreFault::InvalidData(format!(
                    "data directory `{}` does not exist",
                    dir.display()
                ))));
            }
            Ok(Box::new(FileInviteRepository::new(dir.clone())))
        }
    }
}

/// Startup wiring failures.
#[derive(Debug)]
pub enum StartupError {
    Repo(RepoError),
    Client(InvitationError),
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Client(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Client(err) => Some(err),
        }
    }
}

/// Builds the submission service from loaded configuration.
pub fn build_service(config: &AppConfig) -> Result<ConfiguredInviteService, StartupError> {
    let repo = open_repository(&config.storage).map_err(StartupError::Repo)?;
    let api = ManageApiClient::from_config(config).map_err(StartupError::Client)?;
    Ok(InviteService::new(repo, api))
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, open_repository, StorageConfig};

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn open_repository_rejects_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig::Files {
            dir: dir.path().join("missing"),
        };
        assert!(open_repository(&storage).is_err());
    }
}
