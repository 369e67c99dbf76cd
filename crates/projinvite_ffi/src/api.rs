//! FFI use-case API for the invitation form.
//!
//! # Responsibility
//! - Expose the single submit action to Dart via FRB.
//! - Load configuration once per process and reuse the wired service.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Invalid input is answered before configuration or storage is touched.

use log::error;
use projinvite_core::service::invite_service::normalize_email;
use projinvite_core::{
    build_service, core_version as core_version_inner, init_logging as init_logging_inner,
    AppConfig, ConfiguredInviteService, SubmitError,
};
use std::sync::OnceLock;

static SERVICE: OnceLock<Result<ConfiguredInviteService, String>> = OnceLock::new();

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Result envelope rendered under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteFormResponse {
    /// Whether the invitation was sent and recorded.
    pub ok: bool,
    /// Assigned project on success.
    pub project_id: Option<String>,
    /// Stable outcome code (`invited`, `invalid_input`, `already_invited`, ...).
    pub code: String,
    /// Human-readable text for the form.
    pub message: String,
}

impl InviteFormResponse {
    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            project_id: None,
            code: code.to_string(),
            message: message.into(),
        }
    }

    fn from_error(err: &SubmitError) -> Self {
        Self::failure(err.code(), err.user_message())
    }
}

/// Submits the email typed into the form.
///
/// # FFI contract
/// - Blocking call: holds the storage lock across one HTTP request, run it
///   off the UI thread.
/// - Never panics.
/// - Configuration is read from `PROJINVITE_CONFIG` (or `./projinvite.toml`)
///   on first use and never reloaded.
pub fn invite_submit(email: String) -> InviteFormResponse {
    if normalize_email(&email).is_none() {
        return InviteFormResponse::from_error(&SubmitError::InvalidInput);
    }

    let service = match SERVICE.get_or_init(load_service) {
        Ok(service) => service,
        Err(message) => {
            return InviteFormResponse::failure(
                "not_configured",
                format!("Invitation service is not configured: {message}"),
            );
        }
    };

    match service.submit(&email) {
        Ok(receipt) => InviteFormResponse {
            ok: true,
            project_id: Some(receipt.project_id.to_string()),
            code: "invited".to_string(),
            message: receipt.user_message(),
        },
        Err(err) => InviteFormResponse::from_error(&err),
    }
}

fn load_service() -> Result<ConfiguredInviteService, String> {
    let config = AppConfig::load_default().map_err(|err| {
        error!("event=service_init module=ffi status=error error_code=config_load_failed error={err}");
        err.to_string()
    })?;
    build_service(&config).map_err(|err| {
        error!("event=service_init module=ffi status=error error_code=wiring_failed error={err}");
        err.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::{core_version, init_logging, invite_submit};

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn invite_submit_rejects_blank_email_without_config() {
        let response = invite_submit("   ".to_string());
        assert!(!response.ok);
        assert_eq!(response.code, "invalid_input");
        assert_eq!(response.message, "Please enter a valid email address.");
        assert_eq!(response.project_id, None);
    }
}
