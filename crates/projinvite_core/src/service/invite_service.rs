//! Invitation submission workflow.
//!
//! # Responsibility
//! - Validate the email, then run load, check, select, invite and persist
//!   under one storage session.
//! - Map each terminal outcome to a user-facing message.
//!
//! # Invariants
//! - No storage access happens for invalid input.
//! - The storage lock spans the external invitation call, so two concurrent
//!   submissions can never pick the same project.
//! - Storage is mutated only after the invitation call succeeded.
//! - An invitation that was sent but not recorded is reported as
//!   `PersistFailed`, never swallowed.

use crate::client::manage_api::{InvitationApi, InvitationError};
use crate::model::project::ProjectId;
use crate::repo::invite_repo::{InviteRepository, RepoError};
use crate::service::assignment_selector::{is_already_assigned, pick_next_project};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Successful submission result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteReceipt {
    pub email: String,
    pub project_id: ProjectId,
    /// Raw body returned by the invitation endpoint, if any.
    pub response_body: Option<String>,
}

impl InviteReceipt {
    pub fn user_message(&self) -> String {
        format!(
            "Invited! Check your mailbox. You are assigned to project ID: {}",
            self.project_id
        )
    }
}

/// Terminal failure of one submission.
#[derive(Debug)]
pub enum SubmitError {
    /// Email is empty after trimming.
    InvalidInput,
    /// Email already holds a project.
    AlreadyInvited,
    /// Every project is consumed.
    NoProjectsAvailable,
    /// Storage could not be locked or loaded.
    Storage(RepoError),
    /// Endpoint answered with a non-success status.
    InvitationRejected { status: u16, body: Option<String> },
    /// Endpoint could not be reached.
    InvitationTransport(InvitationError),
    /// Invitation was sent but the assignment could not be recorded.
    PersistFailed {
        project_id: ProjectId,
        source: RepoError,
    },
}

impl SubmitError {
    /// Stable machine-readable code for envelopes and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::AlreadyInvited => "already_invited",
            Self::NoProjectsAvailable => "no_projects_available",
            Self::Storage(_) => "storage_error",
            Self::InvitationRejected { .. } | Self::InvitationTransport(_) => "invitation_failed",
            Self::PersistFailed { .. } => "persist_failed",
        }
    }

    /// Text shown to the person who submitted the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput => "Please enter a valid email address.".to_string(),
            Self::AlreadyInvited => "This email has already been invited to a project.".to_string(),
            Self::NoProjectsAvailable => "No projects available for invitations.".to_string(),
            Self::Storage(_) => {
                "Invitation data is currently unavailable. Please try again later.".to_string()
            }
            Self::InvitationRejected { status, body } => format!(
                "Failed to invite. Error: {}",
                body.as_deref()
                    .filter(|text| !text.trim().is_empty())
                    .map_or_else(|| format!("HTTP {status}"), str::to_string)
            ),
            Self::InvitationTransport(err) => format!("Failed to invite. Error: {err}"),
            Self::PersistFailed { project_id, .. } => format!(
                "The invitation for project ID {project_id} was sent, but it could not be \
                 recorded. Please contact an administrator before submitting again."
            ),
        }
    }
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "email is empty"),
            Self::AlreadyInvited => write!(f, "email already invited"),
            Self::NoProjectsAvailable => write!(f, "no projects available"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::InvitationRejected { status, .. } => {
                write!(f, "invitation rejected with HTTP status {status}")
            }
            Self::InvitationTransport(err) => write!(f, "{err}"),
            Self::PersistFailed { project_id, source } => write!(
                f,
                "invitation sent for project {project_id} but not recorded: {source}"
            ),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::InvitationTransport(err) => Some(err),
            Self::PersistFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Submission use-case over a storage backend and an invitation boundary.
pub struct InviteService<R: InviteRepository, A: InvitationApi> {
    repo: R,
    api: A,
}

impl<R: InviteRepository, A: InvitationApi> InviteService<R, A> {
    pub fn new(repo: R, api: A) -> Self {
        Self { repo, api }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Runs one submission end to end.
    pub fn submit(&self, email: &str) -> Result<InviteReceipt, SubmitError> {
        let request_id = Uuid::new_v4();
        let email = normalize_email(email).ok_or_else(|| {
            info!("event=invite_submit module=service status=rejected request_id={request_id} reason=invalid_input");
            SubmitError::InvalidInput
        })?;

        let result = self.run_locked(request_id, email);
        match &result {
            Ok(receipt) => info!(
                "event=invite_submit module=service status=ok request_id={} email={} project_id={}",
                request_id,
                mask_email(email),
                receipt.project_id
            ),
            Err(err @ SubmitError::PersistFailed { project_id, .. }) => error!(
                "event=invite_submit module=service status=error request_id={} email={} project_id={} reconcile_required=true error={}",
                request_id,
                mask_email(email),
                project_id,
                err
            ),
            Err(err) => warn!(
                "event=invite_submit module=service status=failed request_id={} email={} code={} error={}",
                request_id,
                mask_email(email),
                err.code(),
                err
            ),
        }
        result
    }

    fn run_locked(&self, request_id: Uuid, email: &str) -> Result<InviteReceipt, SubmitError> {
        let mut session = self.repo.begin().map_err(SubmitError::Storage)?;
        let projects = session.load_projects().map_err(SubmitError::Storage)?;
        let assignments = session.load_assignments().map_err(SubmitError::Storage)?;

        if is_already_assigned(email, &assignments) {
            return Err(SubmitError::AlreadyInvited);
        }

        let project_id = pick_next_project(&projects, &assignments)
            .cloned()
            .ok_or(SubmitError::NoProjectsAvailable)?;
        info!(
            "event=project_selected module=service status=ok request_id={} backend={} project_id={} projects_total={} assignments_total={}",
            request_id,
            self.repo.backend(),
            project_id,
            projects.len(),
            assignments.len()
        );

        let response = self
            .api
            .invite(email, &project_id)
            .map_err(SubmitError::InvitationTransport)?;
        if !response.is_success() {
            return Err(SubmitError::InvitationRejected {
                status: response.status,
                body: response.body,
            });
        }

        session
            .append_assignment(email, &project_id)
            .map_err(|source| SubmitError::PersistFailed {
                project_id: project_id.clone(),
                source,
            })?;

        Ok(InviteReceipt {
            email: email.to_string(),
            project_id,
            response_body: response.body,
        })
    }
}

/// Trims the raw form value; `None` when nothing is left.
pub fn normalize_email(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Masks the local part of an email for log lines.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}
