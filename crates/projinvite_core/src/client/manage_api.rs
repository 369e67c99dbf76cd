//! Management API invitation client.
//!
//! # Invariants
//! - Request shape: `POST {base}/{project_id}/invitations` with the token
//!   header and a fixed role and expiration.
//! - Success is exactly status 200, 201 or 204.
//! - Transport failures are reported separately from non-success statuses.
//! - Once a status line arrived, the call is never turned into a transport
//!   failure; a body that cannot be read is dropped.

use crate::config::{AppConfig, ManageToken};
use crate::model::project::ProjectId;
use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub const MANAGE_TOKEN_HEADER: &str = "X-KBC-ManageApiToken";
pub const INVITATION_ROLE: &str = "admin";
pub const INVITATION_EXPIRATION_SECONDS: u64 = 1_210_000;

const SUCCESS_STATUSES: [u16; 3] = [200, 201, 204];

/// Invitation client errors.
#[derive(Debug)]
pub enum InvitationError {
    /// The configured base URL cannot carry a project path.
    InvalidBaseUrl(String),
    /// The HTTP client could not be constructed.
    Client(reqwest::Error),
    /// The request never produced a response (DNS, connect, TLS, read).
    Transport(reqwest::Error),
}

impl Display for InvitationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => write!(f, "invalid invitation API base URL `{value}`"),
            Self::Client(err) => write!(f, "failed to build invitation client: {err}"),
            Self::Transport(err) => write!(f, "invitation request failed: {err}"),
        }
    }
}

impl Error for InvitationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidBaseUrl(_) => None,
            Self::Client(err) | Self::Transport(err) => Some(err),
        }
    }
}

/// Raw outcome of one invitation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationResponse {
    pub status: u16,
    /// Response body text, passed through unparsed. `None` for 204.
    pub body: Option<String>,
}

impl InvitationResponse {
    pub fn is_success(&self) -> bool {
        SUCCESS_STATUSES.contains(&self.status)
    }

    /// Body text for display, empty when the response carried none.
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

/// Boundary that grants a project to an email.
pub trait InvitationApi {
    fn invite(
        &self,
        email: &str,
        project_id: &ProjectId,
    ) -> Result<InvitationResponse, InvitationError>;
}

impl<T: InvitationApi + ?Sized> InvitationApi for Box<T> {
    fn invite(
        &self,
        email: &str,
        project_id: &ProjectId,
    ) -> Result<InvitationResponse, InvitationError> {
        (**self).invite(email, project_id)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvitationPayload<'a> {
    email: &'a str,
    role: &'static str,
    expiration_seconds: u64,
}

/// Blocking HTTP client for the management API.
pub struct ManageApiClient {
    http: Client,
    base_url: Url,
    token: ManageToken,
}

impl ManageApiClient {
    pub fn new(base_url: &str, token: ManageToken) -> Result<Self, InvitationError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|_| InvitationError::InvalidBaseUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(InvitationError::InvalidBaseUrl(base_url.to_string()));
        }
        let http = Client::builder().build().map_err(InvitationError::Client)?;
        Ok(Self {
            http,
            base_url: parsed,
            token,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, InvitationError> {
        Self::new(&config.api_base_url, config.manage_token.clone())
    }

    /// Builds `{base}/{project_id}/invitations` with the id as one encoded segment.
    pub fn invitation_url(&self, project_id: &ProjectId) -> Result<Url, InvitationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| InvitationError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(project_id.as_str())
            .push("invitations");
        Ok(url)
    }
}

impl InvitationApi for ManageApiClient {
    fn invite(
        &self,
        email: &str,
        project_id: &ProjectId,
    ) -> Result<InvitationResponse, InvitationError> {
        let url = self.invitation_url(project_id)?;
        let payload = InvitationPayload {
            email,
            role: INVITATION_ROLE,
            expiration_seconds: INVITATION_EXPIRATION_SECONDS,
        };
        let started_at = Instant::now();

        let response = self
            .http
            .post(url)
            .header(MANAGE_TOKEN_HEADER, self.token.expose())
            .json(&payload)
            .send()
            .map_err(|err| {
                warn!(
                    "event=invitation_call module=client status=error project_id={} duration_ms={} error={}",
                    project_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                InvitationError::Transport(err)
            })?;

        let status = response.status();
        // The status decides the outcome; an unreadable body only loses detail.
        let body = if status == StatusCode::NO_CONTENT {
            None
        } else {
            match response.text() {
                Ok(text) => Some(text),
                Err(err) => {
                    warn!(
                        "event=invitation_body module=client status=error project_id={} http_status={} error={}",
                        project_id,
                        status.as_u16(),
                        err
                    );
                    None
                }
            }
        };

        info!(
            "event=invitation_call module=client status=done project_id={} http_status={} duration_ms={}",
            project_id,
            status.as_u16(),
            started_at.elapsed().as_millis()
        );

        Ok(InvitationResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{InvitationResponse, ManageApiClient};
    use crate::config::ManageToken;
    use crate::model::project::ProjectId;

    #[test]
    fn success_statuses_are_exactly_200_201_204() {
        for status in [200, 201, 204] {
            assert!(InvitationResponse { status, body: None }.is_success());
        }
        for status in [202, 301, 400, 404, 500] {
            assert!(!InvitationResponse { status, body: None }.is_success());
        }
    }

    #[test]
    fn invitation_url_handles_trailing_slash_and_encodes_id() {
        let client =
            ManageApiClient::new("https://example.test/manage/projects/", ManageToken::new("t"))
                .unwrap();
        let url = client
            .invitation_url(&ProjectId::new("a b").unwrap())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/manage/projects/a%20b/invitations"
        );
    }

    #[test]
    fn rejects_non_base_url() {
        assert!(ManageApiClient::new("mailto:ops@example.test", ManageToken::new("t")).is_err());
        assert!(ManageApiClient::new("not a url", ManageToken::new("t")).is_err());
    }
}
