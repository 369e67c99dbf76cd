//! Email-to-project assignment model.
//!
//! # Invariants
//! - Created once per successfully invited email and never mutated.
//! - `project_id = None` means the row does not consume a project.

use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};

/// Durable record binding one email to the project it was invited to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_optional_project")]
    pub project_id: Option<ProjectId>,
}

impl Assignment {
    pub fn new(email: impl Into<String>, project_id: ProjectId) -> Self {
        Self {
            email: email.into(),
            project_id: Some(project_id),
        }
    }

    /// Creates a placeholder row without a project.
    pub fn unassigned(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            project_id: None,
        }
    }

    /// Returns the consumed project, if any.
    pub fn assigned_project(&self) -> Option<&ProjectId> {
        self.project_id.as_ref()
    }
}

// Empty strings and nulls in the project column both mean "not assigned".
fn deserialize_optional_project<'de, D>(deserializer: D) -> Result<Option<ProjectId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => ProjectId::deserialize(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
