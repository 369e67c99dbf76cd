//! Project slot model.
//!
//! # Invariants
//! - Projects are seeded outside this system and never mutated here.
//! - `ProjectId` keeps the identifier exactly as stored; integer ids from
//!   storage are rendered in decimal.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier of one consumable project slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawProjectId", into = "String")]
pub struct ProjectId(String);

/// Rejected project identifier input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyProjectId;

impl Display for EmptyProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "project id cannot be empty")
    }
}

impl Error for EmptyProjectId {}

impl ProjectId {
    /// Builds an identifier, rejecting empty or whitespace-only values.
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyProjectId> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(EmptyProjectId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ProjectId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<ProjectId> for String {
    fn from(value: ProjectId) -> Self {
        value.0
    }
}

/// Storage-side shape of a project id: text or integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawProjectId {
    Int(i64),
    Text(String),
}

impl TryFrom<RawProjectId> for ProjectId {
    type Error = EmptyProjectId;

    fn try_from(value: RawProjectId) -> Result<Self, Self::Error> {
        match value {
            RawProjectId::Int(id) => Ok(Self::from(id)),
            RawProjectId::Text(text) => Self::new(text),
        }
    }
}

/// One project slot that can be handed to at most one email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
}

impl Project {
    pub fn new(id: ProjectId) -> Self {
        Self { id }
    }
}
