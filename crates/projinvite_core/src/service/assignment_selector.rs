//! Pure selection rules over loaded projects and assignments.
//!
//! # Invariants
//! - Email comparison is exact and case-sensitive.
//! - Only assignments with a set project count as consuming that project.
//! - Candidates are considered in project load order.

use crate::model::assignment::Assignment;
use crate::model::project::{Project, ProjectId};
use std::collections::HashSet;

/// Returns whether `email` already holds a project.
pub fn is_already_assigned(email: &str, assignments: &[Assignment]) -> bool {
    assignments
        .iter()
        .any(|row| row.email == email && row.assigned_project().is_some())
}

/// Returns the first project not consumed by any assignment.
pub fn pick_next_project<'p>(
    projects: &'p [Project],
    assignments: &[Assignment],
) -> Option<&'p ProjectId> {
    let consumed: HashSet<&ProjectId> = assignments
        .iter()
        .filter_map(Assignment::assigned_project)
        .collect();

    projects
        .iter()
        .map(|project| &project.id)
        .find(|id| !consumed.contains(id))
}
