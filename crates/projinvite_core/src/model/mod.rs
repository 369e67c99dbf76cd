//! Domain model for project slots and email assignments.
//!
//! # Responsibility
//! - Define the records loaded from and written to invitation storage.
//!
//! # Invariants
//! - A `ProjectId` is never empty.
//! - An `Assignment` counts as consuming a project only when its project id
//!   is set and non-empty.

pub mod assignment;
pub mod project;
