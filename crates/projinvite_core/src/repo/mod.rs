//! Storage accessor contracts and backend implementations.
//!
//! # Responsibility
//! - Load the project and assignment relations in full.
//! - Append one assignment record durably.
//! - Provide the scoped mutual-exclusion guard that spans one submission.
//!
//! # Invariants
//! - Every read and write happens through an `InviteSession`, which holds the
//!   storage lock for its whole lifetime and releases it on drop.
//! - Read paths reject invalid persisted rows instead of masking them.

pub mod file_invite_repo;
pub mod invite_repo;
pub mod sqlite_invite_repo;
