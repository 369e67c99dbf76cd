//! Outbound invitation boundary.
//!
//! # Responsibility
//! - Issue exactly one invitation request per call; no retry, no circuit
//!   breaking, transport-default timeout.
//! - Report the raw status and body so callers can display diagnostics.

pub mod manage_api;
