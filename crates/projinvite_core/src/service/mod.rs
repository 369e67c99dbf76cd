//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate storage and invitation calls into the submission use-case.
//! - Keep presentation layers decoupled from storage and HTTP details.

pub mod assignment_selector;
pub mod invite_service;
