//! Flutter-facing bindings for the invitation form.

pub mod api;
