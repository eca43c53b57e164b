//! # TeamTask Shared Library
//!
//! Hierarchical authorization and assignment engine for the TeamTask API.
//!
//! ## Module Organization
//!
//! - `models`: Users, roles, tasks and their state machines
//! - `directory`: Read-only user lookups and boundary normalization
//! - `hierarchy`: Validation of role + reporting-link assignments, approval
//! - `assignment`: Who an actor may assign or reassign a task to
//! - `auth`: Tokens, request middleware and per-task permissions
//!
//! Every decision function takes the acting user explicitly and borrows a
//! [`directory::Directory`]; none of them mutate state.

pub mod assignment;
pub mod auth;
pub mod directory;
pub mod hierarchy;
pub mod models;

/// Current version of the TeamTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
