//! # TeamTask API Server Library
//!
//! HTTP host for the hierarchical task engine in `teamtask-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Response middleware (security headers)
//! - `routes`: API route handlers
//! - `store`: In-memory user and task store

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod store;
