/// Middleware modules for the API server
///
/// Bearer authentication lives in `teamtask_shared::auth::middleware`; this
/// module holds response-level middleware only.

pub mod security;
