/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and token refresh
/// - `users`: Directory listings, approval and hierarchy management
/// - `tasks`: Task CRUD gated by the permission engine
///
/// Every authenticated handler resolves the actor from the token subject
/// against the current directory and passes it explicitly to the engine.

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use teamtask_shared::{
    auth::{authorization::require_active, middleware::AuthContext},
    directory::UserDirectory,
    models::User,
};

use crate::error::ApiResult;

/// Resolves the authenticated caller to an active user
///
/// # Errors
///
/// 401 if the token subject is unknown, 403 if the user is pending or
/// suspended.
pub(crate) fn current_actor(auth: &AuthContext, directory: &UserDirectory) -> ApiResult<User> {
    let actor = require_active(&auth.user_id, directory)?;
    Ok(actor.clone())
}
