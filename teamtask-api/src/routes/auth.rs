/// Authentication endpoints
///
/// Credentials are checked by the identity provider that shares
/// `JWT_SECRET`; these endpoints only enroll users and rotate tokens.
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a new user (pending approval)
/// - `POST /v1/auth/refresh` - Exchange a refresh token for an access token

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use teamtask_shared::{
    auth::jwt,
    models::{
        user::{normalize_email, NewUser},
        User,
    },
};
use tracing::info;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

impl RegisterRequest {
    /// Blank names fail the length check instead of registering as ""
    fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// The new user, in `pending_approval` status
    pub user: User,

    /// Access (24h) and refresh (30d) tokens
    #[serde(flatten)]
    pub tokens: jwt::TokenPair,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Register a new user
///
/// The user starts in `pending_approval` with no authority until a super
/// admin approves them into the hierarchy.
///
/// ```text
/// POST /v1/auth/register
/// { "name": "Nia Lee", "email": "nia@example.com" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let req = req.trimmed();
    req.validate()?;

    let user = User::register(
        NewUser {
            name: req.name,
            email: normalize_email(&req.email),
        },
        Utc::now(),
    );

    state.store.users().write().await.insert(user.clone())?;

    let tokens = jwt::issue_token_pair(&user.id, state.jwt_secret())?;

    info!(user_id = %user.id, "User registered, pending approval");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user, tokens }),
    ))
}

/// Refresh access token
///
/// ```text
/// POST /v1/auth/refresh
/// { "refresh_token": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, expired, or non-refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}
