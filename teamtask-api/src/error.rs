/// HTTP error mapping
///
/// All handlers return `Result<T, ApiError>`, which converts to an HTTP
/// status and a JSON body:
///
/// ```json
/// { "error": "validation_error", "message": "...", "details": [{ "field": "manager_id", "code": "missing_manager", "message": "..." }] }
/// ```
///
/// Engine errors convert with `?`: hierarchy rule violations become 422 with
/// the offending field, permission refusals 403, unknown resources 404 and
/// lifecycle conflicts 409.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use teamtask_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, middleware::AuthError},
    directory::DirectoryError,
    hierarchy::{ApprovalError, ValidationError},
};

pub type ApiResult<T> = Result<T, ApiError>;

/// Every way a handler can fail, one variant per HTTP status
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing, invalid or expired token, or a token naming a deleted user
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Inactive actor, insufficient role, or a task action the actor lacks
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Lifecycle conflicts: duplicate email, user not pending, self edits
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 422 with one entry per offending field
    #[error("Validation failed: {} errors", .0.len())]
    ValidationError(Vec<ValidationErrorDetail>),

    /// Logged, never shown to the client
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// One rejected field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,

    /// Stable snake_case code, e.g. `missing_manager`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    pub message: String,
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable kind, e.g. `forbidden`
    pub error: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::InternalError(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.code().to_string();

        let (message, details) = match self {
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ("An internal error occurred".to_string(), None)
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => (msg, None),
        };

        (status, Json(ErrorResponse { error, message, details })).into_response()
    }
}

/// Convert request DTO validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    code: Some(error.code.to_string()),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(errors)
    }
}

/// Convert hierarchy rule violations to API errors
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: err.field().to_string(),
            code: Some(err.code().to_string()),
            message: err.to_string(),
        }])
    }
}

/// Convert approval and lifecycle errors to API errors
impl From<ApprovalError> for ApiError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::Invalid(validation) => validation.into(),
            ApprovalError::UserMismatch { .. } => ApiError::BadRequest(err.to_string()),
            ApprovalError::NotPending(_)
            | ApprovalError::NotActive(_)
            | ApprovalError::InvalidStatusTransition { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

/// Convert directory errors to API errors
impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(_)
            | DirectoryError::SupervisorNotFound { .. }
            | DirectoryError::ManagerNotFound { .. } => ApiError::NotFound(err.to_string()),
            DirectoryError::DuplicateId(_) | DirectoryError::DuplicateEmail(_) => {
                ApiError::Conflict(err.to_string())
            }
            DirectoryError::MissingId | DirectoryError::UnknownRoleLabel(_) => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized("Missing credentials".to_string()),
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            // Token is valid but its subject no longer exists
            AuthzError::UnknownActor(_) => ApiError::Unauthorized(err.to_string()),
            AuthzError::InactiveActor(_) => ApiError::Forbidden(err.to_string()),
            AuthzError::InsufficientRole { .. } => {
                ApiError::Forbidden("Insufficient permissions".to_string())
            }
            AuthzError::TaskActionDenied { .. } | AuthzError::AssigneeNotAllowed(_) => {
                ApiError::Forbidden(err.to_string())
            }
        }
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}
