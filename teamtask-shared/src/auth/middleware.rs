/// Bearer authentication for axum routers
///
/// Checks `Authorization: Bearer <access token>` and stores an
/// [`AuthContext`] in the request extensions. Only the user id travels with
/// the request; handlers look the actor up in the directory every time, so
/// role and status come from the current snapshot and never from the token.
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use teamtask_shared::auth::middleware::{create_jwt_middleware, AuthContext};
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     auth.user_id
/// }
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(create_jwt_middleware("signing-secret".to_string())));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{future::Future, pin::Pin};
use tracing::warn;

use super::jwt::{validate_access_token, JwtError};

/// Who is calling, as claimed by a valid access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: String,
}

impl AuthContext {
    pub fn from_jwt(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but not a bearer credential
    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),
}

impl AuthError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::InvalidFormat(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AuthError::MissingCredentials | AuthError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InvalidToken(match err {
            JwtError::Expired => "Token expired".to_string(),
            JwtError::InvalidIssuer => "Invalid issuer".to_string(),
            other => format!("Invalid token: {}", other),
        })
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = json!({ "error": code, "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not ASCII".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Rejects the request unless it carries a valid access token
///
/// 401 for a missing header or a bad, expired or refresh token; 400 when the
/// header is not a bearer credential.
pub async fn authenticate(secret: String, mut req: Request, next: Next) -> Result<Response, AuthError> {
    let claims = validate_access_token(bearer_token(req.headers())?, &secret).map_err(|e| {
        warn!(error = %e, "Rejected bearer token");
        AuthError::from(e)
    })?;

    req.extensions_mut().insert(AuthContext::from_jwt(claims.sub));
    Ok(next.run(req).await)
}

type AuthFuture = Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>>;

/// Wraps [`authenticate`] with an owned secret for `axum::middleware::from_fn`
///
/// The closure owns its copy, so the router outlives whatever the secret was
/// read from.
pub fn create_jwt_middleware(secret: String) -> impl Fn(Request, Next) -> AuthFuture + Clone {
    move |req, next| Box::pin(authenticate(secret.clone(), req, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims, TokenType};
    use axum::{body::Body, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    const SECRET: &str = "middleware-secret-key-of-32-bytes!";

    /// Secret read from a value the router must not borrow, as from config
    fn app() -> Router {
        let config_secret = String::from(SECRET);

        let router = Router::new()
            .route(
                "/me",
                get(|Extension(auth): Extension<AuthContext>| async move { auth.user_id }),
            )
            .layer(middleware::from_fn(create_jwt_middleware(config_secret.clone())));

        drop(config_secret);
        router
    }

    fn request(auth: Option<String>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/me");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_auth_error_into_response() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidFormat("test".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::from(JwtError::Expired).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_valid_token_sets_context() {
        let token = create_token(&Claims::new("u1", TokenType::Access), SECRET).unwrap();
        let response = app()
            .oneshot(request(Some(format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"u1");
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let response = app().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_header_is_bad_request() {
        let response = app()
            .oneshot(request(Some("Basic dXNlcjpwYXNz".to_string())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refresh_token_is_rejected() {
        let token = create_token(&Claims::new("u1", TokenType::Refresh), SECRET).unwrap();
        let response = app()
            .oneshot(request(Some(format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
