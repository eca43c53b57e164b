/// Application state and router
///
/// ```no_run
/// use teamtask_api::{app::{build_router, AppState}, config::Config, store::Store};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Store::new(), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes, store::Store};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::{sync::Arc, time::Duration};
use teamtask_shared::auth::middleware::create_jwt_middleware;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Handler state: the store plus the immutable config
#[derive(Clone)]
pub struct AppState {
    /// Users and tasks
    pub store: Arc<Store>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    /// Signing secret shared with the identity provider
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /health                              public
/// /v1/auth/{register,refresh}          public
/// /v1/users                            bearer token
///   GET / | /pending | /assignable | /:id
///   DELETE /:id
///   POST /:id/approve | /:id/suspend
///   PUT  /:id/hierarchy
/// /v1/tasks                            bearer token
///   GET|POST /
///   GET|PATCH|DELETE /:id
///   GET /:id/assignable
///   POST /:id/reassign | /:id/status
/// ```
///
/// Middleware, outermost first: security headers, CORS, request tracing,
/// then bearer authentication on the `/users` and `/tasks` trees.
pub fn build_router(state: AppState) -> Router {
    let jwt_layer = middleware::from_fn(create_jwt_middleware(state.jwt_secret().to_string()));

    let v1 = Router::new()
        .nest(
            "/auth",
            Router::new()
                .route("/register", post(routes::auth::register))
                .route("/refresh", post(routes::auth::refresh)),
        )
        .nest("/users", user_routes().layer(jwt_layer.clone()))
        .nest("/tasks", task_routes().layer(jwt_layer));

    let cors = cors_layer(&state.config);
    let security = SecurityHeadersLayer::new(state.config.api.production);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(security)
        .with_state(state)
}

fn user_routes() -> Router<AppState> {
    use crate::routes::users;

    Router::new()
        .route("/", get(users::list_users))
        .route("/pending", get(users::list_pending))
        .route("/assignable", get(users::list_assignable))
        .route("/:id", get(users::get_user).delete(users::delete_user))
        .route("/:id/approve", post(users::approve))
        .route("/:id/hierarchy", put(users::update_hierarchy))
        .route("/:id/suspend", post(users::suspend))
}

fn task_routes() -> Router<AppState> {
    use crate::routes::tasks;

    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/:id",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/:id/assignable", get(tasks::list_reassignable))
        .route("/:id/reassign", post(tasks::reassign_task))
        .route("/:id/status", post(tasks::update_status))
}

/// `*` allows any origin; otherwise only the listed origins, with credentials
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_is_permissive() {
        return CorsLayer::permissive();
    }

    let origins = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
