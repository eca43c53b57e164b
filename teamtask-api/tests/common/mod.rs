//! Common test utilities for integration tests
//!
//! Builds the router over an in-memory store seeded with a small org:
//!
//! ```text
//! a1 super admin
//! m1 manager  <- s1 supervisor <- x1, x2 members
//! m2 manager  <- s2 supervisor <- x3 member
//! p1 pending
//! ```
//!
//! and mints an access token for every seeded user.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use teamtask_api::{
    app::{build_router, AppState},
    config::Config,
    store::Store,
};
use teamtask_shared::{
    auth::jwt::{create_token, Claims, TokenType},
    directory::UserDirectory,
    models::{Role, User, UserStatus},
};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret-32-bytes!!";

/// Test context containing the router and per-user tokens
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    tokens: HashMap<String, String>,
}

fn user(id: &str, name: &str, role: Role, supervisor: Option<&str>, manager: Option<&str>) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", id),
        role,
        status: UserStatus::Active,
        supervisor_id: supervisor.map(str::to_string),
        manager_id: manager.map(str::to_string),
        created_at: now,
        updated_at: now,
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(JWT_SECRET.to_string()),
        "API_HOST" => Some("127.0.0.1".to_string()),
        _ => None,
    })
    .expect("test config")
}

impl TestContext {
    pub fn new() -> Self {
        let mut pending = user("p1", "Pat", Role::Member, None, None);
        pending.status = UserStatus::PendingApproval;

        let users = vec![
            user("a1", "Ada", Role::SuperAdmin, None, None),
            user("m1", "Mia", Role::Manager, None, None),
            user("m2", "Max", Role::Manager, None, None),
            user("s1", "Sam", Role::Supervisor, None, Some("m1")),
            user("s2", "Sue", Role::Supervisor, None, Some("m2")),
            user("x1", "Xan", Role::Member, Some("s1"), Some("m1")),
            user("x2", "Abe", Role::Member, Some("s1"), Some("m1")),
            user("x3", "Kim", Role::Member, Some("s2"), Some("m2")),
            pending,
        ];

        let tokens = users
            .iter()
            .map(|u| {
                let token = create_token(&Claims::new(u.id.clone(), TokenType::Access), JWT_SECRET)
                    .expect("token");
                (u.id.clone(), token)
            })
            .collect();

        let directory = UserDirectory::from_users(users).expect("seed users");
        let state = AppState::new(Store::with_users(directory), test_config());
        let app = build_router(state.clone());

        Self { app, state, tokens }
    }

    /// Access token for a seeded user
    pub fn token(&self, user_id: &str) -> String {
        self.tokens
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| panic!("no token for {}", user_id))
    }

    /// Sends a request as `user_id` (or anonymously) and returns status and JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let token = user_id.map(|id| self.token(id));
        self.send_with_token(method, uri, token.as_deref(), body).await
    }

    /// Sends a request with an explicit bearer token
    pub async fn send_with_token(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        send_request(&self.app, request).await
    }

    /// Creates a task as `creator` and returns its id
    pub async fn create_task(&self, creator: &str, assignee: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/tasks",
                Some(creator),
                Some(serde_json::json!({
                    "title": "Quarterly report",
                    "assignee_id": assignee,
                    "assigned_date": "2030-01-01",
                    "target_date": "2030-02-01",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
        body["id"].as_str().expect("task id").to_string()
    }
}

/// Sends a prepared request through the router
pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
