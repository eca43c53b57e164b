/// In-memory user and task store
///
/// Users live in a [`UserDirectory`] and tasks in a map keyed by id, each
/// behind its own `tokio::sync::RwLock`. Handlers always lock users before
/// tasks, so a request sees one consistent snapshot and two requests can
/// never wait on each other in opposite order.
///
/// An approval reads the pending user, validates, and writes the result
/// under a single users write lock; a concurrent second approval sees the
/// user already active.

use std::collections::HashMap;

use chrono::Utc;
use teamtask_shared::{
    directory::{Directory, DirectoryError, UserDirectory},
    models::{user::normalize_email, Role, Task, User},
};
use tokio::sync::RwLock;
use tracing::info;

/// Shared state behind the HTTP handlers
#[derive(Debug, Default)]
pub struct Store {
    users: RwLock<UserDirectory>,
    tasks: RwLock<HashMap<String, Task>>,
}

impl Store {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store around an existing directory
    pub fn with_users(users: UserDirectory) -> Self {
        Self {
            users: RwLock::new(users),
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// User directory lock (always take before [`Store::tasks`])
    pub fn users(&self) -> &RwLock<UserDirectory> {
        &self.users
    }

    /// Task map lock
    pub fn tasks(&self) -> &RwLock<HashMap<String, Task>> {
        &self.tasks
    }

    /// Ensures an active super admin with this email exists
    ///
    /// Returns the admin. An existing user with the email is returned as is
    /// if already a super admin.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEmail` if the email belongs to a user who is not a
    /// super admin.
    pub async fn seed_admin(&self, name: &str, email: &str) -> Result<User, DirectoryError> {
        let email = normalize_email(email);
        let mut users = self.users.write().await;

        if let Some(existing) = users.find_by_email(&email) {
            if existing.role == Role::SuperAdmin && existing.is_active() {
                return Ok(existing.clone());
            }
            return Err(DirectoryError::DuplicateEmail(email));
        }

        let admin = User::bootstrap_admin(name.trim().to_string(), email, Utc::now());
        users.insert(admin.clone())?;
        info!(user_id = %admin.id, email = %admin.email, "Seeded super admin");
        Ok(admin)
    }
}
