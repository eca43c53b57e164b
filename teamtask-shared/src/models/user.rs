/// User model
///
/// A user registers in `pending_approval` status with no role authority. A
/// super-admin approval sets the role, the reporting links and `active`
/// status together (see [`crate::hierarchy::approve_user`]).
///
/// # Status Lifecycle
///
/// ```text
/// pending_approval → active → suspended
/// ```
///
/// Deletion is possible from any status. A user never re-enters
/// `pending_approval`.
///
/// # Reporting Links
///
/// `supervisor_id` and `manager_id` are weak references by id. Removing the
/// referenced user leaves the link in place; resolving it through a
/// [`Directory`](crate::directory::Directory) then reports the link as not
/// found instead of failing.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use teamtask_shared::models::user::{NewUser, User, UserStatus};
///
/// let user = User::register(NewUser {
///     name: "Ada Lovelace".to_string(),
///     email: "ada@example.com".to_string(),
/// }, Utc::now());
///
/// assert_eq!(user.status, UserStatus::PendingApproval);
/// assert!(user.supervisor_id.is_none());
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Registered, waiting for a super-admin to approve
    PendingApproval,

    /// Approved; may act on tasks according to role
    Active,

    /// Disabled by a super-admin (terminal)
    Suspended,
}

impl UserStatus {
    /// Converts status to its canonical label
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::PendingApproval => "pending_approval",
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        }
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: UserStatus) -> bool {
        matches!(
            (self, target),
            (UserStatus::PendingApproval, UserStatus::Active)
                | (UserStatus::Active, UserStatus::Suspended)
        )
    }

    /// Checks if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, UserStatus::Suspended)
    }
}

/// A user known to the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque unique identifier (case-sensitive)
    pub id: String,

    /// Display name, used for ordering in listings
    pub name: String,

    /// Email address, unique case-insensitively
    pub email: String,

    /// Role in the reporting hierarchy
    ///
    /// Pending users carry `Member` until approval assigns the real role;
    /// the role grants nothing while the user is not active.
    pub role: Role,

    /// Account status
    pub status: UserStatus,

    /// Id of the supervisor this user reports to (members only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<String>,

    /// Id of the manager this user reports to (members and supervisors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,

    /// When the user registered
    pub created_at: DateTime<Utc>,

    /// When role, links or status last changed
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name
    pub name: String,

    /// Email address
    pub email: String,
}

impl User {
    /// Creates a freshly registered user in `pending_approval` status
    pub fn register(data: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            email: data.email,
            role: Role::Member,
            status: UserStatus::PendingApproval,
            supervisor_id: None,
            manager_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates an already active top-level user
    ///
    /// Used to seed the first super-admin, who cannot be approved by anyone.
    pub fn bootstrap_admin(name: String, email: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            role: Role::SuperAdmin,
            status: UserStatus::Active,
            supervisor_id: None,
            manager_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the user may act in the system
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Whether the user's links match what an active user of this role needs
    ///
    /// Only the presence of links is checked here; whether they resolve is a
    /// directory question.
    pub fn has_required_links(&self) -> bool {
        let supervisor_ok = self.role.requires_supervisor() == self.supervisor_id.is_some();
        let manager_ok = self.role.requires_manager() == self.manager_id.is_some();
        supervisor_ok && manager_ok
    }

    /// Case-insensitive email key used for uniqueness checks
    pub fn email_key(&self) -> String {
        normalize_email(&self.email)
    }
}

/// Lowercases and trims an email address for comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(role: Role, supervisor: Option<&str>, manager: Option<&str>) -> User {
        let mut user = User::register(
            NewUser {
                name: "Test User".to_string(),
                email: "test@example.com".to_string(),
            },
            Utc::now(),
        );
        user.role = role;
        user.status = UserStatus::Active;
        user.supervisor_id = supervisor.map(str::to_string);
        user.manager_id = manager.map(str::to_string);
        user
    }

    #[test]
    fn test_user_status_transitions() {
        assert!(UserStatus::PendingApproval.can_transition_to(UserStatus::Active));
        assert!(UserStatus::Active.can_transition_to(UserStatus::Suspended));

        // Never back to pending
        assert!(!UserStatus::Active.can_transition_to(UserStatus::PendingApproval));
        assert!(!UserStatus::Suspended.can_transition_to(UserStatus::PendingApproval));

        // Suspended is terminal
        assert!(UserStatus::Suspended.is_terminal());
        assert!(!UserStatus::Suspended.can_transition_to(UserStatus::Active));
    }

    #[test]
    fn test_register_is_pending_without_links() {
        let user = User::register(
            NewUser {
                name: "New".to_string(),
                email: "new@example.com".to_string(),
            },
            Utc::now(),
        );

        assert_eq!(user.status, UserStatus::PendingApproval);
        assert!(!user.is_active());
        assert!(user.supervisor_id.is_none());
        assert!(user.manager_id.is_none());
        assert!(!user.id.is_empty());
    }

    #[test]
    fn test_has_required_links() {
        assert!(user_with(Role::Member, Some("s1"), Some("m1")).has_required_links());
        assert!(!user_with(Role::Member, Some("s1"), None).has_required_links());
        assert!(user_with(Role::Supervisor, None, Some("m1")).has_required_links());
        assert!(!user_with(Role::Supervisor, Some("s1"), Some("m1")).has_required_links());
        assert!(user_with(Role::Manager, None, None).has_required_links());
        assert!(!user_with(Role::SuperAdmin, None, Some("m1")).has_required_links());
    }

    #[test]
    fn test_email_key_is_case_insensitive() {
        let mut user = user_with(Role::Manager, None, None);
        user.email = "  Ada@Example.COM ".to_string();
        assert_eq!(user.email_key(), "ada@example.com");
    }

    #[test]
    fn test_optional_links_are_omitted_when_serialized() {
        let user = user_with(Role::Manager, None, None);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("supervisor_id").is_none());
        assert_eq!(json["role"], "manager");
        assert_eq!(json["status"], "active");
    }
}
