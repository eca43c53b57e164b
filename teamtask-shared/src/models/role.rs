/// Role model for the reporting hierarchy
///
/// Every user holds exactly one role. Roles are ordered by seniority:
///
/// ```text
/// member < supervisor < manager < super_admin
/// ```
///
/// Only the four canonical snake_case labels parse. Historical labels written
/// by older clients (e.g. `team_member`) are normalized once, at the directory
/// boundary, and never reach this type as strings.
///
/// # Example
///
/// ```
/// use teamtask_shared::models::role::Role;
///
/// let role: Role = "supervisor".parse().unwrap();
/// assert!(role < Role::Manager);
/// assert!("team_member".parse::<Role>().is_err());
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Position of a user in the reporting hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Works on tasks; reports to a supervisor and a manager
    Member,

    /// Leads members; reports to a manager
    Supervisor,

    /// Leads supervisors and members; reports to the organization
    Manager,

    /// Approves users and has full authority over every task
    SuperAdmin,
}

/// Error returned when a role label is not one of the canonical labels
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl Role {
    /// All roles, most junior first
    pub const ALL: [Role; 4] = [Role::Member, Role::Supervisor, Role::Manager, Role::SuperAdmin];

    /// Converts role to its canonical label
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Supervisor => "supervisor",
            Role::Manager => "manager",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Whether an active user with this role must carry a `supervisor_id`
    pub fn requires_supervisor(&self) -> bool {
        matches!(self, Role::Member)
    }

    /// Whether an active user with this role must carry a `manager_id`
    pub fn requires_manager(&self) -> bool {
        matches!(self, Role::Member | Role::Supervisor)
    }

    /// Checks if this role is at least as senior as the required role
    pub fn has_permission(&self, required: &Role) -> bool {
        self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}
