/// Hierarchy validation and approval
///
/// Decides whether a proposed role plus supervisor/manager links is a legal
/// position in the reporting hierarchy, and applies accepted positions to a
/// user in one step.
///
/// # Rules
///
/// Checked in this order; the first failure is reported:
///
/// 1. The role label must be one of the four canonical roles
/// 2. `member` needs a supervisor and a manager (supervisor reported first)
/// 3. `supervisor` needs a manager and must not have a supervisor
/// 4. `manager` and `super_admin` must have no links
/// 5. A supplied supervisor must exist and hold the `supervisor` role
/// 6. A supplied manager must exist and hold the `manager` role
/// 7. Neither link may point at the target user
///
/// Missing links are always reported. Nothing here substitutes a default
/// role or a default supervisor/manager.
///
/// # Example
///
/// ```
/// use teamtask_shared::directory::UserDirectory;
/// use teamtask_shared::hierarchy::{validate_assignment, AssignmentRequest, ValidationError};
///
/// let directory = UserDirectory::new();
/// let request = AssignmentRequest {
///     user_id: "p1".to_string(),
///     role: "member".to_string(),
///     supervisor_id: Some("s1".to_string()),
///     manager_id: None,
/// };
///
/// assert_eq!(
///     validate_assignment(&request, &directory),
///     Err(ValidationError::MissingManager)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::directory::{non_blank, Directory};
use crate::models::role::Role;
use crate::models::user::{User, UserStatus};

/// Reasons a proposed hierarchy position is rejected
///
/// All variants are recoverable: the caller re-prompts for corrected input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("A supervisor is required for this role")]
    MissingSupervisor,

    #[error("A manager is required for this role")]
    MissingManager,

    #[error("Supervisors do not report to a supervisor")]
    UnexpectedSupervisor,

    #[error("Managers and super admins do not report to anyone")]
    UnexpectedHierarchyLink,

    #[error("Supervisor not found: {0}")]
    SupervisorNotFound(String),

    #[error("User {0} is not a supervisor")]
    SupervisorWrongRole(String),

    #[error("Manager not found: {0}")]
    ManagerNotFound(String),

    #[error("User {0} is not a manager")]
    ManagerWrongRole(String),

    /// Carries the link that points back at the target user
    #[error("A user cannot report to themselves")]
    SelfReference(HierarchyLink),
}

/// One of the two reporting links on a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLink {
    Supervisor,
    Manager,
}

impl HierarchyLink {
    /// Request field holding this link
    pub fn field(self) -> &'static str {
        match self {
            HierarchyLink::Supervisor => "supervisor_id",
            HierarchyLink::Manager => "manager_id",
        }
    }
}

impl ValidationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidRole(_) => "invalid_role",
            ValidationError::MissingSupervisor => "missing_supervisor",
            ValidationError::MissingManager => "missing_manager",
            ValidationError::UnexpectedSupervisor => "unexpected_supervisor",
            ValidationError::UnexpectedHierarchyLink => "unexpected_hierarchy_link",
            ValidationError::SupervisorNotFound(_) => "supervisor_not_found",
            ValidationError::SupervisorWrongRole(_) => "supervisor_wrong_role",
            ValidationError::ManagerNotFound(_) => "manager_not_found",
            ValidationError::ManagerWrongRole(_) => "manager_wrong_role",
            ValidationError::SelfReference(_) => "self_reference",
        }
    }

    /// Request field the caller should re-prompt for
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidRole(_) | ValidationError::UnexpectedHierarchyLink => "role",
            ValidationError::MissingSupervisor
            | ValidationError::UnexpectedSupervisor
            | ValidationError::SupervisorNotFound(_)
            | ValidationError::SupervisorWrongRole(_) => "supervisor_id",
            ValidationError::MissingManager
            | ValidationError::ManagerNotFound(_)
            | ValidationError::ManagerWrongRole(_) => "manager_id",
            ValidationError::SelfReference(link) => link.field(),
        }
    }
}

/// A proposed hierarchy position for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    /// User being approved or edited
    pub user_id: String,

    /// Requested role label (canonical labels only)
    pub role: String,

    /// Proposed supervisor; blank counts as absent
    #[serde(default)]
    pub supervisor_id: Option<String>,

    /// Proposed manager; blank counts as absent
    #[serde(default)]
    pub manager_id: Option<String>,
}

/// An accepted hierarchy position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyAssignment {
    pub role: Role,
    pub supervisor_id: Option<String>,
    pub manager_id: Option<String>,
}

impl HierarchyAssignment {
    /// Writes role and links onto the user together
    fn apply_to(self, user: &mut User) {
        user.role = self.role;
        user.supervisor_id = self.supervisor_id;
        user.manager_id = self.manager_id;
    }
}

/// Validates a proposed role and reporting links
///
/// Pure and deterministic: calling it again with the same request over the
/// same directory gives the same answer.
///
/// # Errors
///
/// Returns the first [`ValidationError`] in rule order.
pub fn validate_assignment<D: Directory + ?Sized>(
    request: &AssignmentRequest,
    directory: &D,
) -> Result<HierarchyAssignment, ValidationError> {
    let role: Role = request
        .role
        .parse()
        .map_err(|_| ValidationError::InvalidRole(request.role.clone()))?;

    let supervisor_id = non_blank(request.supervisor_id.clone());
    let manager_id = non_blank(request.manager_id.clone());

    match role {
        Role::Member => {
            if supervisor_id.is_none() {
                return Err(ValidationError::MissingSupervisor);
            }
            if manager_id.is_none() {
                return Err(ValidationError::MissingManager);
            }
        }
        Role::Supervisor => {
            if manager_id.is_none() {
                return Err(ValidationError::MissingManager);
            }
            if supervisor_id.is_some() {
                return Err(ValidationError::UnexpectedSupervisor);
            }
        }
        Role::Manager | Role::SuperAdmin => {
            if supervisor_id.is_some() || manager_id.is_some() {
                return Err(ValidationError::UnexpectedHierarchyLink);
            }
        }
    }

    if let Some(id) = supervisor_id.as_deref() {
        let supervisor = directory
            .get_user_by_id(id)
            .map_err(|_| ValidationError::SupervisorNotFound(id.to_string()))?;
        if supervisor.role != Role::Supervisor {
            return Err(ValidationError::SupervisorWrongRole(id.to_string()));
        }
    }

    if let Some(id) = manager_id.as_deref() {
        let manager = directory
            .get_user_by_id(id)
            .map_err(|_| ValidationError::ManagerNotFound(id.to_string()))?;
        if manager.role != Role::Manager {
            return Err(ValidationError::ManagerWrongRole(id.to_string()));
        }
    }

    let target = Some(request.user_id.as_str());
    if supervisor_id.as_deref() == target {
        return Err(ValidationError::SelfReference(HierarchyLink::Supervisor));
    }
    if manager_id.as_deref() == target {
        return Err(ValidationError::SelfReference(HierarchyLink::Manager));
    }

    debug!(user_id = %request.user_id, role = %role, "Hierarchy assignment accepted");

    Ok(HierarchyAssignment {
        role,
        supervisor_id,
        manager_id,
    })
}

/// Errors from applying an assignment to a user
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApprovalError {
    /// The proposed position breaks a hierarchy rule
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Approval requires `pending_approval` status
    #[error("User {0} is not pending approval")]
    NotPending(String),

    /// Hierarchy edits require `active` status
    #[error("User {0} is not active")]
    NotActive(String),

    /// The request names a different user than the one being changed
    #[error("Request is for user {requested}, not {actual}")]
    UserMismatch { requested: String, actual: String },

    /// The status change is not allowed by the lifecycle
    #[error("Cannot move user from {from} to {to}")]
    InvalidStatusTransition { from: &'static str, to: &'static str },
}

fn ensure_same_user(user: &User, request: &AssignmentRequest) -> Result<(), ApprovalError> {
    if user.id != request.user_id {
        return Err(ApprovalError::UserMismatch {
            requested: request.user_id.clone(),
            actual: user.id.clone(),
        });
    }
    Ok(())
}

/// Approves a pending user into the hierarchy
///
/// Returns the user with role, links and `active` status applied together;
/// on any error nothing is applied.
///
/// # Errors
///
/// - `NotPending` if the user is not `pending_approval`
/// - `Invalid` if the position fails validation
/// - `UserMismatch` if the request names another user
pub fn approve_user<D: Directory + ?Sized>(
    user: &User,
    request: &AssignmentRequest,
    directory: &D,
    now: DateTime<Utc>,
) -> Result<User, ApprovalError> {
    ensure_same_user(user, request)?;
    if user.status != UserStatus::PendingApproval {
        return Err(ApprovalError::NotPending(user.id.clone()));
    }

    let assignment = validate_assignment(request, directory)?;

    let mut approved = user.clone();
    assignment.apply_to(&mut approved);
    approved.status = UserStatus::Active;
    approved.updated_at = now;

    info!(user_id = %approved.id, role = %approved.role, "User approved");
    Ok(approved)
}

/// Changes an active user's role and links
///
/// Reports of the edited user are not touched: their links keep pointing at
/// this user and the hierarchy relation is recomputed on the next decision.
///
/// # Errors
///
/// - `NotActive` if the user is not `active`
/// - `Invalid` if the position fails validation
/// - `UserMismatch` if the request names another user
pub fn reassign_hierarchy<D: Directory + ?Sized>(
    user: &User,
    request: &AssignmentRequest,
    directory: &D,
    now: DateTime<Utc>,
) -> Result<User, ApprovalError> {
    ensure_same_user(user, request)?;
    if user.status != UserStatus::Active {
        return Err(ApprovalError::NotActive(user.id.clone()));
    }

    let assignment = validate_assignment(request, directory)?;

    let mut edited = user.clone();
    assignment.apply_to(&mut edited);
    edited.updated_at = now;

    info!(user_id = %edited.id, role = %edited.role, "User hierarchy updated");
    Ok(edited)
}

/// Suspends an active user
///
/// # Errors
///
/// Returns `InvalidStatusTransition` unless the user is `active`.
pub fn suspend_user(user: &User, now: DateTime<Utc>) -> Result<User, ApprovalError> {
    if !user.status.can_transition_to(UserStatus::Suspended) {
        return Err(ApprovalError::InvalidStatusTransition {
            from: user.status.as_str(),
            to: UserStatus::Suspended.as_str(),
        });
    }

    let mut suspended = user.clone();
    suspended.status = UserStatus::Suspended;
    suspended.updated_at = now;

    info!(user_id = %suspended.id, "User suspended");
    Ok(suspended)
}
