/// Authorization helpers and task permission checks
///
/// This module decides what an actor may do with a task, and gates
/// user-management operations by role.
///
/// # Task Permission Model
///
/// Rows are evaluated top to bottom; the first matching row sets every flag:
///
/// | Actor relation to task | view | edit | reassign | status | delete |
/// |---|---|---|---|---|---|
/// | actor is `super_admin` | ✓ | ✓ | ✓ | ✓ | ✓ |
/// | actor created the task | ✓ | ✓ | ✓ | ✓ | |
/// | actor is the assignee | ✓ | | | ✓ | |
/// | actor is hierarchy-related to the assignee | ✓ | ✓ | ✓ | ✓ | |
/// | none of the above | | | | | |
///
/// Hierarchy-related means the actor is the assignee's supervisor, the
/// assignee's manager, or the manager of the assignee's supervisor. The chain
/// is followed live through the directory, so changing a supervisor's manager
/// moves all of that supervisor's members with it.
///
/// Absence of permission is an ordinary value. Only the `require_*` helpers
/// turn it into an [`AuthzError`].
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, Utc};
/// use teamtask_shared::auth::authorization::{permissions_for, TaskPermissions};
/// use teamtask_shared::directory::UserDirectory;
/// use teamtask_shared::models::task::{NewTask, Task};
/// use teamtask_shared::models::user::User;
///
/// let now = Utc::now();
/// let admin = User::bootstrap_admin("Root".into(), "root@example.com".into(), now);
/// let directory = UserDirectory::from_users(vec![admin.clone()]).unwrap();
///
/// let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let task = Task::create(NewTask {
///     title: "Audit".into(),
///     description: String::new(),
///     assignee_id: "someone".into(),
///     assigned_date: day,
///     target_date: day,
///     priority: None,
///     tags: vec![],
/// }, "someone-else", now);
///
/// assert_eq!(permissions_for(&admin, &task, &directory), TaskPermissions::all());
/// ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directory::Directory;
use crate::models::role::Role;
use crate::models::task::Task;
use crate::models::user::User;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Actor is unknown to the directory
    #[error("Unknown user {0}")]
    UnknownActor(String),

    /// Actor exists but is pending or suspended
    #[error("User {0} is not active")]
    InactiveActor(String),

    /// Actor doesn't have required role
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: Role, actual: Role },

    /// Actor may not perform this action on the task
    #[error("Not authorized to {action} task {task_id}")]
    TaskActionDenied { action: TaskAction, task_id: String },

    /// Actor may not hand the task to this user
    #[error("Not authorized to assign tasks to {0}")]
    AssigneeNotAllowed(String),
}

/// Actions on a task gated by permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    View,
    Edit,
    Reassign,
    UpdateStatus,
    Delete,
}

impl TaskAction {
    /// Converts action to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::View => "view",
            TaskAction::Edit => "edit",
            TaskAction::Reassign => "reassign",
            TaskAction::UpdateStatus => "update status of",
            TaskAction::Delete => "delete",
        }
    }
}

impl std::fmt::Display for TaskAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability flags for one actor on one task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPermissions {
    pub can_view: bool,
    pub can_edit: bool,
    pub can_reassign: bool,
    pub can_update_status: bool,
    pub can_delete: bool,
}

impl TaskPermissions {
    /// Everything allowed (super admin)
    pub const fn all() -> Self {
        Self {
            can_view: true,
            can_edit: true,
            can_reassign: true,
            can_update_status: true,
            can_delete: true,
        }
    }

    /// Nothing allowed
    pub const fn none() -> Self {
        Self {
            can_view: false,
            can_edit: false,
            can_reassign: false,
            can_update_status: false,
            can_delete: false,
        }
    }

    /// Creator or hierarchy-related: everything but delete
    const fn manage() -> Self {
        Self {
            can_delete: false,
            ..Self::all()
        }
    }

    /// Assignee: view and move through statuses
    const fn assignee() -> Self {
        Self {
            can_view: true,
            can_update_status: true,
            ..Self::none()
        }
    }

    /// Checks a single action
    pub fn allows(&self, action: TaskAction) -> bool {
        match action {
            TaskAction::View => self.can_view,
            TaskAction::Edit => self.can_edit,
            TaskAction::Reassign => self.can_reassign,
            TaskAction::UpdateStatus => self.can_update_status,
            TaskAction::Delete => self.can_delete,
        }
    }
}

/// Whether `actor` sits above `assignee` in the reporting chain
///
/// Supervisor links only count for supervisors and manager links only for
/// managers, so a stale link to a demoted user grants nothing.
pub fn is_hierarchy_related<D: Directory + ?Sized>(actor: &User, assignee: &User, directory: &D) -> bool {
    let actor_id = Some(actor.id.as_str());

    match actor.role {
        Role::Supervisor => assignee.supervisor_id.as_deref() == actor_id,
        Role::Manager => {
            if assignee.manager_id.as_deref() == actor_id {
                return true;
            }
            // Manager of the assignee's supervisor
            match directory.supervisor_of(assignee) {
                Ok(Some(supervisor)) => {
                    supervisor.role == Role::Supervisor && supervisor.manager_id.as_deref() == actor_id
                }
                _ => false,
            }
        }
        Role::Member | Role::SuperAdmin => false,
    }
}

/// Computes what `actor` may do with `task`
///
/// Never fails. Blank ids, or an actor that is missing from the directory or
/// not active, yield [`TaskPermissions::none`]. The directory's copy of the
/// actor decides role and status.
pub fn permissions_for<D: Directory + ?Sized>(actor: &User, task: &Task, directory: &D) -> TaskPermissions {
    if actor.id.trim().is_empty() || task.id.trim().is_empty() || task.assignee_id.trim().is_empty() {
        return TaskPermissions::none();
    }

    let actor = match directory.get_user_by_id(&actor.id) {
        Ok(current) if current.is_active() => current,
        _ => {
            debug!(actor_id = %actor.id, task_id = %task.id, "Actor missing or inactive; no task permissions");
            return TaskPermissions::none();
        }
    };

    let permissions = if actor.role == Role::SuperAdmin {
        TaskPermissions::all()
    } else if actor.id == task.created_by {
        TaskPermissions::manage()
    } else if actor.id == task.assignee_id {
        TaskPermissions::assignee()
    } else {
        match directory.get_user_by_id(&task.assignee_id) {
            Ok(assignee) if is_hierarchy_related(actor, assignee, directory) => TaskPermissions::manage(),
            _ => TaskPermissions::none(),
        }
    };

    debug!(
        actor_id = %actor.id,
        task_id = %task.id,
        ?permissions,
        "Computed task permissions"
    );
    permissions
}

/// Checks that the actor may perform `action` on `task`
///
/// # Errors
///
/// Returns `AuthzError::TaskActionDenied` if the permission flag is false.
pub fn require_task_action<D: Directory + ?Sized>(
    actor: &User,
    task: &Task,
    action: TaskAction,
    directory: &D,
) -> Result<TaskPermissions, AuthzError> {
    let permissions = permissions_for(actor, task, directory);

    if !permissions.allows(action) {
        return Err(AuthzError::TaskActionDenied {
            action,
            task_id: task.id.clone(),
        });
    }

    Ok(permissions)
}

/// Resolves the actor and checks that they are active
///
/// Returns the directory's copy of the actor.
///
/// # Errors
///
/// - `UnknownActor` if the id is not in the directory
/// - `InactiveActor` if the user is pending or suspended
pub fn require_active<'a, D: Directory + ?Sized>(actor_id: &str, directory: &'a D) -> Result<&'a User, AuthzError> {
    let actor = directory
        .get_user_by_id(actor_id)
        .map_err(|_| AuthzError::UnknownActor(actor_id.to_string()))?;

    if !actor.is_active() {
        return Err(AuthzError::InactiveActor(actor_id.to_string()));
    }

    Ok(actor)
}

/// Checks that the actor holds at least `required_role`
///
/// # Errors
///
/// Returns `AuthzError::InsufficientRole` if the actor is more junior.
pub fn require_role(actor: &User, required_role: Role) -> Result<(), AuthzError> {
    if !actor.role.has_permission(&required_role) {
        return Err(AuthzError::InsufficientRole {
            required: required_role,
            actual: actor.role,
        });
    }

    Ok(())
}

/// Checks that the actor may approve, edit, suspend and delete users
///
/// Only super admins manage users.
pub fn require_user_management(actor: &User) -> Result<(), AuthzError> {
    require_role(actor, Role::SuperAdmin)
}
