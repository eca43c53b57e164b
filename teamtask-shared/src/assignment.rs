/// Assignment resolution: who an actor may hand a task to
///
/// # Rules by actor role
///
/// | Actor | Assignable users |
/// |---|---|
/// | `super_admin` | every active user except the actor |
/// | `manager` | active supervisors and members whose `manager_id` is the actor |
/// | `supervisor` | active members whose `supervisor_id` is the actor, plus the actor |
/// | `member` | the actor only |
///
/// Managers reach their direct reports only. A member whose supervisor
/// reports to the manager, but whose own `manager_id` is someone else, is not
/// assignable by that manager.
///
/// The actor is looked up again in the directory by id and the directory's
/// copy decides role and status. An actor that is missing or not active gets
/// an empty set: nothing assignable is the safe state.
///
/// Results are ordered by name and contain no duplicates.

use std::collections::HashSet;

use tracing::debug;

use crate::directory::{sort_by_name, Directory};
use crate::models::role::Role;
use crate::models::task::Task;
use crate::models::user::User;

/// Resolves the actor against the directory, keeping only active users
fn resolve_actor<'a, D: Directory + ?Sized>(actor: &User, directory: &'a D) -> Option<&'a User> {
    if actor.id.trim().is_empty() {
        return None;
    }
    match directory.get_user_by_id(&actor.id) {
        Ok(current) if current.is_active() => Some(current),
        Ok(_) => {
            debug!(actor_id = %actor.id, "Actor is not active; nothing assignable");
            None
        }
        Err(_) => {
            debug!(actor_id = %actor.id, "Actor not in directory; nothing assignable");
            None
        }
    }
}

/// Users the actor may assign a new task to
pub fn assignable_users<'a, D: Directory + ?Sized>(actor: &User, directory: &'a D) -> Vec<&'a User> {
    let Some(actor) = resolve_actor(actor, directory) else {
        return Vec::new();
    };

    let mut users: Vec<&User> = match actor.role {
        Role::SuperAdmin => directory
            .list_active()
            .into_iter()
            .filter(|u| u.id != actor.id)
            .collect(),
        Role::Manager => directory
            .list_active()
            .into_iter()
            .filter(|u| matches!(u.role, Role::Supervisor | Role::Member))
            .filter(|u| u.manager_id.as_deref() == Some(actor.id.as_str()))
            .filter(|u| u.id != actor.id)
            .collect(),
        Role::Supervisor => {
            let mut users: Vec<&User> = directory
                .list_active()
                .into_iter()
                .filter(|u| u.role == Role::Member)
                .filter(|u| u.supervisor_id.as_deref() == Some(actor.id.as_str()))
                .collect();
            users.push(actor);
            users
        }
        Role::Member => vec![actor],
    };

    dedup_sorted(&mut users);
    debug!(actor_id = %actor.id, role = %actor.role, count = users.len(), "Resolved assignable users");
    users
}

/// Users the actor may reassign an existing task to
///
/// Same as [`assignable_users`], plus the task's current assignee whenever
/// the assignee is in the directory, so the current value is always a valid
/// selection.
pub fn reassignable_users<'a, D: Directory + ?Sized>(
    actor: &User,
    task: &Task,
    directory: &'a D,
) -> Vec<&'a User> {
    let mut users = assignable_users(actor, directory);

    match directory.get_user_by_id(&task.assignee_id) {
        Ok(assignee) => users.push(assignee),
        Err(_) => {
            tracing::warn!(task_id = %task.id, assignee_id = %task.assignee_id, "Task assignee not found in directory");
        }
    }

    dedup_sorted(&mut users);
    users
}

/// Whether the actor may assign a new task to `assignee_id`
pub fn can_assign_to<D: Directory + ?Sized>(actor: &User, assignee_id: &str, directory: &D) -> bool {
    assignable_users(actor, directory)
        .iter()
        .any(|u| u.id == assignee_id)
}

/// Whether the actor may move `task` to `assignee_id`
///
/// Only checks the target set; whether the actor may reassign this task at
/// all is a task permission question.
pub fn can_reassign_to<D: Directory + ?Sized>(
    actor: &User,
    task: &Task,
    assignee_id: &str,
    directory: &D,
) -> bool {
    reassignable_users(actor, task, directory)
        .iter()
        .any(|u| u.id == assignee_id)
}

fn dedup_sorted(users: &mut Vec<&User>) {
    let mut seen = HashSet::new();
    users.retain(|u| seen.insert(u.id.clone()));
    sort_by_name(users);
}
