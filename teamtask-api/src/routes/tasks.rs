/// Task endpoints
///
/// Each handler computes the caller's permissions on the task before it
/// touches the store, and returns them alongside the task so clients can
/// enable or disable controls.
///
/// # Endpoints
///
/// - `POST /v1/tasks` - Create a task for an assignable user
/// - `GET /v1/tasks` - Tasks the caller may view
/// - `GET /v1/tasks/:id` - One task
/// - `PATCH /v1/tasks/:id` - Edit title, description, dates, priority, tags
/// - `GET /v1/tasks/:id/assignable` - Users the task may be moved to
/// - `POST /v1/tasks/:id/reassign` - Move the task to another user
/// - `POST /v1/tasks/:id/status` - Change progress status
/// - `DELETE /v1/tasks/:id` - Delete the task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::current_actor,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use teamtask_shared::{
    assignment::{can_assign_to, can_reassign_to, reassignable_users},
    auth::{
        authorization::{permissions_for, require_task_action, AuthzError, TaskAction, TaskPermissions},
        middleware::AuthContext,
    },
    directory::UserDirectory,
    models::{
        task::{NewTask, Priority, TaskEdit},
        Task, TaskStatus, User,
    },
};
use tracing::{debug, info};
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,

    #[validate(length(min = 1, message = "Assignee is required"))]
    pub assignee_id: String,

    /// Defaults to today
    pub assigned_date: Option<NaiveDate>,

    pub target_date: NaiveDate,

    pub priority: Option<Priority>,

    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Vec<String>,
}

impl CreateTaskRequest {
    /// Whitespace-only title or assignee becomes empty and fails validation
    fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.assignee_id = self.assignee_id.trim().to_string();
        self
    }
}

/// Edit task request
///
/// Absent fields are left unchanged. `clear_priority` removes the priority.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub target_date: Option<NaiveDate>,

    pub priority: Option<Priority>,

    #[serde(default)]
    pub clear_priority: bool,

    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Option<Vec<String>>,
}

impl UpdateTaskRequest {
    fn trimmed(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self
    }

    fn into_edit(self) -> TaskEdit {
        let priority = if self.clear_priority {
            Some(None)
        } else {
            self.priority.map(Some)
        };

        TaskEdit {
            title: self.title,
            description: self.description,
            target_date: self.target_date,
            priority,
            tags: self.tags.map(clean_tags),
        }
    }
}

/// Reassign request
#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub assignee_id: String,
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TaskStatus,
}

/// Filters for `GET /v1/tasks`
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub overdue: bool,
}

/// A task together with what the caller may do with it
#[derive(Debug, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,

    pub overdue: bool,

    pub permissions: TaskPermissions,
}

impl TaskView {
    fn new(task: Task, permissions: TaskPermissions, today: NaiveDate) -> Self {
        Self {
            overdue: task.is_overdue(today),
            task,
            permissions,
        }
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}

fn date_order_error() -> ApiError {
    ApiError::ValidationError(vec![ValidationErrorDetail {
        field: "target_date".to_string(),
        code: Some("target_before_assigned".to_string()),
        message: "Target date cannot be before the assigned date".to_string(),
    }])
}

fn task_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Task not found: {}", id))
}

fn find_task<'a>(tasks: &'a mut HashMap<String, Task>, id: &str) -> ApiResult<&'a mut Task> {
    tasks.get_mut(id).ok_or_else(|| task_not_found(id))
}

fn authorize(actor: &User, task: &Task, action: TaskAction, users: &UserDirectory) -> ApiResult<TaskPermissions> {
    Ok(require_task_action(actor, task, action, users)?)
}

/// Create a task
///
/// ```text
/// POST /v1/tasks
/// { "title": "Quarterly report", "assignee_id": "x1", "target_date": "2024-07-01", "priority": "high" }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: The assignee is not in the caller's assignable set
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let req = req.trimmed();
    req.validate()?;

    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;

    let today = Utc::now().date_naive();
    let assigned_date = req.assigned_date.unwrap_or(today);
    if req.target_date < assigned_date {
        return Err(date_order_error());
    }

    if !can_assign_to(&actor, &req.assignee_id, &*users) {
        return Err(AuthzError::AssigneeNotAllowed(req.assignee_id).into());
    }

    let task = Task::create(
        NewTask {
            title: req.title,
            description: req.description,
            assignee_id: req.assignee_id,
            assigned_date,
            target_date: req.target_date,
            priority: req.priority,
            tags: clean_tags(req.tags),
        },
        &actor.id,
        Utc::now(),
    );
    let permissions = permissions_for(&actor, &task, &*users);

    state
        .store
        .tasks()
        .write()
        .await
        .insert(task.id.clone(), task.clone());

    info!(actor_id = %actor.id, task_id = %task.id, assignee_id = %task.assignee_id, "Created task");
    Ok((StatusCode::CREATED, Json(TaskView::new(task, permissions, today))))
}

/// List tasks the caller may view
///
/// Ordered by target date, then creation time.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;
    let tasks = state.store.tasks().read().await;
    let today = Utc::now().date_naive();

    let mut visible: Vec<TaskView> = tasks
        .values()
        .filter(|t| query.status.map_or(true, |status| t.status == status))
        .filter(|t| query.assignee_id.as_deref().map_or(true, |id| t.assignee_id == id))
        .filter(|t| !query.overdue || t.is_overdue(today))
        .filter_map(|t| {
            let permissions = permissions_for(&actor, t, &*users);
            permissions
                .can_view
                .then(|| TaskView::new(t.clone(), permissions, today))
        })
        .collect();

    visible.sort_by(|a, b| {
        a.task
            .target_date
            .cmp(&b.task.target_date)
            .then_with(|| a.task.created_at.cmp(&b.task.created_at))
    });

    debug!(actor_id = %actor.id, count = visible.len(), "Listed tasks");
    Ok(Json(visible))
}

/// Get one task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskView>> {
    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;
    let tasks = state.store.tasks().read().await;

    let task = tasks.get(&id).ok_or_else(|| task_not_found(&id))?;
    let permissions = authorize(&actor, task, TaskAction::View, &users)?;

    Ok(Json(TaskView::new(task.clone(), permissions, Utc::now().date_naive())))
}

/// Edit a task's fields
///
/// # Errors
///
/// - `400 Bad Request`: Nothing to change
/// - `403 Forbidden`: Caller may not edit this task
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskView>> {
    let req = req.trimmed();
    req.validate()?;

    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;
    let mut tasks = state.store.tasks().write().await;

    let task = find_task(&mut tasks, &id)?;
    let permissions = authorize(&actor, task, TaskAction::Edit, &users)?;

    let edit = req.into_edit();
    if edit.is_empty() {
        return Err(ApiError::BadRequest("No changes requested".to_string()));
    }
    if edit.target_date.is_some_and(|target| target < task.assigned_date) {
        return Err(date_order_error());
    }

    task.apply_edit(edit, Utc::now());

    info!(actor_id = %actor.id, task_id = %task.id, "Edited task");
    Ok(Json(TaskView::new(task.clone(), permissions, Utc::now().date_naive())))
}

/// List users the task may be reassigned to
///
/// Always includes the current assignee.
pub async fn list_reassignable(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;
    let tasks = state.store.tasks().read().await;

    let task = tasks.get(&id).ok_or_else(|| task_not_found(&id))?;
    authorize(&actor, task, TaskAction::Reassign, &users)?;

    let candidates = reassignable_users(&actor, task, &*users)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(candidates))
}

/// Reassign a task
///
/// # Errors
///
/// - `403 Forbidden`: Caller may not reassign this task, or not to this user
pub async fn reassign_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<ReassignRequest>,
) -> ApiResult<Json<TaskView>> {
    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;
    let mut tasks = state.store.tasks().write().await;

    let task = find_task(&mut tasks, &id)?;
    authorize(&actor, task, TaskAction::Reassign, &users)?;

    let assignee_id = req.assignee_id.trim();
    if !can_reassign_to(&actor, task, assignee_id, &*users) {
        return Err(AuthzError::AssigneeNotAllowed(assignee_id.to_string()).into());
    }

    if task.assignee_id != assignee_id {
        let previous = std::mem::take(&mut task.assignee_id);
        task.reassign(assignee_id, Utc::now());
        info!(actor_id = %actor.id, task_id = %task.id, from = %previous, to = %task.assignee_id, "Reassigned task");
    }

    // The caller's relation to the task may have changed with the assignee
    let permissions = permissions_for(&actor, task, &*users);
    Ok(Json(TaskView::new(task.clone(), permissions, Utc::now().date_naive())))
}

/// Change a task's progress status
///
/// Setting the current status again is a no-op.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<TaskView>> {
    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;
    let mut tasks = state.store.tasks().write().await;

    let task = find_task(&mut tasks, &id)?;
    let permissions = authorize(&actor, task, TaskAction::UpdateStatus, &users)?;

    if task.set_status(req.status, Utc::now()) {
        info!(actor_id = %actor.id, task_id = %task.id, status = task.status.as_str(), "Changed task status");
    } else {
        debug!(task_id = %task.id, status = task.status.as_str(), "Status unchanged");
    }

    Ok(Json(TaskView::new(task.clone(), permissions, Utc::now().date_naive())))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;
    let mut tasks = state.store.tasks().write().await;

    let task = tasks.get(&id).ok_or_else(|| task_not_found(&id))?;
    authorize(&actor, task, TaskAction::Delete, &users)?;
    tasks.remove(&id);

    info!(actor_id = %actor.id, task_id = %id, "Deleted task");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_tags_trims_and_dedups() {
        let tags = vec![" ops ".to_string(), "ops".to_string(), "".to_string(), "q3".to_string()];
        assert_eq!(clean_tags(tags), vec!["ops", "q3"]);
    }

    #[test]
    fn test_clear_priority_wins() {
        let edit = UpdateTaskRequest {
            priority: Some(Priority::High),
            clear_priority: true,
            ..Default::default()
        }
        .into_edit();
        assert_eq!(edit.priority, Some(None));

        let edit = UpdateTaskRequest {
            priority: Some(Priority::Low),
            ..Default::default()
        }
        .into_edit();
        assert_eq!(edit.priority, Some(Some(Priority::Low)));
        assert!(UpdateTaskRequest::default().into_edit().is_empty());
    }
}
