/// User directory endpoints
///
/// Listings are open to any active user; approval, hierarchy edits,
/// suspension and deletion are reserved for super admins.
///
/// # Endpoints
///
/// - `GET /v1/users` - Active users (super admins: everyone, filterable)
/// - `GET /v1/users/pending` - Users awaiting approval
/// - `GET /v1/users/assignable` - Users the caller may assign new tasks to
/// - `GET /v1/users/:id` - One user with resolved supervisor and manager
/// - `POST /v1/users/:id/approve` - Approve into the hierarchy
/// - `PUT /v1/users/:id/hierarchy` - Change role and reporting links
/// - `POST /v1/users/:id/suspend` - Suspend an active user
/// - `DELETE /v1/users/:id` - Remove a user (links to them are left dangling)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::current_actor,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use teamtask_shared::{
    assignment::assignable_users,
    auth::{authorization::require_user_management, middleware::AuthContext},
    directory::{Directory, DirectoryError},
    hierarchy::{approve_user, reassign_hierarchy, suspend_user, AssignmentRequest},
    models::{Role, User, UserStatus},
};
use tracing::{info, warn};

/// Filters for `GET /v1/users`
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,

    /// Only honored for super admins; everyone else sees active users
    pub status: Option<UserStatus>,
}

/// Proposed role and links for approval or hierarchy edits
///
/// The role is a plain label so an unknown value is reported as
/// `invalid_role` rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct HierarchyRequest {
    pub role: String,

    #[serde(default)]
    pub supervisor_id: Option<String>,

    #[serde(default)]
    pub manager_id: Option<String>,
}

impl HierarchyRequest {
    fn for_user(self, user_id: &str) -> AssignmentRequest {
        AssignmentRequest {
            user_id: user_id.to_string(),
            role: self.role,
            supervisor_id: self.supervisor_id,
            manager_id: self.manager_id,
        }
    }
}

/// A reporting link as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkedUser {
    /// The link points at an existing user
    Resolved { id: String, name: String },

    /// The linked user was deleted
    NotFound { id: String },
}

/// A user with their reporting links resolved
#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,

    pub supervisor: Option<LinkedUser>,

    pub manager: Option<LinkedUser>,
}

fn linked(result: Result<Option<&User>, DirectoryError>) -> ApiResult<Option<LinkedUser>> {
    match result {
        Ok(None) => Ok(None),
        Ok(Some(user)) => Ok(Some(LinkedUser::Resolved {
            id: user.id.clone(),
            name: user.name.clone(),
        })),
        Err(DirectoryError::SupervisorNotFound { supervisor_id, .. }) => {
            Ok(Some(LinkedUser::NotFound { id: supervisor_id }))
        }
        Err(DirectoryError::ManagerNotFound { manager_id, .. }) => {
            Ok(Some(LinkedUser::NotFound { id: manager_id }))
        }
        Err(other) => Err(other.into()),
    }
}

fn cloned(users: Vec<&User>) -> Vec<User> {
    users.into_iter().cloned().collect()
}

/// List users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;

    let listed: Vec<&User> = if actor.role == Role::SuperAdmin {
        match query.status {
            Some(status) => users.list_by_status(status),
            None => users.list_all(),
        }
    } else {
        users.list_active()
    };

    let listed = listed
        .into_iter()
        .filter(|u| query.role.map_or(true, |role| u.role == role))
        .collect();

    Ok(Json(cloned(listed)))
}

/// List users awaiting approval
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;
    require_user_management(&actor)?;

    Ok(Json(cloned(users.list_by_status(UserStatus::PendingApproval))))
}

/// List users the caller may assign a new task to
pub async fn list_assignable(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;

    Ok(Json(cloned(assignable_users(&actor, &*users))))
}

/// Get one user with resolved links
///
/// Non-admins only see active users; anyone else is reported as not found.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserDetail>> {
    let users = state.store.users().read().await;
    let actor = current_actor(&auth, &users)?;

    let user = users.get_user_by_id(&id)?;
    if actor.role != Role::SuperAdmin && !user.is_active() {
        return Err(DirectoryError::NotFound(id).into());
    }

    let supervisor = linked(users.supervisor_of(user))?;
    let manager = linked(users.manager_of(user))?;

    Ok(Json(UserDetail {
        user: user.clone(),
        supervisor,
        manager,
    }))
}

/// Approve a pending user into the hierarchy
///
/// ```text
/// POST /v1/users/:id/approve
/// { "role": "member", "supervisor_id": "s1", "manager_id": "m1" }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a super admin
/// - `404 Not Found`: No such user
/// - `409 Conflict`: User is not pending approval
/// - `422 Unprocessable Entity`: Role and links break a hierarchy rule
pub async fn approve(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<HierarchyRequest>,
) -> ApiResult<Json<User>> {
    let mut users = state.store.users().write().await;
    let actor = current_actor(&auth, &users)?;
    require_user_management(&actor)?;

    let user = users.get_user_by_id(&id)?.clone();
    let approved = approve_user(&user, &req.for_user(&id), &*users, Utc::now())?;
    users.replace(approved.clone())?;

    info!(actor_id = %actor.id, user_id = %approved.id, role = %approved.role, "Approved user");
    Ok(Json(approved))
}

/// Change an active user's role and reporting links
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a super admin
/// - `404 Not Found`: No such user
/// - `409 Conflict`: User is not active
/// - `422 Unprocessable Entity`: Role and links break a hierarchy rule
pub async fn update_hierarchy(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<HierarchyRequest>,
) -> ApiResult<Json<User>> {
    let mut users = state.store.users().write().await;
    let actor = current_actor(&auth, &users)?;
    require_user_management(&actor)?;

    if actor.id == id {
        return Err(ApiError::Conflict("Cannot change your own role".to_string()));
    }

    let user = users.get_user_by_id(&id)?.clone();
    let edited = reassign_hierarchy(&user, &req.for_user(&id), &*users, Utc::now())?;
    users.replace(edited.clone())?;

    info!(actor_id = %actor.id, user_id = %edited.id, role = %edited.role, "Updated user hierarchy");
    Ok(Json(edited))
}

/// Suspend an active user
pub async fn suspend(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let mut users = state.store.users().write().await;
    let actor = current_actor(&auth, &users)?;
    require_user_management(&actor)?;

    if actor.id == id {
        return Err(ApiError::Conflict("Cannot suspend yourself".to_string()));
    }

    let user = users.get_user_by_id(&id)?.clone();
    let suspended = suspend_user(&user, Utc::now())?;
    users.replace(suspended.clone())?;

    info!(actor_id = %actor.id, user_id = %suspended.id, "Suspended user");
    Ok(Json(suspended))
}

/// Delete a user
///
/// Reports and tasks that reference the user keep their links; lookups
/// through them report "not found" afterwards.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut users = state.store.users().write().await;
    let actor = current_actor(&auth, &users)?;
    require_user_management(&actor)?;

    if actor.id == id {
        return Err(ApiError::Conflict("Cannot delete yourself".to_string()));
    }

    let removed = users
        .remove(&id)
        .ok_or_else(|| ApiError::from(DirectoryError::NotFound(id.clone())))?;

    let dangling = users
        .list_all()
        .iter()
        .filter(|u| {
            u.supervisor_id.as_deref() == Some(removed.id.as_str())
                || u.manager_id.as_deref() == Some(removed.id.as_str())
        })
        .count();
    if dangling > 0 {
        warn!(user_id = %removed.id, dangling, "Deleted user still referenced by reports");
    }

    info!(actor_id = %actor.id, user_id = %removed.id, "Deleted user");
    Ok(StatusCode::NO_CONTENT)
}
