//! Group administration handlers: membership and role links.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use parley_types::{Group, Role, User};

use crate::server::{ApiError, AppState};

/// `GET /v2/groups`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Group>>, ApiError> {
    Ok(Json(state.store.group_list().await?))
}

/// `GET /v2/groups/{name}`
pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Group>, ApiError> {
    Ok(Json(state.store.group_get(&name).await?))
}

/// `PUT /v2/groups/{name}` — create an empty group.
pub async fn create(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .group_create(Group {
            name,
            ..Default::default()
        })
        .await?;
    Ok(StatusCode::CREATED)
}

/// `DELETE /v2/groups/{name}`
pub async fn remove(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.group_delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v2/groups/{name}/members`
pub async fn members(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<User>>, ApiError> {
    let group = state.store.group_get(&name).await?;
    let mut users = Vec::with_capacity(group.users.len());
    for username in &group.users {
        if let Ok(user) = state.store.user_get(username).await {
            users.push(user);
        }
    }
    Ok(Json(users))
}

/// `PUT /v2/groups/{name}/members/{username}`
pub async fn add_member(
    State(state): State<AppState>,
    Path((name, username)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.group_add_user(&name, &username).await?;
    Ok(StatusCode::OK)
}

/// `DELETE /v2/groups/{name}/members/{username}`
pub async fn remove_member(
    State(state): State<AppState>,
    Path((name, username)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.group_remove_user(&name, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v2/groups/{name}/roles`
pub async fn role_list(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Role>>, ApiError> {
    Ok(Json(state.store.group_role_list(&name).await?))
}

/// `PUT /v2/groups/{name}/roles/{rolename}`
pub async fn grant_role(
    State(state): State<AppState>,
    Path((name, rolename)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.group_grant_role(&name, &rolename).await?;
    Ok(StatusCode::OK)
}

/// `DELETE /v2/groups/{name}/roles/{rolename}`
pub async fn revoke_role(
    State(state): State<AppState>,
    Path((name, rolename)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.group_revoke_role(&name, &rolename).await?;
    Ok(StatusCode::NO_CONTENT)
}
