//! User administration handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use parley_store::hash_password;
use parley_types::{Group, User, UserMapping};

use crate::server::{ApiError, AppState};

/// Body of `PUT /v2/users/{username}`. The username comes from the path;
/// a supplied password is digested before storage.
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    pub password: Option<String>,
    #[serde(default)]
    pub mappings: Vec<UserMapping>,
}

/// `GET /v2/users`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.store.user_list().await?))
}

/// `GET /v2/users/{username}`
pub async fn get(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.store.user_get(&username).await?))
}

/// `PUT /v2/users/{username}` — upsert: creates the user when absent,
/// updates otherwise. An update without a password keeps the stored digest.
pub async fn put(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<UserRequest>,
) -> Result<StatusCode, ApiError> {
    let mut user = User {
        username: username.clone(),
        email: req.email,
        full_name: req.full_name,
        password_hash: req.password.as_deref().map(hash_password),
        mappings: req.mappings,
    };

    if state.store.user_exists(&username).await? {
        if user.password_hash.is_none() {
            user.password_hash = state.store.user_get(&username).await?.password_hash;
        }
        state.store.user_update(user).await?;
        Ok(StatusCode::OK)
    } else {
        state.store.user_create(user).await?;
        Ok(StatusCode::CREATED)
    }
}

/// `DELETE /v2/users/{username}`
pub async fn remove(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.user_delete(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v2/users/{username}/groups`
pub async fn groups(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Group>>, ApiError> {
    Ok(Json(state.store.user_group_list(&username).await?))
}

/// `GET /v2/users/{username}/permissions` — the effective permission set.
pub async fn permissions(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.store.user_permission_list(&username).await?))
}
