//! Role administration handlers: permission grants.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use parley_types::{Role, RolePermission};

use crate::server::{ApiError, AppState};

/// `GET /v2/roles`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Role>>, ApiError> {
    Ok(Json(state.store.role_list().await?))
}

/// `GET /v2/roles/{name}`
pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Role>, ApiError> {
    Ok(Json(state.store.role_get(&name).await?))
}

/// `PUT /v2/roles/{name}`
pub async fn create(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.role_create(&name).await?;
    Ok(StatusCode::CREATED)
}

/// `DELETE /v2/roles/{name}`
pub async fn remove(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.role_delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v2/roles/{name}/permissions`
pub async fn permission_list(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<RolePermission>>, ApiError> {
    Ok(Json(state.store.role_permission_list(&name).await?))
}

/// `PUT /v2/roles/{name}/permissions/{bundle}/{permission}`
pub async fn grant_permission(
    State(state): State<AppState>,
    Path((name, bundle, permission)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .role_grant_permission(&name, &bundle, &permission)
        .await?;
    Ok(StatusCode::OK)
}

/// `DELETE /v2/roles/{name}/permissions/{bundle}/{permission}`
pub async fn revoke_permission(
    State(state): State<AppState>,
    Path((name, bundle, permission)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .role_revoke_permission(&name, &bundle, &permission)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
