//! Bundle administration handlers: versions, enablement.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use parley_types::Bundle;

use crate::server::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// When true, list only enabled bundle versions.
    #[serde(default)]
    pub enabled: bool,
}

/// `GET /v2/bundles[?enabled=true]`
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Bundle>>, ApiError> {
    let bundles = if params.enabled {
        state.store.bundle_list_enabled().await?
    } else {
        state.store.bundle_list().await?
    };
    Ok(Json(bundles))
}

/// `GET /v2/bundles/{name}/versions/{version}`
pub async fn get(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<Json<Bundle>, ApiError> {
    Ok(Json(state.store.bundle_get(&name, &version).await?))
}

/// `PUT /v2/bundles/{name}/versions/{version}` — upsert a bundle version.
/// The path segments override whatever the body says.
pub async fn put(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
    Json(mut bundle): Json<Bundle>,
) -> Result<StatusCode, ApiError> {
    bundle.name = name.clone();
    bundle.version = version.clone();

    match state.store.bundle_get(&name, &version).await {
        Ok(_) => {
            state.store.bundle_update(bundle).await?;
            Ok(StatusCode::OK)
        }
        Err(parley_store::DataAccessError::NoSuchBundle) => {
            state.store.bundle_create(bundle).await?;
            Ok(StatusCode::CREATED)
        }
        Err(other) => Err(other.into()),
    }
}

/// `DELETE /v2/bundles/{name}/versions/{version}` — removes the version and
/// every rule its commands carried.
pub async fn remove(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.bundle_delete(&name, &version).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /v2/bundles/{name}/versions/{version}/enable`
pub async fn enable(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.bundle_enable(&name, &version).await?;
    Ok(StatusCode::OK)
}

/// `POST /v2/bundles/{name}/versions/{version}/disable`
pub async fn disable(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.bundle_disable(&name, &version).await?;
    Ok(StatusCode::OK)
}
