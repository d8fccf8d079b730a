//! Session authentication: token issuance, invalidation, and the bearer
//! middleware guarding the rest of the API.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use parley_store::verify_password;
use parley_types::Token;

use crate::server::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

/// `POST /v2/auth` — exchange username+password for a session token. The
/// only unauthenticated route. Every failure mode is the same 401 so the
/// response doesn't reveal which part was wrong.
pub async fn authenticate(
    State(state): State<AppState>,
    Json(req): Json<AuthRequest>,
) -> Result<Json<Token>, ApiError> {
    let unauthorized = || {
        ApiError(
            StatusCode::UNAUTHORIZED,
            "invalid username or password".to_string(),
        )
    };

    let user = state
        .store
        .user_get(&req.username)
        .await
        .map_err(|_| unauthorized())?;

    let valid = user
        .password_hash
        .as_deref()
        .is_some_and(|hash| verify_password(&req.password, hash));
    if !valid {
        warn!(username = %req.username, "failed authentication attempt");
        return Err(unauthorized());
    }

    let token = state
        .store
        .token_generate(&req.username, state.token_lifetime)
        .await?;
    Ok(Json(token))
}

/// `DELETE /v2/auth` — invalidate the caller's own token.
pub async fn invalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or_else(|| {
        ApiError(
            StatusCode::UNAUTHORIZED,
            "missing bearer token".to_string(),
        )
    })?;
    state.store.token_invalidate(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Middleware: admit the request only when it carries a live bearer token.
pub async fn require_token(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let token = bearer_token(req.headers());
    match token {
        Some(token) if state.store.token_evaluate(token).await => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            "invalid or missing bearer token",
        )
            .into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
