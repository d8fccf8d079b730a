//! The `/v2` administrative REST surface.
//!
//! Every route except `POST /v2/auth` sits behind the bearer-token
//! middleware in [`auth`]. Handlers are thin: they adapt JSON bodies and
//! path segments onto the data-access capability and map its error taxonomy
//! onto HTTP statuses.

pub mod auth;
pub mod bundles;
pub mod groups;
pub mod roles;
pub mod users;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::Router;
use chrono::Duration;

use parley_store::{DataAccess, DataAccessError};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataAccess>,
    /// Lifetime applied to tokens issued by `POST /v2/auth`.
    pub token_lifetime: Duration,
}

/// An HTTP-mapped error: status code plus a plain-text message.
#[derive(Debug)]
pub struct ApiError(pub StatusCode, pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

impl From<DataAccessError> for ApiError {
    fn from(err: DataAccessError) -> Self {
        use DataAccessError::*;
        let status = match err {
            EmptyUserName | EmptyGroupName | EmptyRoleName | EmptyBundleName
            | InvalidBundleVersion => StatusCode::BAD_REQUEST,
            NoSuchUser | NoSuchGroup | NoSuchRole | NoSuchBundle | NoSuchToken => {
                StatusCode::NOT_FOUND
            }
            UserExists | GroupExists | RoleExists | BundleExists | BundleNotEnabled => {
                StatusCode::CONFLICT
            }
            DataStoreUnavailable(_) | Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        };
        ApiError(status, err.to_string())
    }
}

/// Build the full `/v2` router.
pub fn router(state: AppState) -> Router {
    let public = Router::new().route("/v2/auth", post(auth::authenticate));

    let protected = Router::new()
        .route("/v2/auth", delete(auth::invalidate))
        // users
        .route("/v2/users", get(users::list))
        .route(
            "/v2/users/{username}",
            get(users::get).put(users::put).delete(users::remove),
        )
        .route("/v2/users/{username}/groups", get(users::groups))
        .route("/v2/users/{username}/permissions", get(users::permissions))
        // groups
        .route("/v2/groups", get(groups::list))
        .route(
            "/v2/groups/{name}",
            get(groups::get).put(groups::create).delete(groups::remove),
        )
        .route("/v2/groups/{name}/members", get(groups::members))
        .route(
            "/v2/groups/{name}/members/{username}",
            put(groups::add_member).delete(groups::remove_member),
        )
        .route("/v2/groups/{name}/roles", get(groups::role_list))
        .route(
            "/v2/groups/{name}/roles/{rolename}",
            put(groups::grant_role).delete(groups::revoke_role),
        )
        // roles
        .route("/v2/roles", get(roles::list))
        .route(
            "/v2/roles/{name}",
            get(roles::get).put(roles::create).delete(roles::remove),
        )
        .route("/v2/roles/{name}/permissions", get(roles::permission_list))
        .route(
            "/v2/roles/{name}/permissions/{bundle}/{permission}",
            put(roles::grant_permission).delete(roles::revoke_permission),
        )
        // bundles
        .route("/v2/bundles", get(bundles::list))
        .route(
            "/v2/bundles/{name}/versions/{version}",
            get(bundles::get).put(bundles::put).delete(bundles::remove),
        )
        .route(
            "/v2/bundles/{name}/versions/{version}/enable",
            post(bundles::enable),
        )
        .route(
            "/v2/bundles/{name}/versions/{version}/disable",
            post(bundles::disable),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    public.merge(protected).with_state(state)
}
