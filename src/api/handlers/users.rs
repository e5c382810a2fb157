//! Profile and account endpoints, all behind the authorization gate.

use crate::{
    api::{error::ApiError, handlers::UserProfile},
    auth::Principal,
    store::{self, LoginEvent, UserSummary},
};
use axum::{extract::Extension, response::IntoResponse, Json};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;
use utoipa::ToSchema;

/// Login history page size.
const RECENT_LOGINS_LIMIT: i64 = 10;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateNameRequest {
    username: String,
}

#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Current user profile", body = UserProfile),
        (status = 401, description = "Missing or invalid bearer token", body = crate::api::error::ErrorBody),
        (status = 404, description = "Resolved identity no longer exists", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn profile(
    pool: Extension<PgPool>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(user) = store::find_by_id(&pool, principal.user_id).await? else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    Ok(Json(UserProfile::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/users/update-name",
    request_body = UpdateNameRequest,
    responses(
        (status = 200, description = "Updated user profile", body = UserProfile),
        (status = 400, description = "Missing username", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn update_name(
    pool: Extension<PgPool>,
    Extension(principal): Extension<Principal>,
    payload: Option<Json<UpdateNameRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    if request.username.trim().is_empty() {
        return Err(ApiError::Validation("Username is required".to_string()));
    }

    let Some(user) =
        store::update_username(&pool, principal.user_id, request.username.trim()).await?
    else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    Ok(Json(UserProfile::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/logins",
    responses(
        (status = 200, description = "Up to 10 most recent login events, newest first", body = [LoginEvent]),
        (status = 401, description = "Missing or invalid bearer token", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn logins(
    pool: Extension<PgPool>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let events = store::recent_logins(&pool, principal.user_id, RECENT_LOGINS_LIMIT).await?;

    Ok(Json(events))
}

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All user summaries", body = [UserSummary]),
        (status = 401, description = "Missing or invalid bearer token", body = crate::api::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn list_users(
    pool: Extension<PgPool>,
    Extension(_principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let users = store::list_users(&pool).await?;

    Ok(Json(users))
}
