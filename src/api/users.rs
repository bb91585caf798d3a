//! Profile endpoints for the signed-in user.

use actix_web::{HttpResponse, get, put, web};

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{MAX_NAME_LEN, UpdateUserRequest, User, validate_http_url, validate_name};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_me).service(update_me);
}

/// Get the signed-in user.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[get("/users/me")]
pub async fn get_me(current: CurrentUser) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(User::from(current.user)))
}

/// Update the signed-in user's name or avatar.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    tag = "Users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid name or avatar URL", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[put("/users/me")]
pub async fn update_me(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();

    let name = body
        .name
        .as_deref()
        .map(|n| validate_name("name", n, MAX_NAME_LEN))
        .transpose()?;
    let avatar_url = match body.avatar_url {
        Some(Some(url)) => Some(Some(validate_http_url("avatarUrl", &url)?)),
        other => other,
    };

    let updated =
        crate::db::users::update_profile(pool.connection(), current.user, name, avatar_url).await?;
    Ok(HttpResponse::Ok().json(User::from(updated)))
}
