//! Sign-in endpoints.
//!
//! The client obtains an access token from Google or LINE and exchanges it
//! here for a session token:
//! 1. POST /auth/google: verify a Google access token
//! 2. POST /auth/line: verify a LINE access token

use actix_web::{HttpResponse, post, web};
use secrecy::SecretString;
use tracing::info;

use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{AuthRequest, AuthResponse, Provider};
use crate::services::{IdentityVerifier, session};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(google_sign_in).service(line_sign_in);
}

/// Sign in with a Google access token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/google",
    tag = "Auth",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Malformed body or empty token"),
        (status = 401, description = "Token rejected by Google", body = crate::error::ErrorResponse),
    )
)]
#[post("/auth/google")]
pub async fn google_sign_in(
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
    verifier: web::Data<IdentityVerifier>,
    body: web::Json<AuthRequest>,
) -> AppResult<HttpResponse> {
    sign_in(Provider::Google, body.into_inner(), &config, &pool, &verifier).await
}

/// Sign in with a LINE access token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/line",
    tag = "Auth",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Malformed body or empty token"),
        (status = 401, description = "Token rejected by LINE", body = crate::error::ErrorResponse),
    )
)]
#[post("/auth/line")]
pub async fn line_sign_in(
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
    verifier: web::Data<IdentityVerifier>,
    body: web::Json<AuthRequest>,
) -> AppResult<HttpResponse> {
    sign_in(Provider::Line, body.into_inner(), &config, &pool, &verifier).await
}

async fn sign_in(
    provider: Provider,
    request: AuthRequest,
    config: &Config,
    pool: &DbPool,
    verifier: &IdentityVerifier,
) -> AppResult<HttpResponse> {
    let token = SecretString::from(request.token);
    let identity = verifier.verify(provider, &token).await?;

    let user = crate::db::users::upsert_from_identity(pool.connection(), &identity).await?;
    let access_token = session::create_access_token(user.id, &config.session)?;

    info!(provider = %provider, user_id = %user.id, "User signed in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        user: user.into(),
        access_token,
        token_type: session::TOKEN_TYPE.to_string(),
        expires_in: config.session.ttl_secs as i64,
    }))
}
