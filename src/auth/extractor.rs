//! Actix-web extractor resolving the signed-in user from a session token.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;

use super::bearer_token;
use crate::config::Config;
use crate::db::DbPool;
use crate::entity::user;
use crate::error::AppError;
use crate::services::session;

/// The authenticated caller.
///
/// Requires `Authorization: Bearer <session token>` naming an existing user:
/// ```ignore
/// async fn handler(current: CurrentUser) -> impl Responder {
///     // current.user is the caller's row
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: user::Model,
}

impl CurrentUser {
    pub fn id(&self) -> uuid::Uuid {
        self.user.id
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let config = req.app_data::<web::Data<Config>>().cloned();
        let pool = req.app_data::<web::Data<DbPool>>().cloned();
        let token = bearer_token(req).map(str::to_string);

        Box::pin(async move {
            let (config, pool) = match (config, pool) {
                (Some(config), Some(pool)) => (config, pool),
                _ => {
                    return Err(AppError::Internal(
                        "Authentication state not configured".to_string(),
                    ));
                }
            };

            let token = token.ok_or_else(|| {
                AppError::Unauthorized("Missing bearer token".to_string())
            })?;
            let user_id = session::verify_session_token(&token, &config.session.secret)?;

            let user = crate::db::users::find_by_id(pool.connection(), user_id)
                .await?
                .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

            Ok(CurrentUser { user })
        })
    }
}
