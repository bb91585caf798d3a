//! API endpoint modules.

pub mod auth;
pub mod events;
pub mod groups;
pub mod health;
pub mod openapi;
pub mod users;

use actix_web::web;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub use openapi::ApiDoc;

/// Largest accepted JSON request body.
const JSON_BODY_LIMIT: usize = 64 * 1024;

/// Register every route: `/health` at the root, the rest under `/api/v1`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health).service(
        web::scope("/api/v1")
            .app_data(json_config())
            .app_data(query_config())
            .configure(health::configure_routes)
            .configure(openapi::configure_routes)
            .configure(auth::configure_routes)
            .configure(users::configure_routes)
            .configure(groups::configure_routes)
            .configure(events::configure_routes),
    );
}

/// Undecodable bodies answer 400 with a plain-text message.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, req| {
            debug!(path = %req.path(), "Rejected request body: {}", err);
            AppError::Decode("Invalid request body".to_string()).into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid query string: {}", err)).into()
    })
}

/// Parse a path id. Anything that is not a UUID cannot name a resource.
pub(crate) fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(what.to_string()))
}
