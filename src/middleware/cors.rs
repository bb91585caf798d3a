//! CORS policy.

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};

use super::REQUEST_ID_HEADER;
use crate::config::CorsSettings;

/// Build the CORS middleware for the configured environment.
///
/// Development accepts any origin; production only the configured ones.
pub fn cors_policy(settings: &CorsSettings) -> Cors {
    let cors = if settings.permissive {
        Cors::default().allow_any_origin()
    } else {
        settings
            .allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
        ])
        .expose_headers(vec![header::LINK, HeaderName::from_static(REQUEST_ID_HEADER)])
        .supports_credentials()
        .max_age(300)
}
