//! Session authentication for protected routes.

mod extractor;

use actix_web::HttpRequest;
use actix_web::http::header::AUTHORIZATION;

pub use extractor::CurrentUser;

/// Bearer token from the `Authorization` header, if present and well-formed.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|token| !token.is_empty())
}
