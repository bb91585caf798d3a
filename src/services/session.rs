//! Session credentials: HS256 JWTs issued after a successful sign-in.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::config::SessionSettings;
use crate::error::{AppError, AppResult};
use crate::models::SessionClaims;

/// Session JWT issuer.
pub const SESSION_ISSUER: &str = "ourcalendar";

/// Token type reported alongside issued credentials.
pub const TOKEN_TYPE: &str = "Bearer";

/// Issue a session token for `user_id`.
pub fn create_access_token(user_id: Uuid, settings: &SessionSettings) -> AppResult<String> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = SessionClaims {
        sub: user_id.to_string(),
        iss: SESSION_ISSUER.to_string(),
        exp: now + settings.ttl_secs as usize,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create session token: {}", e)))
}

/// Verify a session token and return the user id it was issued for.
pub fn verify_session_token(token: &str, secret: &SecretString) -> AppResult<Uuid> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map_err(|e| AppError::Unauthorized(format!("Invalid session token: {}", e)))?;

    Uuid::parse_str(&data.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid session token subject".to_string()))
}
