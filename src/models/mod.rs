//! Domain models and request/response payloads.

pub mod event;
pub mod group;
pub mod user;

pub use event::{CreateEventRequest, Event, EventListQuery, TimeRange, UpdateEventRequest};
pub use group::{
    CreateGroupRequest, Group, GroupDetail, GroupMember, GroupWithRole, JoinGroupRequest,
    MemberRole, UpdateGroupRequest,
};
pub use user::{
    AuthRequest, AuthResponse, ExternalIdentity, Provider, SessionClaims, UpdateUserRequest, User,
};

use crate::error::{AppError, AppResult};

/// Maximum length of user and group names, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Serde helper distinguishing an absent field from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option::deserialize")]`:
/// a missing field stays `None`, `null` becomes `Some(None)` and a value
/// becomes `Some(Some(v))`.
pub mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Trim a display name and check it is non-empty and within `max` characters.
pub fn validate_name(field: &str, value: &str, max: usize) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

/// Check that `value` is an absolute http(s) URL.
pub fn validate_http_url(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    match reqwest::Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(trimmed.to_string())
        }
        _ => Err(AppError::Validation(format!(
            "{} must be an absolute http(s) URL",
            field
        ))),
    }
}
