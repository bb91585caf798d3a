//! Calendar event models and query parameters.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::double_option;
use crate::error::{AppError, AppResult};

/// Maximum event title length, in characters.
pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Uuid>,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub is_from_google: bool,
    pub is_shared: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::event::Model> for Event {
    fn from(m: crate::entity::event::Model) -> Self {
        Self {
            id: m.id,
            group_id: m.group_id,
            title: m.title,
            start_at: m.start_at,
            end_at: m.end_at,
            assignee_id: m.assignee_id,
            memo: m.memo,
            is_from_google: m.is_from_google,
            is_shared: m.is_shared,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub group_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub memo: Option<String>,
    /// Defaults to true for group events.
    pub is_shared: Option<bool>,
    #[serde(default)]
    pub is_from_google: bool,
}

/// Partial event update. Nullable fields accept `null` to clear them.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub group_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub assignee_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option::deserialize")]
    #[schema(value_type = Option<String>, nullable)]
    pub memo: Option<Option<String>>,
    pub is_shared: Option<bool>,
}

/// Query parameters for `GET /events`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    /// Restrict to one group the caller belongs to.
    pub group_id: Option<String>,
    /// Inclusive lower bound (RFC 3339 or YYYY-MM-DD).
    pub start_date: Option<String>,
    /// Exclusive upper bound (RFC 3339 or YYYY-MM-DD; a date covers the whole day).
    pub end_date: Option<String>,
}

/// Half-open time window `[start, end)`; either side may be unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl EventListQuery {
    /// Parsed group filter. Blank means no filter.
    pub fn group_filter(&self) -> AppResult<Option<Uuid>> {
        match self.group_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Uuid::parse_str(raw)
                .map(Some)
                .map_err(|_| AppError::Validation("groupId must be a UUID".to_string())),
        }
    }

    pub fn time_range(&self) -> AppResult<TimeRange> {
        let start = parse_bound("startDate", self.start_date.as_deref(), false)?;
        let end = parse_bound("endDate", self.end_date.as_deref(), true)?;
        if let (Some(s), Some(e)) = (start, end)
            && s > e
        {
            return Err(AppError::Validation(
                "startDate must not be after endDate".to_string(),
            ));
        }
        Ok(TimeRange { start, end })
    }
}

fn parse_bound(field: &str, raw: Option<&str>, is_end: bool) -> AppResult<Option<DateTime<Utc>>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!(
            "{} must be an RFC 3339 timestamp or a YYYY-MM-DD date",
            field
        ))
    })?;
    // A date-only end bound covers that whole day
    let date = if is_end {
        date.checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::Validation(format!("{} is out of range", field)))?
    } else {
        date
    };
    Ok(Some(date.and_time(NaiveTime::MIN).and_utc()))
}

/// Check title and time ordering of a (possibly merged) event.
pub fn validate_event_fields(
    title: &str,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
) -> AppResult<String> {
    let title = super::validate_name("title", title, MAX_TITLE_LEN)?;
    if start_at > end_at {
        return Err(AppError::Validation(
            "startAt must not be after endAt".to_string(),
        ));
    }
    Ok(title)
}
