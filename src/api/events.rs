//! Event endpoints.
//!
//! An event is visible to its creator and, when it belongs to a group, to
//! every member of that group. Visible events may be changed by anyone who
//! can see them, except events imported from Google, which only their
//! creator may change.

use actix_web::{HttpResponse, delete, get, post, put, web};
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use super::parse_id;
use crate::auth::CurrentUser;
use crate::db::events::{EventChanges, NewEvent, Visibility};
use crate::db::{DbPool, events, members};
use crate::entity::event;
use crate::error::{AppError, AppResult};
use crate::models::event::validate_event_fields;
use crate::models::{CreateEventRequest, Event, EventListQuery, UpdateEventRequest};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_events)
        .service(create_event)
        .service(get_event)
        .service(update_event)
        .service(delete_event);
}

async fn is_visible<C: ConnectionTrait>(db: &C, event: &event::Model, user_id: Uuid) -> AppResult<bool> {
    if event.created_by == user_id {
        return Ok(true);
    }
    match event.group_id {
        Some(group_id) => Ok(members::find(db, group_id, user_id).await?.is_some()),
        None => Ok(false),
    }
}

/// Whether a caller who can see `event` may also change it.
fn may_mutate(event: &event::Model, user_id: Uuid) -> bool {
    !event.is_from_google || event.created_by == user_id
}

async fn require_group_member<C: ConnectionTrait>(
    db: &C,
    group_id: Uuid,
    user_id: Uuid,
) -> AppResult<()> {
    match members::find(db, group_id, user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Forbidden(
            "Not a member of this group".to_string(),
        )),
    }
}

/// Group events may be assigned to any member; personal events only to the
/// creator.
async fn validate_assignee<C: ConnectionTrait>(
    db: &C,
    group_id: Option<Uuid>,
    assignee_id: Option<Uuid>,
    creator: Uuid,
) -> AppResult<()> {
    let assignee = match assignee_id {
        Some(id) => id,
        None => return Ok(()),
    };
    let allowed = match group_id {
        Some(group_id) => members::find(db, group_id, assignee).await?.is_some(),
        None => assignee == creator,
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::Validation(
            "assigneeId must be a member of the event's group".to_string(),
        ))
    }
}

/// List visible events overlapping a time range.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    params(EventListQuery),
    responses(
        (status = 200, description = "Events ordered by start time", body = Vec<Event>),
        (status = 400, description = "Invalid query", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not a member of groupId", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[get("/events")]
pub async fn list_events(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    query: web::Query<EventListQuery>,
) -> AppResult<HttpResponse> {
    let group_filter = query.group_filter()?;
    let range = query.time_range()?;
    let db = pool.connection();

    let rows = match group_filter {
        Some(group_id) => {
            require_group_member(db, group_id, current.id()).await?;
            events::list(db, Visibility::Group(group_id), range).await?
        }
        None => {
            let group_ids = members::group_ids_for_user(db, current.id()).await?;
            let scope = Visibility::User {
                user_id: current.id(),
                group_ids: &group_ids,
            };
            events::list(db, scope, range).await?
        }
    };

    let items: Vec<Event> = rows.into_iter().map(Event::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// Create an event, personal or in one of the caller's groups.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid event", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not a member of groupId", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[post("/events")]
pub async fn create_event(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateEventRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let db = pool.connection();
    let title = validate_event_fields(&body.title, body.start_at, body.end_at)?;

    if let Some(group_id) = body.group_id {
        require_group_member(db, group_id, current.id()).await?;
    }
    validate_assignee(db, body.group_id, body.assignee_id, current.id()).await?;

    // Personal events have nobody to be shared with
    let is_shared = body.group_id.is_some() && body.is_shared.unwrap_or(true);

    let created = events::insert(
        db,
        NewEvent {
            group_id: body.group_id,
            title,
            start_at: body.start_at,
            end_at: body.end_at,
            assignee_id: body.assignee_id,
            memo: body.memo,
            is_from_google: body.is_from_google,
            is_shared,
            created_by: current.id(),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(Event::from(created)))
}

/// Get an event.
#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}",
    tag = "Events",
    params(("event_id" = Uuid, Path, description = "Event UUID")),
    responses(
        (status = 200, description = "The event", body = Event),
        (status = 403, description = "Event is not visible to the caller", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[get("/events/{event_id}")]
pub async fn get_event(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let event_id = parse_id(&path, "Event")?;
    let db = pool.connection();
    let event = events::find_by_id(db, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event".to_string()))?;

    if !is_visible(db, &event, current.id()).await? {
        return Err(AppError::Forbidden(
            "You do not have access to this event".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(Event::from(event)))
}

/// Partially update an event.
#[utoipa::path(
    put,
    path = "/api/v1/events/{event_id}",
    tag = "Events",
    params(("event_id" = Uuid, Path, description = "Event UUID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = Event),
        (status = 400, description = "Invalid event", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller may not change this event", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[put("/events/{event_id}")]
pub async fn update_event(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<UpdateEventRequest>,
) -> AppResult<HttpResponse> {
    let event_id = parse_id(&path, "Event")?;
    let body = body.into_inner();
    let db = pool.connection();
    let existing = events::find_by_id(db, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event".to_string()))?;

    if !is_visible(db, &existing, current.id()).await? || !may_mutate(&existing, current.id()) {
        return Err(AppError::Forbidden(
            "You may not change this event".to_string(),
        ));
    }

    let group_id = body.group_id.unwrap_or(existing.group_id);
    if group_id != existing.group_id
        && let Some(new_group) = group_id
    {
        require_group_member(db, new_group, current.id()).await?;
    }

    let title = body.title.unwrap_or_else(|| existing.title.clone());
    let start_at = body.start_at.unwrap_or(existing.start_at);
    let end_at = body.end_at.unwrap_or(existing.end_at);
    let title = validate_event_fields(&title, start_at, end_at)?;

    // Only a body that touches the assignment re-checks it
    let assignment_changed = body.assignee_id.is_some() || body.group_id.is_some();
    let assignee_id = body.assignee_id.unwrap_or(existing.assignee_id);
    if assignment_changed {
        validate_assignee(db, group_id, assignee_id, existing.created_by).await?;
    }

    let is_shared = match (group_id, body.is_shared) {
        (None, _) => false,
        (Some(_), Some(shared)) => shared,
        (Some(_), None) if group_id != existing.group_id => true,
        (Some(_), None) => existing.is_shared,
    };

    let changes = EventChanges {
        group_id,
        title,
        start_at,
        end_at,
        assignee_id,
        memo: body.memo.unwrap_or_else(|| existing.memo.clone()),
        is_shared,
    };

    let updated = events::update(db, existing, changes).await?;
    Ok(HttpResponse::Ok().json(Event::from(updated)))
}

/// Delete an event.
///
/// Answers 204 whether or not the event existed; events the caller cannot
/// see are left untouched.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{event_id}",
    tag = "Events",
    params(("event_id" = Uuid, Path, description = "Event UUID")),
    responses(
        (status = 204, description = "Event deleted or absent"),
        (status = 403, description = "Caller may not change this event", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[delete("/events/{event_id}")]
pub async fn delete_event(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let event_id = match Uuid::parse_str(&path) {
        Ok(id) => id,
        Err(_) => return Ok(HttpResponse::NoContent().finish()),
    };
    let db = pool.connection();

    if let Some(existing) = events::find_by_id(db, event_id).await?
        && is_visible(db, &existing, current.id()).await?
    {
        if !may_mutate(&existing, current.id()) {
            return Err(AppError::Forbidden(
                "You may not change this event".to_string(),
            ));
        }
        events::delete(db, event_id).await?;
    }

    Ok(HttpResponse::NoContent().finish())
}
