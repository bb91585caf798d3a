//! Group endpoints: CRUD, invite-code joins, leaving, and member management.

use actix_web::{HttpResponse, delete, get, post, put, web};
use sea_orm::ConnectionTrait;
use tracing::info;
use uuid::Uuid;

use super::parse_id;
use crate::auth::CurrentUser;
use crate::db::members::RemovalOutcome;
use crate::db::{DbPool, groups, members};
use crate::entity::{group, group_member};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateGroupRequest, Group, GroupDetail, GroupMember, GroupWithRole, JoinGroupRequest,
    MAX_NAME_LEN, MemberRole, UpdateGroupRequest, validate_http_url, validate_name,
};
use crate::services::invite_code;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_groups)
        .service(create_group)
        .service(get_group)
        .service(update_group)
        .service(delete_group)
        .service(join_group)
        .service(leave_group)
        .service(list_members)
        .service(remove_member);
}

/// Load a group the caller belongs to.
///
/// Unknown groups are `NotFound`; groups the caller is not in are `Forbidden`.
pub(crate) async fn require_member<C: ConnectionTrait>(
    db: &C,
    group_id: Uuid,
    user_id: Uuid,
) -> AppResult<(group::Model, group_member::Model)> {
    let group = groups::find_by_id(db, group_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Group".to_string()))?;
    let membership = members::find(db, group_id, user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Not a member of this group".to_string()))?;
    Ok((group, membership))
}

async fn require_admin<C: ConnectionTrait>(
    db: &C,
    group_id: Uuid,
    user_id: Uuid,
) -> AppResult<group::Model> {
    let (group, membership) = require_member(db, group_id, user_id).await?;
    if membership.role != MemberRole::Admin.as_str() {
        return Err(AppError::Forbidden(
            "Only group admins can do this".to_string(),
        ));
    }
    Ok(group)
}

fn validate_icon(url: Option<String>) -> AppResult<Option<String>> {
    url.map(|u| validate_http_url("iconUrl", &u)).transpose()
}

/// List the caller's groups, most recently joined first.
#[utoipa::path(
    get,
    path = "/api/v1/groups",
    tag = "Groups",
    responses(
        (status = 200, description = "Groups with the caller's role", body = Vec<GroupWithRole>),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[get("/groups")]
pub async fn list_groups(current: CurrentUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let rows = groups::list_for_user(pool.connection(), current.id()).await?;
    let items = rows
        .into_iter()
        .map(|(group, membership)| -> AppResult<GroupWithRole> {
            let membership = GroupMember::try_from(membership)?;
            Ok(GroupWithRole {
                group: group.into(),
                role: membership.role,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok(HttpResponse::Ok().json(items))
}

/// Create a group with the caller as its admin.
#[utoipa::path(
    post,
    path = "/api/v1/groups",
    tag = "Groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Invalid name or icon URL", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[post("/groups")]
pub async fn create_group(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateGroupRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let name = validate_name("name", &body.name, MAX_NAME_LEN)?;
    let icon_url = validate_icon(body.icon_url)?;

    let (group, _) = pool.create_group(current.id(), name, icon_url).await?;
    info!(group_id = %group.id, user_id = %current.id(), "Group created");

    Ok(HttpResponse::Created().json(Group::from(group)))
}

/// Get a group with its members.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}",
    tag = "Groups",
    params(("group_id" = Uuid, Path, description = "Group UUID")),
    responses(
        (status = 200, description = "Group with members", body = GroupDetail),
        (status = 403, description = "Caller is not a member", body = crate::error::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[get("/groups/{group_id}")]
pub async fn get_group(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let group_id = parse_id(&path, "Group")?;
    let db = pool.connection();
    let (group, _) = require_member(db, group_id, current.id()).await?;
    let members = members::list_for_group(db, group_id).await?;

    let members = members
        .into_iter()
        .map(GroupMember::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(HttpResponse::Ok().json(GroupDetail {
        group: group.into(),
        members,
    }))
}

/// Rename a group or change its icon. Admin only.
#[utoipa::path(
    put,
    path = "/api/v1/groups/{group_id}",
    tag = "Groups",
    params(("group_id" = Uuid, Path, description = "Group UUID")),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Updated group", body = Group),
        (status = 400, description = "Invalid name or icon URL", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[put("/groups/{group_id}")]
pub async fn update_group(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<UpdateGroupRequest>,
) -> AppResult<HttpResponse> {
    let group_id = parse_id(&path, "Group")?;
    let body = body.into_inner();
    let db = pool.connection();
    let group = require_admin(db, group_id, current.id()).await?;

    let name = body
        .name
        .as_deref()
        .map(|n| validate_name("name", n, MAX_NAME_LEN))
        .transpose()?;
    let icon_url = match body.icon_url {
        Some(url) => Some(validate_icon(url)?),
        None => None,
    };

    let updated = groups::update(db, group, name, icon_url).await?;
    Ok(HttpResponse::Ok().json(Group::from(updated)))
}

/// Delete a group. Its events become personal events of their creators.
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{group_id}",
    tag = "Groups",
    params(("group_id" = Uuid, Path, description = "Group UUID")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[delete("/groups/{group_id}")]
pub async fn delete_group(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let group_id = parse_id(&path, "Group")?;
    require_admin(pool.connection(), group_id, current.id()).await?;

    pool.delete_group(group_id).await?;
    info!(group_id = %group_id, user_id = %current.id(), "Group deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// Join a group with its invite code.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/join",
    tag = "Groups",
    params(("group_id" = Uuid, Path, description = "Group UUID")),
    request_body = JoinGroupRequest,
    responses(
        (status = 201, description = "Joined as member", body = GroupMember),
        (status = 404, description = "No group with this invite code", body = crate::error::ErrorResponse),
        (status = 409, description = "Already a member", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[post("/groups/{group_id}/join")]
pub async fn join_group(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<JoinGroupRequest>,
) -> AppResult<HttpResponse> {
    let group_id = parse_id(&path, "Group")?;
    let code = body.normalized_code();
    if !invite_code::is_well_formed(&code) {
        return Err(AppError::NotFound("Invite code".to_string()));
    }

    // A valid code for a different group must not reveal that group
    match groups::find_by_invite_code(pool.connection(), &code).await? {
        Some(group) if group.id == group_id => {}
        _ => return Err(AppError::NotFound("Invite code".to_string())),
    }

    let member = pool.join_group(group_id, current.id()).await?;
    info!(group_id = %group_id, user_id = %current.id(), "User joined group");

    Ok(HttpResponse::Created().json(GroupMember::try_from(member)?))
}

/// Leave a group.
///
/// The last admin's departure promotes the longest-standing member; the
/// last member's departure deletes the group.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/leave",
    tag = "Groups",
    params(("group_id" = Uuid, Path, description = "Group UUID")),
    responses(
        (status = 204, description = "Left the group"),
        (status = 404, description = "Group not found or caller not a member", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[post("/groups/{group_id}/leave")]
pub async fn leave_group(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let group_id = parse_id(&path, "Group")?;
    let outcome = pool.remove_member(group_id, current.id()).await?;
    log_removal(group_id, current.id(), outcome);
    Ok(HttpResponse::NoContent().finish())
}

/// List a group's members, longest-standing first.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}/members",
    tag = "Groups",
    params(("group_id" = Uuid, Path, description = "Group UUID")),
    responses(
        (status = 200, description = "Group members", body = Vec<GroupMember>),
        (status = 403, description = "Caller is not a member", body = crate::error::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[get("/groups/{group_id}/members")]
pub async fn list_members(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let group_id = parse_id(&path, "Group")?;
    let db = pool.connection();
    require_member(db, group_id, current.id()).await?;

    let members = members::list_for_group(db, group_id)
        .await?
        .into_iter()
        .map(GroupMember::try_from)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(HttpResponse::Ok().json(members))
}

/// Remove a member from a group. Admin only; removing oneself is a leave.
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{group_id}/members/{user_id}",
    tag = "Groups",
    params(
        ("group_id" = Uuid, Path, description = "Group UUID"),
        ("user_id" = Uuid, Path, description = "User UUID of the member to remove")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "Group or member not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
#[delete("/groups/{group_id}/members/{user_id}")]
pub async fn remove_member(
    current: CurrentUser,
    pool: web::Data<DbPool>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (raw_group_id, raw_user_id) = path.into_inner();
    let group_id = parse_id(&raw_group_id, "Group")?;
    let target = parse_id(&raw_user_id, "Membership")?;

    if target != current.id() {
        require_admin(pool.connection(), group_id, current.id()).await?;
    }

    let outcome = pool.remove_member(group_id, target).await?;
    log_removal(group_id, target, outcome);
    Ok(HttpResponse::NoContent().finish())
}

fn log_removal(group_id: Uuid, user_id: Uuid, outcome: RemovalOutcome) {
    match outcome {
        RemovalOutcome::Removed => {
            info!(group_id = %group_id, user_id = %user_id, "Member left group");
        }
        RemovalOutcome::Promoted(successor) => info!(
            group_id = %group_id,
            user_id = %user_id,
            promoted = %successor,
            "Last admin left group, member promoted"
        ),
        RemovalOutcome::GroupDeleted => {
            info!(group_id = %group_id, user_id = %user_id, "Last member left, group deleted");
        }
    }
}
