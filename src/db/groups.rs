//! Database operations for groups.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::entity::event::{self, Entity as EventEntity};
use crate::entity::group::{self, ActiveModel, Entity as GroupEntity};
use crate::entity::group_member::{self, Entity as MemberEntity};
use crate::error::{AppError, AppResult};
use crate::models::MemberRole;
use crate::services::invite_code;

use super::{DbPool, is_unique_violation};

/// Attempts at drawing an unused invite code before giving up.
const MAX_INVITE_CODE_ATTEMPTS: usize = 5;

/// Find a group by ID.
pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<group::Model>> {
    Ok(GroupEntity::find_by_id(id).one(db).await?)
}

/// Find a group by its (normalized) invite code.
pub async fn find_by_invite_code<C: ConnectionTrait>(
    db: &C,
    code: &str,
) -> AppResult<Option<group::Model>> {
    Ok(GroupEntity::find()
        .filter(group::Column::InviteCode.eq(code))
        .one(db)
        .await?)
}

/// Groups the user belongs to, paired with the membership row.
///
/// Most recently joined first; ties broken by group id.
pub async fn list_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> AppResult<Vec<(group::Model, group_member::Model)>> {
    let rows = MemberEntity::find()
        .filter(group_member::Column::UserId.eq(user_id))
        .order_by_desc(group_member::Column::JoinedAt)
        .order_by_asc(group_member::Column::GroupId)
        .find_also_related(GroupEntity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(member, group)| group.map(|g| (g, member)))
        .collect())
}

/// Apply a group update. `icon_url` of `Some(None)` clears the icon.
pub async fn update<C: ConnectionTrait>(
    db: &C,
    existing: group::Model,
    name: Option<String>,
    icon_url: Option<Option<String>>,
) -> AppResult<group::Model> {
    let mut active: ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(icon_url) = icon_url {
        active.icon_url = Set(icon_url);
    }
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

/// Delete a group, its memberships, and detach its events.
///
/// Detached events become personal events of their creators, stop being
/// shared, and lose any assignee other than the creator. Run inside a
/// transaction.
pub(crate) async fn delete_cascade<C: ConnectionTrait>(db: &C, group_id: Uuid) -> Result<(), DbErr> {
    // A personal event may only be assigned to its creator
    EventEntity::update_many()
        .col_expr(event::Column::AssigneeId, Expr::value(Option::<Uuid>::None))
        .filter(event::Column::GroupId.eq(group_id))
        .filter(Expr::col(event::Column::AssigneeId).ne(Expr::col(event::Column::CreatedBy)))
        .exec(db)
        .await?;

    EventEntity::update_many()
        .col_expr(event::Column::GroupId, Expr::value(Option::<Uuid>::None))
        .col_expr(event::Column::IsShared, Expr::value(false))
        .col_expr(event::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(event::Column::GroupId.eq(group_id))
        .exec(db)
        .await?;

    MemberEntity::delete_many()
        .filter(group_member::Column::GroupId.eq(group_id))
        .exec(db)
        .await?;

    GroupEntity::delete_by_id(group_id).exec(db).await?;
    Ok(())
}

impl DbPool {
    /// Create a group with a fresh invite code and make the creator its admin.
    pub async fn create_group(
        &self,
        creator: Uuid,
        name: String,
        icon_url: Option<String>,
    ) -> AppResult<(group::Model, group_member::Model)> {
        for attempt in 1..=MAX_INVITE_CODE_ATTEMPTS {
            let code = invite_code::generate();
            match self
                .try_create_group(creator, &name, icon_url.as_deref(), &code)
                .await
            {
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!(attempt, "Invite code collision, retrying");
                }
                result => return Ok(result?),
            }
        }

        Err(AppError::Internal(
            "Could not allocate a unique invite code".to_string(),
        ))
    }

    async fn try_create_group(
        &self,
        creator: Uuid,
        name: &str,
        icon_url: Option<&str>,
        code: &str,
    ) -> Result<(group::Model, group_member::Model), DbErr> {
        let now = Utc::now();
        let txn = self.connection().begin().await?;

        let group = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            icon_url: Set(icon_url.map(str::to_string)),
            invite_code: Set(code.to_string()),
            created_by: Set(creator),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let member = group_member::ActiveModel {
            id: Set(Uuid::new_v4()),
            group_id: Set(group.id),
            user_id: Set(creator),
            role: Set(MemberRole::Admin.as_str().to_string()),
            joined_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok((group, member))
    }

    /// Delete a group, its memberships, and detach its events atomically.
    pub async fn delete_group(&self, group_id: Uuid) -> AppResult<()> {
        let txn = self.connection().begin().await?;
        delete_cascade(&txn, group_id).await?;
        txn.commit().await?;
        Ok(())
    }
}
