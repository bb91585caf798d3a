//! Database operations for group memberships.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::entity::event::{self, Entity as EventEntity};
use crate::entity::group::Entity as GroupEntity;
use crate::entity::group_member::{self, ActiveModel, Entity as MemberEntity};
use crate::error::{AppError, AppResult};
use crate::models::MemberRole;

use super::{DbPool, groups, is_unique_violation};

/// What happened to a group when a member was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Membership removed; the group is otherwise unchanged.
    Removed,
    /// The last admin left and this user was promoted.
    Promoted(Uuid),
    /// The removed member was the only one, so the group was deleted.
    GroupDeleted,
}

/// Find the membership of `user_id` in `group_id`.
pub async fn find<C: ConnectionTrait>(
    db: &C,
    group_id: Uuid,
    user_id: Uuid,
) -> AppResult<Option<group_member::Model>> {
    Ok(MemberEntity::find()
        .filter(group_member::Column::GroupId.eq(group_id))
        .filter(group_member::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Members of a group, longest-standing first.
pub async fn list_for_group<C: ConnectionTrait>(
    db: &C,
    group_id: Uuid,
) -> AppResult<Vec<group_member::Model>> {
    Ok(MemberEntity::find()
        .filter(group_member::Column::GroupId.eq(group_id))
        .order_by_asc(group_member::Column::JoinedAt)
        .order_by_asc(group_member::Column::Id)
        .all(db)
        .await?)
}

/// IDs of every group the user belongs to.
pub async fn group_ids_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Vec<Uuid>> {
    Ok(MemberEntity::find()
        .select_only()
        .column(group_member::Column::GroupId)
        .filter(group_member::Column::UserId.eq(user_id))
        .into_tuple::<Uuid>()
        .all(db)
        .await?)
}

impl DbPool {
    /// Add `user_id` to `group_id` as a plain member.
    ///
    /// An existing membership, including one created by a concurrent join
    /// that wins the race on the unique index, is reported as a conflict.
    pub async fn join_group(&self, group_id: Uuid, user_id: Uuid) -> AppResult<group_member::Model> {
        if find(self.connection(), group_id, user_id).await?.is_some() {
            return Err(AppError::Conflict(
                "Already a member of this group".to_string(),
            ));
        }

        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            group_id: Set(group_id),
            user_id: Set(user_id),
            role: Set(MemberRole::Member.as_str().to_string()),
            joined_at: Set(Utc::now()),
        };

        match model.insert(self.connection()).await {
            Ok(member) => Ok(member),
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(
                "Already a member of this group".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove `user_id` from `group_id`, keeping the group administrable.
    ///
    /// Events of the group assigned to the departing member become
    /// unassigned. If the departing member was the last admin, the
    /// longest-standing remaining member (earliest join, then lowest
    /// membership id) becomes admin. If nobody remains, the group is deleted and its events are
    /// detached. The group row is locked for the duration so concurrent
    /// departures cannot both skip the promotion.
    pub async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<RemovalOutcome> {
        let txn = self.connection().begin().await?;

        GroupEntity::find_by_id(group_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Group".to_string()))?;

        let membership = find(&txn, group_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership".to_string()))?;

        let remaining = MemberEntity::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .filter(group_member::Column::Id.ne(membership.id))
            .count(&txn)
            .await?;

        if remaining == 0 {
            groups::delete_cascade(&txn, group_id).await?;
            txn.commit().await?;
            return Ok(RemovalOutcome::GroupDeleted);
        }

        let was_admin = membership.role == MemberRole::Admin.as_str();
        MemberEntity::delete_by_id(membership.id).exec(&txn).await?;

        // Former members cannot hold assignments in the group
        EventEntity::update_many()
            .col_expr(event::Column::AssigneeId, Expr::value(Option::<Uuid>::None))
            .filter(event::Column::GroupId.eq(group_id))
            .filter(event::Column::AssigneeId.eq(user_id))
            .exec(&txn)
            .await?;

        let mut outcome = RemovalOutcome::Removed;
        if was_admin {
            let admins_left = MemberEntity::find()
                .filter(group_member::Column::GroupId.eq(group_id))
                .filter(group_member::Column::Role.eq(MemberRole::Admin.as_str()))
                .count(&txn)
                .await?;

            if admins_left == 0 {
                let successor = MemberEntity::find()
                    .filter(group_member::Column::GroupId.eq(group_id))
                    .order_by_asc(group_member::Column::JoinedAt)
                    .order_by_asc(group_member::Column::Id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| AppError::Internal("No member left to promote".to_string()))?;

                let promoted_user = successor.user_id;
                let mut active: ActiveModel = successor.into();
                active.role = Set(MemberRole::Admin.as_str().to_string());
                active.update(&txn).await?;
                outcome = RemovalOutcome::Promoted(promoted_user);
            }
        }

        txn.commit().await?;
        Ok(outcome)
    }
}
