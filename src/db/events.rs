//! Database operations for calendar events.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::event::{self, ActiveModel, Entity as EventEntity};
use crate::error::AppResult;
use crate::models::TimeRange;

/// Fields of an event to be inserted.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub group_id: Option<Uuid>,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub assignee_id: Option<Uuid>,
    pub memo: Option<String>,
    pub is_from_google: bool,
    pub is_shared: bool,
    pub created_by: Uuid,
}

/// Final values of the mutable event fields after merging an update.
#[derive(Debug, Clone)]
pub struct EventChanges {
    pub group_id: Option<Uuid>,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub assignee_id: Option<Uuid>,
    pub memo: Option<String>,
    pub is_shared: bool,
}

/// Which events a listing may return.
#[derive(Debug, Clone)]
pub enum Visibility<'a> {
    /// Events of a single group.
    Group(Uuid),
    /// The caller's own events plus those of any group they belong to.
    User { user_id: Uuid, group_ids: &'a [Uuid] },
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<event::Model>> {
    Ok(EventEntity::find_by_id(id).one(db).await?)
}

/// Events visible under `scope` that overlap `range`, by start time then id.
pub async fn list<C: ConnectionTrait>(
    db: &C,
    scope: Visibility<'_>,
    range: TimeRange,
) -> AppResult<Vec<event::Model>> {
    let scope_condition = match scope {
        Visibility::Group(group_id) => Condition::all().add(event::Column::GroupId.eq(group_id)),
        Visibility::User { user_id, group_ids } => {
            let mut any = Condition::any().add(event::Column::CreatedBy.eq(user_id));
            if !group_ids.is_empty() {
                any = any.add(event::Column::GroupId.is_in(group_ids.iter().copied()));
            }
            any
        }
    };

    let mut query = EventEntity::find().filter(scope_condition);
    if let Some(start) = range.start {
        query = query.filter(event::Column::EndAt.gte(start));
    }
    if let Some(end) = range.end {
        query = query.filter(event::Column::StartAt.lt(end));
    }

    Ok(query
        .order_by_asc(event::Column::StartAt)
        .order_by_asc(event::Column::Id)
        .all(db)
        .await?)
}

pub async fn insert<C: ConnectionTrait>(db: &C, new: NewEvent) -> AppResult<event::Model> {
    let now = Utc::now();
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        group_id: Set(new.group_id),
        title: Set(new.title),
        start_at: Set(new.start_at),
        end_at: Set(new.end_at),
        assignee_id: Set(new.assignee_id),
        memo: Set(new.memo),
        is_from_google: Set(new.is_from_google),
        is_shared: Set(new.is_shared),
        created_by: Set(new.created_by),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(model.insert(db).await?)
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    existing: event::Model,
    changes: EventChanges,
) -> AppResult<event::Model> {
    let mut active: ActiveModel = existing.into();
    active.group_id = Set(changes.group_id);
    active.title = Set(changes.title);
    active.start_at = Set(changes.start_at);
    active.end_at = Set(changes.end_at);
    active.assignee_id = Set(changes.assignee_id);
    active.memo = Set(changes.memo);
    active.is_shared = Set(changes.is_shared);
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

/// Delete an event. Returns whether a row was removed.
pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<bool> {
    let result = EventEntity::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
