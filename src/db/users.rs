//! Database operations for users.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::user::{self, ActiveModel, Entity as UserEntity};
use crate::error::AppResult;
use crate::models::{ExternalIdentity, Provider};

use super::is_unique_violation;

/// Find a user by ID.
pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<user::Model>> {
    Ok(UserEntity::find_by_id(id).one(db).await?)
}

/// Resolve the local user for a confirmed external identity, creating one if
/// needed.
///
/// Lookup order is provider account id, then (Google only) a known email,
/// then a new row. Locally edited names are kept; only a missing avatar is
/// filled in from the provider. When two first logins race, the loser hits a
/// unique index and resolves again against the winner's row.
pub async fn upsert_from_identity<C: ConnectionTrait>(
    db: &C,
    identity: &ExternalIdentity,
) -> AppResult<user::Model> {
    match resolve(db, identity).await {
        Err(e) if is_unique_violation(&e) => {
            tracing::debug!(
                provider = %identity.provider,
                "Concurrent first login detected, resolving again"
            );
            Ok(resolve(db, identity).await?)
        }
        other => Ok(other?),
    }
}

async fn resolve<C: ConnectionTrait>(db: &C, identity: &ExternalIdentity) -> Result<user::Model, DbErr> {
    let provider_column = match identity.provider {
        Provider::Google => user::Column::GoogleId,
        Provider::Line => user::Column::LineId,
    };

    let existing = UserEntity::find()
        .filter(provider_column.eq(identity.subject.as_str()))
        .one(db)
        .await?;
    if let Some(m) = existing {
        return fill_missing_avatar(db, m, identity).await;
    }

    let mut email = identity.email.clone();
    if identity.provider == Provider::Google
        && let Some(address) = identity.email.as_deref()
        && let Some(m) = UserEntity::find()
            .filter(user::Column::Email.eq(address))
            .one(db)
            .await?
    {
        if m.google_id.is_none() {
            let mut active: ActiveModel = m.clone().into();
            active.google_id = Set(Some(identity.subject.clone()));
            if m.avatar_url.is_none() {
                active.avatar_url = Set(identity.avatar_url.clone());
            }
            active.updated_at = Set(Utc::now());
            return active.update(db).await;
        }
        // Email already belongs to another Google account
        email = None;
    }

    let now = Utc::now();
    let (google_id, line_id) = match identity.provider {
        Provider::Google => (Some(identity.subject.clone()), None),
        Provider::Line => (None, Some(identity.subject.clone())),
    };
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(identity.name.clone()),
        email: Set(email),
        avatar_url: Set(identity.avatar_url.clone()),
        google_id: Set(google_id),
        line_id: Set(line_id),
        created_at: Set(now),
        updated_at: Set(now),
    };
    model.insert(db).await
}

async fn fill_missing_avatar<C: ConnectionTrait>(
    db: &C,
    m: user::Model,
    identity: &ExternalIdentity,
) -> Result<user::Model, DbErr> {
    match (&m.avatar_url, &identity.avatar_url) {
        (None, Some(avatar)) => {
            let mut active: ActiveModel = m.into();
            active.avatar_url = Set(Some(avatar.clone()));
            active.updated_at = Set(Utc::now());
            active.update(db).await
        }
        _ => Ok(m),
    }
}

/// Apply a profile update. `avatar_url` of `Some(None)` clears the avatar.
pub async fn update_profile<C: ConnectionTrait>(
    db: &C,
    existing: user::Model,
    name: Option<String>,
    avatar_url: Option<Option<String>>,
) -> AppResult<user::Model> {
    let mut active: ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(avatar_url) = avatar_url {
        active.avatar_url = Set(avatar_url);
    }
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}
