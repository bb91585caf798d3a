//! Group and membership models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::double_option;
use crate::error::AppError;

/// Role of a user within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub invite_code: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::group::Model> for Group {
    fn from(m: crate::entity::group::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            icon_url: m.icon_url,
            invite_code: m.invite_code,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl TryFrom<crate::entity::group_member::Model> for GroupMember {
    type Error = AppError;

    /// Fails on a stored role outside [`MemberRole`].
    fn try_from(m: crate::entity::group_member::Model) -> Result<Self, Self::Error> {
        let role = MemberRole::parse(&m.role).ok_or_else(|| {
            AppError::Internal(format!(
                "membership {} has unknown role {:?}",
                m.id, m.role
            ))
        })?;
        Ok(Self {
            id: m.id,
            group_id: m.group_id,
            user_id: m.user_id,
            role,
            joined_at: m.joined_at,
        })
    }
}

/// Group listing entry carrying the caller's role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupWithRole {
    #[serde(flatten)]
    pub group: Group,
    pub role: MemberRole,
}

/// Group with its member list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    /// `null` clears the icon.
    #[serde(default, deserialize_with = "double_option::deserialize")]
    #[schema(value_type = Option<String>, nullable)]
    pub icon_url: Option<Option<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinGroupRequest {
    #[serde(default)]
    pub code: String,
}

impl JoinGroupRequest {
    /// Invite code as stored: trimmed and uppercased.
    pub fn normalized_code(&self) -> String {
        self.code.trim().to_uppercase()
    }
}
