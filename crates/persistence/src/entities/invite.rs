//! Building invite and pending invite entities (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::profile::MemberRoleDb;

/// Database row mapping for the building_invites table.
#[derive(Debug, Clone, FromRow)]
pub struct BuildingInviteEntity {
    pub id: Uuid,
    pub building_id: Uuid,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub uses_count: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<BuildingInviteEntity> for domain::models::BuildingInvite {
    fn from(entity: BuildingInviteEntity) -> Self {
        Self {
            id: entity.id,
            building_id: entity.building_id,
            is_active: entity.is_active,
            expires_at: entity.expires_at,
            max_uses: entity.max_uses,
            uses_count: entity.uses_count,
            created_by: entity.created_by,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the pending_invites table.
#[derive(Debug, Clone, FromRow)]
pub struct PendingInviteEntity {
    pub id: Uuid,
    pub email: String,
    pub building_id: Uuid,
    pub invite_id: Uuid,
    pub apartment_number: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub default_role: MemberRoleDb,
    pub created_at: DateTime<Utc>,
}

impl From<PendingInviteEntity> for domain::models::PendingInvite {
    fn from(entity: PendingInviteEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            building_id: entity.building_id,
            invite_id: entity.invite_id,
            apartment_number: entity.apartment_number,
            full_name: entity.full_name,
            phone: entity.phone,
            default_role: entity.default_role.into(),
            created_at: entity.created_at,
        }
    }
}
