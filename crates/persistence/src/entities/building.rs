//! Building and membership entities (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::profile::MemberRoleDb;

/// Database row mapping for the buildings table.
#[derive(Debug, Clone, FromRow)]
pub struct BuildingEntity {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub is_approved: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<BuildingEntity> for domain::models::Building {
    fn from(entity: BuildingEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            address: entity.address,
            is_approved: entity.is_approved,
            created_by: entity.created_by,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the building_members table.
#[derive(Debug, Clone, FromRow)]
pub struct BuildingMemberEntity {
    pub id: Uuid,
    pub building_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRoleDb,
    pub apartment_number: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub phone2: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BuildingMemberEntity> for domain::models::BuildingMember {
    fn from(entity: BuildingMemberEntity) -> Self {
        Self {
            id: entity.id,
            building_id: entity.building_id,
            user_id: entity.user_id,
            role: entity.role.into(),
            apartment_number: entity.apartment_number,
            full_name: entity.full_name,
            phone: entity.phone,
            phone2: entity.phone2,
            email: entity.email,
            created_at: entity.created_at,
        }
    }
}
