//! Building membership domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::MemberRole;

/// Binds a profile to a building with a per-building role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BuildingMember {
    pub id: Uuid,
    pub building_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub apartment_number: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub phone2: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NewBuildingMember {
    pub building_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub apartment_number: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub phone2: Option<String>,
    pub email: Option<String>,
}
