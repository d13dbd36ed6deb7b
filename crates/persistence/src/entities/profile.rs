//! Profile entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{MemberRole, PlatformRole};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for platform_role that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "platform_role", rename_all = "lowercase")]
pub enum PlatformRoleDb {
    Admin,
    Committee,
    Tenant,
}

impl From<PlatformRoleDb> for PlatformRole {
    fn from(db_role: PlatformRoleDb) -> Self {
        match db_role {
            PlatformRoleDb::Admin => PlatformRole::Admin,
            PlatformRoleDb::Committee => PlatformRole::Committee,
            PlatformRoleDb::Tenant => PlatformRole::Tenant,
        }
    }
}

impl From<PlatformRole> for PlatformRoleDb {
    fn from(role: PlatformRole) -> Self {
        match role {
            PlatformRole::Admin => PlatformRoleDb::Admin,
            PlatformRole::Committee => PlatformRoleDb::Committee,
            PlatformRole::Tenant => PlatformRoleDb::Tenant,
        }
    }
}

/// Database enum for member_role (per-building role).
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
pub enum MemberRoleDb {
    Committee,
    Tenant,
}

impl From<MemberRoleDb> for MemberRole {
    fn from(db_role: MemberRoleDb) -> Self {
        match db_role {
            MemberRoleDb::Committee => MemberRole::Committee,
            MemberRoleDb::Tenant => MemberRole::Tenant,
        }
    }
}

impl From<MemberRole> for MemberRoleDb {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Committee => MemberRoleDb::Committee,
            MemberRole::Tenant => MemberRoleDb::Tenant,
        }
    }
}

/// Database row mapping for the profiles table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileEntity {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: PlatformRoleDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileEntity> for domain::models::Profile {
    fn from(entity: ProfileEntity) -> Self {
        Self {
            id: entity.id,
            full_name: entity.full_name,
            phone: entity.phone,
            role: entity.role.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_role_conversion() {
        for role in [PlatformRole::Admin, PlatformRole::Committee, PlatformRole::Tenant] {
            assert_eq!(PlatformRole::from(PlatformRoleDb::from(role)), role);
        }
    }

    #[test]
    fn test_member_role_conversion() {
        assert_eq!(MemberRole::from(MemberRoleDb::Committee), MemberRole::Committee);
        assert_eq!(MemberRoleDb::from(MemberRole::Tenant), MemberRoleDb::Tenant);
    }
}
