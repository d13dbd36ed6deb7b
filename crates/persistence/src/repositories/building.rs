//! Building and membership repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{BuildingEntity, BuildingMemberEntity, MemberRoleDb};
use crate::metrics::QueryTimer;

const MEMBER_COLUMNS: &str = "id, building_id, user_id, role, apartment_number, full_name, phone, phone2, email, created_at";

/// Input for inserting a building membership.
#[derive(Debug, Clone)]
pub struct MemberInput<'a> {
    pub building_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRoleDb,
    pub apartment_number: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub phone2: Option<&'a str>,
    pub email: Option<&'a str>,
}

/// Repository for buildings and their members.
#[derive(Clone)]
pub struct BuildingRepository {
    pool: PgPool,
}

impl BuildingRepository {
    /// Creates a new BuildingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a building by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<BuildingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_building_by_id");
        let result = sqlx::query_as::<_, BuildingEntity>(
            r#"
            SELECT id, name, address, is_approved, created_by, created_at
            FROM buildings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user's membership in a building.
    pub async fn find_member(
        &self,
        building_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BuildingMemberEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_building_member");
        let result = sqlx::query_as::<_, BuildingMemberEntity>(&format!(
            "SELECT {} FROM building_members WHERE building_id = $1 AND user_id = $2",
            MEMBER_COLUMNS
        ))
        .bind(building_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List every membership of a user, oldest first.
    pub async fn list_members_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<BuildingMemberEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_memberships_for_user");
        let result = sqlx::query_as::<_, BuildingMemberEntity>(&format!(
            "SELECT {} FROM building_members WHERE user_id = $1 ORDER BY created_at ASC",
            MEMBER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert a membership. Duplicate (building, user) pairs violate a unique
    /// constraint.
    pub async fn add_member(&self, input: MemberInput<'_>) -> Result<BuildingMemberEntity, sqlx::Error> {
        let timer = QueryTimer::new("add_building_member");
        let result = sqlx::query_as::<_, BuildingMemberEntity>(&format!(
            r#"
            INSERT INTO building_members
                (building_id, user_id, role, apartment_number, full_name, phone, phone2, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        ))
        .bind(input.building_id)
        .bind(input.user_id)
        .bind(input.role)
        .bind(input.apartment_number)
        .bind(input.full_name)
        .bind(input.phone)
        .bind(input.phone2)
        .bind(input.email)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
