//! Building invite and pending invite repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{BuildingInviteEntity, MemberRoleDb, PendingInviteEntity};
use crate::metrics::QueryTimer;

const INVITE_COLUMNS: &str =
    "id, building_id, is_active, expires_at, max_uses, uses_count, created_by, created_at";
const PENDING_COLUMNS: &str =
    "id, email, building_id, invite_id, apartment_number, full_name, phone, default_role, created_at";

/// Input for staging a pending invite.
#[derive(Debug, Clone)]
pub struct PendingInviteInput<'a> {
    pub email: &'a str,
    pub building_id: Uuid,
    pub invite_id: Uuid,
    pub apartment_number: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub default_role: MemberRoleDb,
}

/// Repository for building invites and staged pending invites.
#[derive(Clone)]
pub struct InviteRepository {
    pool: PgPool,
}

impl InviteRepository {
    /// Creates a new InviteRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new building invite.
    pub async fn create_invite(
        &self,
        building_id: Uuid,
        expires_at: Option<DateTime<Utc>>,
        max_uses: Option<i32>,
        created_by: Uuid,
    ) -> Result<BuildingInviteEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_building_invite");
        let result = sqlx::query_as::<_, BuildingInviteEntity>(&format!(
            r#"
            INSERT INTO building_invites (building_id, expires_at, max_uses, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            INVITE_COLUMNS
        ))
        .bind(building_id)
        .bind(expires_at)
        .bind(max_uses)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find invite by ID, active or not.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<BuildingInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_building_invite_by_id");
        let result = sqlx::query_as::<_, BuildingInviteEntity>(&format!(
            "SELECT {} FROM building_invites WHERE id = $1",
            INVITE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List every invite of a building, newest first.
    pub async fn list_for_building(
        &self,
        building_id: Uuid,
    ) -> Result<Vec<BuildingInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_building_invites");
        let result = sqlx::query_as::<_, BuildingInviteEntity>(&format!(
            "SELECT {} FROM building_invites WHERE building_id = $1 ORDER BY created_at DESC",
            INVITE_COLUMNS
        ))
        .bind(building_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deactivate an invite. Returns the number of rows updated.
    pub async fn deactivate(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("deactivate_building_invite");
        let result = sqlx::query("UPDATE building_invites SET is_active = false WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }

    /// Atomically count one use of an invite while it is still usable.
    ///
    /// Returns 0 when the invite is inactive, expired or at its cap.
    pub async fn consume(&self, id: Uuid, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("consume_building_invite");
        let result = sqlx::query(
            r#"
            UPDATE building_invites
            SET uses_count = uses_count + 1
            WHERE id = $1
              AND is_active = true
              AND (expires_at IS NULL OR expires_at > $2)
              AND (max_uses IS NULL OR uses_count < max_uses)
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }

    /// Insert or replace the pending invite for an email.
    pub async fn upsert_pending(
        &self,
        input: PendingInviteInput<'_>,
    ) -> Result<PendingInviteEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_pending_invite");
        let result = sqlx::query_as::<_, PendingInviteEntity>(&format!(
            r#"
            INSERT INTO pending_invites
                (email, building_id, invite_id, apartment_number, full_name, phone, default_role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE
            SET building_id = EXCLUDED.building_id,
                invite_id = EXCLUDED.invite_id,
                apartment_number = EXCLUDED.apartment_number,
                full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                default_role = EXCLUDED.default_role,
                created_at = NOW()
            RETURNING {}
            "#,
            PENDING_COLUMNS
        ))
        .bind(input.email)
        .bind(input.building_id)
        .bind(input.invite_id)
        .bind(input.apartment_number)
        .bind(input.full_name)
        .bind(input.phone)
        .bind(input.default_role)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find the pending invite staged for an email.
    pub async fn find_pending_by_email(
        &self,
        email: &str,
    ) -> Result<Option<PendingInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_pending_invite_by_email");
        let result = sqlx::query_as::<_, PendingInviteEntity>(&format!(
            "SELECT {} FROM pending_invites WHERE email = $1",
            PENDING_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete pending invites for an email. Returns the number of rows deleted.
    pub async fn delete_pending_by_email(&self, email: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_pending_invites_by_email");
        let result = sqlx::query("DELETE FROM pending_invites WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }
}
