//! Onboarding saga records.
//!
//! A saga row is written before each external call of a multi-step onboarding
//! flow so that a crash mid-sequence can be resumed or compensated on restart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Which flow a saga belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaKind {
    AddMember,
    DeleteMember,
}

impl SagaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaKind::AddMember => "add_member",
            SagaKind::DeleteMember => "delete_member",
        }
    }
}

impl FromStr for SagaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add_member" => Ok(SagaKind::AddMember),
            "delete_member" => Ok(SagaKind::DeleteMember),
            _ => Err(format!("Invalid saga kind: {}", s)),
        }
    }
}

/// The step a saga is about to perform (or performed last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStep {
    // add_member
    CreateAccount,
    CreateProfile,
    SendRecoveryLink,
    InsertMembership,
    // delete_member
    ResolveEmail,
    DeletePendingInvites,
    DeleteProfile,
    DeleteAccount,
    // both
    Done,
}

impl SagaStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStep::CreateAccount => "create_account",
            SagaStep::CreateProfile => "create_profile",
            SagaStep::SendRecoveryLink => "send_recovery_link",
            SagaStep::InsertMembership => "insert_membership",
            SagaStep::ResolveEmail => "resolve_email",
            SagaStep::DeletePendingInvites => "delete_pending_invites",
            SagaStep::DeleteProfile => "delete_profile",
            SagaStep::DeleteAccount => "delete_account",
            SagaStep::Done => "done",
        }
    }
}

impl FromStr for SagaStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_account" => Ok(SagaStep::CreateAccount),
            "create_profile" => Ok(SagaStep::CreateProfile),
            "send_recovery_link" => Ok(SagaStep::SendRecoveryLink),
            "insert_membership" => Ok(SagaStep::InsertMembership),
            "resolve_email" => Ok(SagaStep::ResolveEmail),
            "delete_pending_invites" => Ok(SagaStep::DeletePendingInvites),
            "delete_profile" => Ok(SagaStep::DeleteProfile),
            "delete_account" => Ok(SagaStep::DeleteAccount),
            "done" => Ok(SagaStep::Done),
            _ => Err(format!("Invalid saga step: {}", s)),
        }
    }
}

impl fmt::Display for SagaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStatus {
    InProgress,
    Completed,
    Failed,
    Compensated,
}

impl SagaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::InProgress => "in_progress",
            SagaStatus::Completed => "completed",
            SagaStatus::Failed => "failed",
            SagaStatus::Compensated => "compensated",
        }
    }
}

impl FromStr for SagaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(SagaStatus::InProgress),
            "completed" => Ok(SagaStatus::Completed),
            "failed" => Ok(SagaStatus::Failed),
            "compensated" => Ok(SagaStatus::Compensated),
            _ => Err(format!("Invalid saga status: {}", s)),
        }
    }
}

/// Action that undoes a partially completed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Compensation {
    DeleteIdentityAccount { user_id: Uuid },
}

/// Persisted saga state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SagaRecord {
    pub id: Uuid,
    pub kind: SagaKind,
    pub subject_email: Option<String>,
    pub subject_user_id: Option<Uuid>,
    pub step: SagaStep,
    pub status: SagaStatus,
    pub compensation: Option<Compensation>,
    /// Flow input needed to resume forward (e.g. the membership to insert).
    pub payload: serde_json::Value,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for opening a saga.
#[derive(Debug, Clone)]
pub struct NewSaga {
    pub kind: SagaKind,
    pub subject_email: Option<String>,
    pub subject_user_id: Option<Uuid>,
    pub step: SagaStep,
    pub payload: serde_json::Value,
}

/// Full replacement of a saga's mutable state.
#[derive(Debug, Clone)]
pub struct SagaUpdate {
    pub step: SagaStep,
    pub status: SagaStatus,
    pub subject_email: Option<String>,
    pub subject_user_id: Option<Uuid>,
    pub compensation: Option<Compensation>,
    pub last_error: Option<String>,
}

/// Query for `GET /api/admin/sagas`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListSagasQuery {
    /// Filter by status (default: failed).
    pub status: Option<SagaStatus>,
    /// Maximum rows (default: 50, max: 200).
    pub limit: Option<i64>,
}

impl ListSagasQuery {
    pub fn status(&self) -> SagaStatus {
        self.status.unwrap_or(SagaStatus::Failed)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 200)
    }
}

/// Response for `GET /api/admin/sagas`.
#[derive(Debug, Clone, Serialize)]
pub struct ListSagasResponse {
    pub data: Vec<SagaRecord>,
}
