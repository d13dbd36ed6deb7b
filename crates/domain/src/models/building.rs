//! Building domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A managed residential property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Building {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub is_approved: bool,
    /// Null once the creator's profile has been deleted.
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
