//! Notification outbox model.

use docket_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notification_outbox` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutboxEntry {
    pub id: DbId,
    /// Serialized task, decoded by the notification worker.
    pub task: serde_json::Value,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub processed_at: Option<Timestamp>,
}
