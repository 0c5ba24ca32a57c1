//! Notification target snapshot model.

use docket_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notification_targets` table: the current state of the
/// domain object a notification links to.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationTarget {
    pub kind: String,
    pub object_id: String,
    pub data: serde_json::Value,
    pub updated_at: Timestamp,
}
