//! Push device entity model.

use docket_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `push_devices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PushDevice {
    pub id: DbId,
    pub user_id: DbId,
    pub registration_id: String,
    pub active: bool,
    pub created_at: Timestamp,
}
