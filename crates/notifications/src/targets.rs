//! Snapshots of the domain objects notifications link to.
//!
//! Notifications keep a `(target_kind, target_id)` reference to the object
//! that triggered them. Rendering reads the object's current snapshot
//! through a [`TargetStore`]; a missing snapshot means the object is gone.

use async_trait::async_trait;
use docket_db::repositories::NotificationTargetRepo;
use docket_db::DbPool;
use serde_json::Value;

use crate::error::NotificationError;

#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Current snapshot of a target, or `None` if it no longer exists.
    async fn load(&self, kind: &str, id: &str) -> Result<Option<Value>, NotificationError>;

    /// Record the current state of a target.
    async fn save(&self, kind: &str, id: &str, data: &Value) -> Result<(), NotificationError>;

    /// Forget a target. Returns `true` if a snapshot existed.
    async fn forget(&self, kind: &str, id: &str) -> Result<bool, NotificationError>;
}

/// [`TargetStore`] backed by the `notification_targets` table.
pub struct PgTargetStore {
    pool: DbPool,
}

impl PgTargetStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TargetStore for PgTargetStore {
    async fn load(&self, kind: &str, id: &str) -> Result<Option<Value>, NotificationError> {
        let target = NotificationTargetRepo::find(&self.pool, kind, id).await?;
        Ok(target.map(|t| t.data))
    }

    async fn save(&self, kind: &str, id: &str, data: &Value) -> Result<(), NotificationError> {
        NotificationTargetRepo::upsert(&self.pool, kind, id, data).await?;
        Ok(())
    }

    async fn forget(&self, kind: &str, id: &str) -> Result<bool, NotificationError> {
        Ok(NotificationTargetRepo::delete(&self.pool, kind, id).await?)
    }
}
