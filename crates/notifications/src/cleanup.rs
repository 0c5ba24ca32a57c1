//! Removal of notifications whose target was deleted.

use std::sync::Arc;

use crate::error::NotificationError;
use crate::store::DispatchStore;
use crate::targets::TargetStore;

pub struct TargetCleanup {
    store: Arc<dyn DispatchStore>,
    targets: Arc<dyn TargetStore>,
}

impl TargetCleanup {
    pub fn new(store: Arc<dyn DispatchStore>, targets: Arc<dyn TargetStore>) -> Self {
        Self { store, targets }
    }

    /// Forget a deleted target and every notification pointing at it.
    ///
    /// Dispatches go with their notifications. Returns the number of
    /// notifications deleted.
    pub async fn forget_target(&self, kind: &str, id: &str) -> Result<u64, NotificationError> {
        let had_snapshot = self.targets.forget(kind, id).await?;
        let deleted = self.store.delete_notifications_for_target(kind, id).await?;
        tracing::info!(
            target_kind = kind,
            target_id = id,
            had_snapshot,
            deleted,
            "Notification target cleaned up"
        );
        Ok(deleted)
    }
}
