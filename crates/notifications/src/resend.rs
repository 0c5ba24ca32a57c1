//! Operator-triggered re-sends of undelivered dispatches.

use std::sync::Arc;

use docket_core::dispatch_status::STATUS_PREPARED;
use docket_core::error::CoreError;
use docket_core::types::DbId;

use crate::error::NotificationError;
use crate::queue::{NotificationQueue, NotificationTask};
use crate::store::DispatchStore;

pub struct ResendService {
    store: Arc<dyn DispatchStore>,
    queue: NotificationQueue,
}

impl ResendService {
    pub fn new(store: Arc<dyn DispatchStore>, queue: NotificationQueue) -> Self {
        Self { store, queue }
    }

    /// Queue a resend of the dispatches that are still `prepared`.
    ///
    /// Returns how many were queued. Nothing is queued when none qualify.
    pub async fn resend_many(&self, ids: &[DbId]) -> Result<usize, NotificationError> {
        let prepared = self.store.filter_prepared(ids).await?;
        if prepared.is_empty() {
            tracing::info!(requested = ids.len(), "No prepared dispatches to resend");
            return Ok(0);
        }
        let count = prepared.len();
        self.queue.enqueue(NotificationTask::Resend(prepared))?;
        tracing::info!(requested = ids.len(), queued = count, "Resend queued");
        Ok(count)
    }

    /// Queue a resend of one dispatch.
    pub async fn resend_one(&self, id: DbId) -> Result<(), NotificationError> {
        let dispatch = self
            .store
            .find_dispatch(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "notification_dispatch",
                id,
            })?;
        if dispatch.status != STATUS_PREPARED {
            return Err(CoreError::Conflict("already sent".to_string()).into());
        }
        self.queue.enqueue(NotificationTask::Resend(vec![id]))
    }

    /// Queue every `prepared` dispatch, up to `limit`.
    pub async fn resend_all_prepared(&self, limit: i64) -> Result<usize, NotificationError> {
        let ids = self.store.list_prepared(limit).await?;
        self.resend_many(&ids).await
    }
}
