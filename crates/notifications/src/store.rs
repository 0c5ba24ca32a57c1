//! Persistence seam for notifications and their dispatches.

use std::collections::HashMap;

use async_trait::async_trait;
use docket_core::dispatch_status::DispatchStatus;
use docket_core::preferences::DeliveryPreferences;
use docket_core::types::DbId;
use docket_db::models::notification::{
    CreateNotification, DispatchDelivery, Notification, NotificationDispatch, NotificationType,
};
use docket_db::repositories::{
    NotificationDispatchRepo, NotificationRepo, NotificationSettingRepo, NotificationTypeRepo,
};
use docket_db::DbPool;

use crate::error::NotificationError;

/// Storage used by the dispatcher, the inbox and the resend path.
#[async_trait]
pub trait DispatchStore: Send + Sync {
    async fn notification_type(
        &self,
        runtime_tag: &str,
    ) -> Result<Option<NotificationType>, NotificationError>;

    async fn create_notification(
        &self,
        input: &CreateNotification,
    ) -> Result<Notification, NotificationError>;

    /// Delivery preferences keyed by user id. Users without a settings row
    /// are absent from the map.
    async fn settings_for(
        &self,
        user_ids: &[DbId],
    ) -> Result<HashMap<DbId, DeliveryPreferences>, NotificationError>;

    /// Create one `prepared` dispatch per recipient. Recipients that
    /// already hold a dispatch for the notification are skipped.
    async fn create_dispatches(
        &self,
        notification_id: DbId,
        sender_id: Option<DbId>,
        recipient_ids: &[DbId],
    ) -> Result<Vec<DbId>, NotificationError>;

    async fn deliveries(&self, ids: &[DbId]) -> Result<Vec<DispatchDelivery>, NotificationError>;

    async fn find_dispatch(
        &self,
        id: DbId,
    ) -> Result<Option<NotificationDispatch>, NotificationError>;

    async fn find_dispatch_for(
        &self,
        id: DbId,
        recipient_id: DbId,
    ) -> Result<Option<NotificationDispatch>, NotificationError>;

    /// Move a dispatch from `from` to `to`. Returns `false` when the stored
    /// status was no longer `from`.
    async fn transition(
        &self,
        id: DbId,
        from: DispatchStatus,
        to: DispatchStatus,
    ) -> Result<bool, NotificationError>;

    /// The subset of `ids` that is still `prepared`.
    async fn filter_prepared(&self, ids: &[DbId]) -> Result<Vec<DbId>, NotificationError>;

    /// Up to `limit` `prepared` dispatches, least recently attempted first.
    async fn list_prepared(&self, limit: i64) -> Result<Vec<DbId>, NotificationError>;

    /// Mark an unsuccessful delivery attempt on dispatches still `prepared`.
    async fn record_attempt(&self, ids: &[DbId]) -> Result<(), NotificationError>;

    async fn unread_count(&self, recipient_id: DbId) -> Result<i64, NotificationError>;

    async fn list_for_user(
        &self,
        recipient_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationDispatch>, NotificationError>;

    /// Delete every notification pointing at a target, dispatches included.
    async fn delete_notifications_for_target(
        &self,
        target_kind: &str,
        target_id: &str,
    ) -> Result<u64, NotificationError>;
}

/// [`DispatchStore`] over the notification repositories.
pub struct PgDispatchStore {
    pool: DbPool,
}

impl PgDispatchStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DispatchStore for PgDispatchStore {
    async fn notification_type(
        &self,
        runtime_tag: &str,
    ) -> Result<Option<NotificationType>, NotificationError> {
        Ok(NotificationTypeRepo::get_by_runtime_tag(&self.pool, runtime_tag).await?)
    }

    async fn create_notification(
        &self,
        input: &CreateNotification,
    ) -> Result<Notification, NotificationError> {
        Ok(NotificationRepo::create(&self.pool, input).await?)
    }

    async fn settings_for(
        &self,
        user_ids: &[DbId],
    ) -> Result<HashMap<DbId, DeliveryPreferences>, NotificationError> {
        let rows = NotificationSettingRepo::list_for_users(&self.pool, user_ids).await?;
        Ok(rows.iter().map(|s| (s.user_id, s.preferences())).collect())
    }

    async fn create_dispatches(
        &self,
        notification_id: DbId,
        sender_id: Option<DbId>,
        recipient_ids: &[DbId],
    ) -> Result<Vec<DbId>, NotificationError> {
        Ok(NotificationDispatchRepo::create_for_recipients(
            &self.pool,
            notification_id,
            sender_id,
            recipient_ids,
        )
        .await?)
    }

    async fn deliveries(&self, ids: &[DbId]) -> Result<Vec<DispatchDelivery>, NotificationError> {
        Ok(NotificationDispatchRepo::list_deliveries(&self.pool, ids).await?)
    }

    async fn find_dispatch(
        &self,
        id: DbId,
    ) -> Result<Option<NotificationDispatch>, NotificationError> {
        Ok(NotificationDispatchRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_dispatch_for(
        &self,
        id: DbId,
        recipient_id: DbId,
    ) -> Result<Option<NotificationDispatch>, NotificationError> {
        Ok(NotificationDispatchRepo::find_for_recipient(&self.pool, id, recipient_id).await?)
    }

    async fn transition(
        &self,
        id: DbId,
        from: DispatchStatus,
        to: DispatchStatus,
    ) -> Result<bool, NotificationError> {
        Ok(NotificationDispatchRepo::transition(&self.pool, id, from, to).await?)
    }

    async fn filter_prepared(&self, ids: &[DbId]) -> Result<Vec<DbId>, NotificationError> {
        Ok(NotificationDispatchRepo::filter_prepared(&self.pool, ids).await?)
    }

    async fn list_prepared(&self, limit: i64) -> Result<Vec<DbId>, NotificationError> {
        Ok(NotificationDispatchRepo::list_prepared_ids(&self.pool, limit).await?)
    }

    async fn record_attempt(&self, ids: &[DbId]) -> Result<(), NotificationError> {
        NotificationDispatchRepo::touch_prepared(&self.pool, ids).await?;
        Ok(())
    }

    async fn unread_count(&self, recipient_id: DbId) -> Result<i64, NotificationError> {
        Ok(NotificationDispatchRepo::unread_count(&self.pool, recipient_id).await?)
    }

    async fn list_for_user(
        &self,
        recipient_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationDispatch>, NotificationError> {
        Ok(
            NotificationDispatchRepo::list_for_recipient(&self.pool, recipient_id, limit, offset)
                .await?,
        )
    }

    async fn delete_notifications_for_target(
        &self,
        target_kind: &str,
        target_id: &str,
    ) -> Result<u64, NotificationError> {
        Ok(NotificationRepo::delete_for_target(&self.pool, target_kind, target_id).await?)
    }
}
