//! Read state of a user's notifications.

use std::sync::Arc;

use docket_core::dispatch_status::DispatchStatus;
use docket_core::error::CoreError;
use docket_core::types::DbId;
use docket_db::models::notification::NotificationDispatch;
use serde::Serialize;

use crate::error::NotificationError;
use crate::store::DispatchStore;

/// Page size used when a caller does not pass one.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// A listed dispatch with the in-app content rendered for its recipient.
#[derive(Debug, Clone, Serialize)]
pub struct InboxEntry {
    #[serde(flatten)]
    pub dispatch: NotificationDispatch,
    pub runtime_tag: String,
    pub title: String,
    /// `None` when the runtime tag has no registered resource.
    pub content: Option<String>,
}

pub struct Inbox {
    store: Arc<dyn DispatchStore>,
}

impl Inbox {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    pub async fn mark_read(
        &self,
        dispatch_id: DbId,
        user_id: DbId,
    ) -> Result<DispatchStatus, NotificationError> {
        self.apply(dispatch_id, user_id, DispatchStatus::read).await
    }

    /// Mark a read dispatch as unread. It becomes `sent`.
    pub async fn mark_unread(
        &self,
        dispatch_id: DbId,
        user_id: DbId,
    ) -> Result<DispatchStatus, NotificationError> {
        self.apply(dispatch_id, user_id, DispatchStatus::unread).await
    }

    pub async fn unread_count(&self, user_id: DbId) -> Result<i64, NotificationError> {
        self.store.unread_count(user_id).await
    }

    /// Dispatches of a user, unread first, newest first.
    pub async fn list_for_user(
        &self,
        user_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<NotificationDispatch>, NotificationError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 500);
        let offset = offset.unwrap_or(0).max(0);
        self.store.list_for_user(user_id, limit, offset).await
    }

    async fn apply(
        &self,
        dispatch_id: DbId,
        user_id: DbId,
        step: fn(DispatchStatus) -> Result<DispatchStatus, CoreError>,
    ) -> Result<DispatchStatus, NotificationError> {
        let dispatch = self
            .store
            .find_dispatch_for(dispatch_id, user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "notification_dispatch",
                id: dispatch_id,
            })?;

        let current = dispatch.status()?;
        let next = step(current)?;

        if !self.store.transition(dispatch_id, current, next).await? {
            return Err(CoreError::Conflict(format!(
                "Notification dispatch {dispatch_id} changed status concurrently"
            ))
            .into());
        }

        tracing::debug!(dispatch_id, user_id, from = %current, to = %next, "Dispatch status changed");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::testing::FakeStore;

    async fn store_with_dispatches(recipients: &[DbId]) -> Arc<FakeStore> {
        let store = Arc::new(FakeStore::default());
        store.create_dispatches(1, None, recipients).await.unwrap();
        store
    }

    #[tokio::test]
    async fn read_then_unread_lands_on_sent() {
        let store = store_with_dispatches(&[2]).await;
        let inbox = Inbox::new(store.clone());

        assert_eq!(inbox.mark_read(1, 2).await.unwrap(), DispatchStatus::Read);
        assert_eq!(inbox.mark_unread(1, 2).await.unwrap(), DispatchStatus::Sent);
        assert_eq!(store.status_of(1).as_deref(), Some("sent"));
    }

    #[tokio::test]
    async fn illegal_transitions_conflict() {
        let store = store_with_dispatches(&[2]).await;
        let inbox = Inbox::new(store.clone());

        assert_matches!(
            inbox.mark_unread(1, 2).await,
            Err(NotificationError::Core(CoreError::Conflict(_)))
        );
        inbox.mark_read(1, 2).await.unwrap();
        assert_matches!(
            inbox.mark_read(1, 2).await,
            Err(NotificationError::Core(CoreError::Conflict(_)))
        );
    }

    #[tokio::test]
    async fn other_users_dispatch_is_not_found() {
        let inbox = Inbox::new(store_with_dispatches(&[2]).await);
        assert_matches!(
            inbox.mark_read(1, 3).await,
            Err(NotificationError::Core(CoreError::NotFound { entity: "notification_dispatch", id: 1 }))
        );
    }

    #[tokio::test]
    async fn unread_count_and_listing() {
        let store = Arc::new(FakeStore::default());
        store.create_dispatches(1, None, &[2]).await.unwrap();
        store.create_dispatches(2, None, &[2]).await.unwrap();
        store.create_dispatches(3, None, &[2]).await.unwrap();
        store.set_status(2, DispatchStatus::Sent);
        let inbox = Inbox::new(store.clone());

        inbox.mark_read(3, 2).await.unwrap();

        assert_eq!(inbox.unread_count(2).await.unwrap(), 2);
        let ids: Vec<DbId> = inbox
            .list_for_user(2, None, None)
            .await
            .unwrap()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(inbox.list_for_user(2, Some(1), Some(1)).await.unwrap()[0].id, 1);
    }
}
