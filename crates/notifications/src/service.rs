//! Entry points that turn events and resend requests into dispatch runs.

use std::collections::HashMap;
use std::sync::Arc;

use docket_core::types::DbId;
use docket_db::models::notification::CreateNotification;
use docket_db::DbPool;
use serde_json::Value;

use crate::config::NotificationConfig;
use crate::directory::{PgRecipientDirectory, RecipientDirectory};
use crate::dispatcher::{DispatchSummary, Dispatcher};
use crate::error::NotificationError;
use crate::event::NotificationEvent;
use crate::gate::PreferenceGate;
use crate::inbox::{Inbox, InboxEntry};
use crate::queue::NotificationTask;
use crate::render::ContentRenderer;
use crate::resource::ResourceRegistry;
use crate::sender::email::SmtpEmailSender;
use crate::sender::push::FcmPushSender;
use crate::store::PgDispatchStore;
use crate::targets::PgTargetStore;

pub struct NotificationService {
    dispatcher: Dispatcher,
}

impl NotificationService {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Wire the PostgreSQL stores, SMTP and FCM senders and the built-in
    /// resources.
    pub fn from_pool(pool: DbPool, config: &NotificationConfig) -> Self {
        let directory: Arc<dyn RecipientDirectory> =
            Arc::new(PgRecipientDirectory::new(pool.clone()));
        let dispatcher = Dispatcher::new(
            Arc::new(PgDispatchStore::new(pool.clone())),
            directory.clone(),
            Arc::new(PgTargetStore::new(pool)),
            Arc::new(SmtpEmailSender::new(config.email.clone())),
            Arc::new(FcmPushSender::new(config.push.clone(), directory)),
            ResourceRegistry::with_defaults(),
        )
        .with_gate(PreferenceGate::new(config.missing_settings))
        .with_renderer(ContentRenderer::new(config.site_base_url.clone()));
        Self::new(dispatcher)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Record a notification for the event and fan it out.
    ///
    /// The event's instance is saved as the target snapshot first, so
    /// renders read the state the event was raised with.
    pub async fn send_notifications(
        &self,
        event: &NotificationEvent,
    ) -> Result<DispatchSummary, NotificationError> {
        let resource = self.dispatcher.registry().bind(event)?;
        let notification_type = self
            .dispatcher
            .store()
            .notification_type(resource.runtime_tag())
            .await?
            .ok_or_else(|| NotificationError::UnknownType(resource.runtime_tag().to_string()))?;

        let instance = &event.instance;
        self.dispatcher
            .targets()
            .save(&instance.kind, &instance.id, &instance.data)
            .await?;

        let notification = self
            .dispatcher
            .store()
            .create_notification(&CreateNotification {
                notification_type_id: notification_type.id,
                title: resource.title(event),
                extra_payload: Value::Object(resource.extra_payload(event)?),
                target_kind: instance.kind.clone(),
                target_id: instance.id.clone(),
            })
            .await?;

        tracing::info!(
            notification_id = notification.id,
            runtime_tag = resource.runtime_tag(),
            target_kind = %instance.kind,
            target_id = %instance.id,
            "Notification created"
        );

        self.dispatcher
            .notify(&notification, resource.as_ref(), event)
            .await
    }

    /// Deliver the given dispatches again. Those no longer `prepared` are
    /// ignored.
    pub async fn resend_notifications(
        &self,
        ids: &[DbId],
    ) -> Result<DispatchSummary, NotificationError> {
        let prepared = self.dispatcher.store().filter_prepared(ids).await?;
        if prepared.len() < ids.len() {
            tracing::info!(
                requested = ids.len(),
                prepared = prepared.len(),
                "Ignoring dispatches that are no longer prepared"
            );
        }
        self.dispatcher.redispatch(&prepared).await
    }

    /// A page of the user's inbox with each entry's in-app content.
    pub async fn inbox_feed(
        &self,
        user_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<InboxEntry>, NotificationError> {
        let store = self.dispatcher.store();
        let dispatches = Inbox::new(store.clone())
            .list_for_user(user_id, limit, offset)
            .await?;
        let ids: Vec<DbId> = dispatches.iter().map(|d| d.id).collect();
        let mut deliveries: HashMap<DbId, _> = store
            .deliveries(&ids)
            .await?
            .into_iter()
            .map(|d| (d.dispatch_id, d))
            .collect();

        let mut entries = Vec::with_capacity(dispatches.len());
        for dispatch in dispatches {
            let Some(delivery) = deliveries.remove(&dispatch.id) else {
                continue;
            };
            let content = self.dispatcher.web_content(&delivery).await?;
            entries.push(InboxEntry {
                dispatch,
                runtime_tag: delivery.runtime_tag,
                title: delivery.notification_title,
                content,
            });
        }
        Ok(entries)
    }

    pub async fn process(&self, task: NotificationTask) -> Result<DispatchSummary, NotificationError> {
        match task {
            NotificationTask::Send(event) => self.send_notifications(&event).await,
            NotificationTask::Resend(ids) => self.resend_notifications(&ids).await,
        }
    }
}
