//! Fan-out of one notification to its recipients and per-dispatch delivery.
//!
//! [`Dispatcher::notify`] resolves recipients through the resource, drops
//! the ones whose preferences exclude the notification, creates one
//! `prepared` dispatch per remaining recipient and delivers them.
//! [`Dispatcher::redispatch`] delivers existing dispatches again without
//! creating anything.
//!
//! Delivery is sequential. Each dispatch is re-checked against the
//! recipient's current settings, rendered with its own payload and sent on
//! every allowed channel. It becomes `sent` only when every attempted
//! channel succeeded; otherwise it stays `prepared` for a later resend.

use std::sync::Arc;

use docket_core::channels::{CHANNEL_EMAIL, CHANNEL_PUSH};
use docket_core::dispatch_status::{DispatchStatus, STATUS_PREPARED};
use docket_core::preferences::ChannelSelection;
use docket_core::types::DbId;
use docket_db::models::notification::{DispatchDelivery, Notification};
use serde::Serialize;
use serde_json::Value;

use crate::directory::RecipientDirectory;
use crate::error::NotificationError;
use crate::event::NotificationEvent;
use crate::gate::PreferenceGate;
use crate::render::ContentRenderer;
use crate::resource::{NotificationResource, ResourceRegistry};
use crate::sender::{EmailSender, PushSender};
use crate::store::DispatchStore;
use crate::targets::TargetStore;

/// Counts reported by a fan-out or re-dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Dispatch rows created by this run.
    pub created: usize,
    pub sent: usize,
    /// Dispatches left `prepared` after a failed channel or error.
    pub failed: usize,
    /// Dispatches not attempted: already delivered, or excluded by the
    /// recipient's current settings.
    pub skipped: usize,
}

pub struct Dispatcher {
    store: Arc<dyn DispatchStore>,
    directory: Arc<dyn RecipientDirectory>,
    targets: Arc<dyn TargetStore>,
    email: Arc<dyn EmailSender>,
    push: Arc<dyn PushSender>,
    registry: ResourceRegistry,
    gate: PreferenceGate,
    renderer: ContentRenderer,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        directory: Arc<dyn RecipientDirectory>,
        targets: Arc<dyn TargetStore>,
        email: Arc<dyn EmailSender>,
        push: Arc<dyn PushSender>,
        registry: ResourceRegistry,
    ) -> Self {
        Self {
            store,
            directory,
            targets,
            email,
            push,
            registry,
            gate: PreferenceGate::default(),
            renderer: ContentRenderer::new(""),
        }
    }

    pub fn with_gate(mut self, gate: PreferenceGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_renderer(mut self, renderer: ContentRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn DispatchStore> {
        &self.store
    }

    pub fn targets(&self) -> &Arc<dyn TargetStore> {
        &self.targets
    }

    /// Fan a stored notification out to the event's recipients.
    pub async fn notify(
        &self,
        notification: &Notification,
        resource: &dyn NotificationResource,
        event: &NotificationEvent,
    ) -> Result<DispatchSummary, NotificationError> {
        let recipients = resource.recipients(event, self.directory.as_ref()).await?;
        let user_ids: Vec<DbId> = recipients.iter().map(|u| u.id).collect();
        let settings = self.store.settings_for(&user_ids).await?;
        let eligible = self.gate.filter(recipients, &settings, resource.runtime_tag());

        let eligible_ids: Vec<DbId> = eligible.iter().map(|r| r.user.id).collect();
        let created = self
            .store
            .create_dispatches(notification.id, resource.sender_id(event), &eligible_ids)
            .await?;

        tracing::info!(
            notification_id = notification.id,
            runtime_tag = resource.runtime_tag(),
            candidates = user_ids.len(),
            created = created.len(),
            "Notification fanned out"
        );

        let mut summary = self.dispatch_all(&created).await?;
        summary.created = created.len();
        Ok(summary)
    }

    /// Deliver existing dispatches again. No dispatch is created.
    pub async fn redispatch(&self, ids: &[DbId]) -> Result<DispatchSummary, NotificationError> {
        self.dispatch_all(ids).await
    }

    async fn dispatch_all(&self, ids: &[DbId]) -> Result<DispatchSummary, NotificationError> {
        let mut summary = DispatchSummary::default();
        if ids.is_empty() {
            return Ok(summary);
        }

        // Prepared dispatches that were excluded or failed this run.
        let mut unsettled = Vec::new();

        for delivery in self.store.deliveries(ids).await? {
            if delivery.status != STATUS_PREPARED {
                summary.skipped += 1;
                continue;
            }

            let Some(channels) = self.gate.send_channels(&delivery) else {
                tracing::debug!(
                    dispatch_id = delivery.dispatch_id,
                    recipient_id = delivery.recipient_id,
                    "Recipient settings exclude every channel, skipping"
                );
                summary.skipped += 1;
                unsettled.push(delivery.dispatch_id);
                continue;
            };

            let Some(resource) = self.registry.get(&delivery.runtime_tag) else {
                tracing::warn!(
                    dispatch_id = delivery.dispatch_id,
                    runtime_tag = %delivery.runtime_tag,
                    "No resource registered for runtime tag"
                );
                summary.failed += 1;
                unsettled.push(delivery.dispatch_id);
                continue;
            };

            match self.dispatch_one(&delivery, resource.as_ref(), channels).await {
                Ok(true) => summary.sent += 1,
                Ok(false) => {
                    summary.failed += 1;
                    unsettled.push(delivery.dispatch_id);
                }
                Err(e) => {
                    tracing::error!(
                        dispatch_id = delivery.dispatch_id,
                        recipient_id = delivery.recipient_id,
                        error = %e,
                        "Failed to dispatch notification"
                    );
                    summary.failed += 1;
                    unsettled.push(delivery.dispatch_id);
                }
            }
        }

        if !unsettled.is_empty() {
            self.store.record_attempt(&unsettled).await?;
        }

        tracing::info!(
            requested = ids.len(),
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            "Dispatch run finished"
        );
        Ok(summary)
    }

    /// Render the in-app content of a dispatch for its recipient.
    ///
    /// Returns `None` when no resource is registered for the runtime tag.
    pub async fn web_content(
        &self,
        delivery: &DispatchDelivery,
    ) -> Result<Option<String>, NotificationError> {
        let Some(resource) = self.registry.get(&delivery.runtime_tag) else {
            return Ok(None);
        };
        let instance = self
            .targets
            .load(&delivery.target_kind, &delivery.target_id)
            .await?;
        let payload = self.payload_for(delivery, instance, resource.as_ref()).await?;
        Ok(Some(self.renderer.render_web(resource.as_ref(), &payload)))
    }

    async fn payload_for(
        &self,
        delivery: &DispatchDelivery,
        instance: Option<Value>,
        resource: &dyn NotificationResource,
    ) -> Result<Value, NotificationError> {
        let mut payload = self.renderer.prepare_payload(delivery, instance, resource);
        resource
            .extend_payload(&mut payload, self.directory.as_ref())
            .await?;
        Ok(Value::Object(payload))
    }

    /// Render and send one dispatch. Returns whether it was marked `sent`.
    async fn dispatch_one(
        &self,
        delivery: &DispatchDelivery,
        resource: &dyn NotificationResource,
        channels: ChannelSelection,
    ) -> Result<bool, NotificationError> {
        let instance = self
            .targets
            .load(&delivery.target_kind, &delivery.target_id)
            .await?;
        if instance.is_none() {
            tracing::warn!(
                dispatch_id = delivery.dispatch_id,
                target_kind = %delivery.target_kind,
                target_id = %delivery.target_id,
                "Notification target no longer exists"
            );
        }

        let payload = self.payload_for(delivery, instance, resource).await?;

        let mut failed_channels = Vec::new();

        if channels.email {
            let subject = self.renderer.render_email_subject(resource, &payload);
            let body = self.renderer.render_email_body(resource, &payload);
            if !self.email.send_by_email(delivery, &subject, &body).await {
                failed_channels.push(CHANNEL_EMAIL);
            }
        }

        if channels.push {
            let content = self.renderer.render_push(resource, &payload);
            if !self
                .push
                .send_by_push(delivery, &delivery.notification_title, &content)
                .await
            {
                failed_channels.push(CHANNEL_PUSH);
            }
        }

        if !failed_channels.is_empty() {
            tracing::warn!(
                dispatch_id = delivery.dispatch_id,
                recipient_id = delivery.recipient_id,
                runtime_tag = %delivery.runtime_tag,
                failed_channels = ?failed_channels,
                "Delivery failed, dispatch stays prepared"
            );
            return Ok(false);
        }

        let sent = DispatchStatus::Prepared.send()?;
        let moved = self
            .store
            .transition(delivery.dispatch_id, DispatchStatus::Prepared, sent)
            .await?;
        if !moved {
            tracing::debug!(
                dispatch_id = delivery.dispatch_id,
                "Dispatch left prepared state while sending"
            );
        }
        Ok(moved)
    }
}
