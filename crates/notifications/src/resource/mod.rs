//! Notification resources: one strategy object per runtime tag.
//!
//! A resource knows, for one kind of domain event, who receives the
//! notification, what title and extra payload the stored notification
//! carries, and which templates render it on each channel.
//!
//! Instances are JSON snapshots. Every built-in resource documents the
//! snapshot fields it reads; a required field that is missing fails the
//! event with [`NotificationError::MissingField`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use docket_core::template;
use docket_core::types::DbId;
use docket_db::models::user::User;
use serde_json::{Map, Value};

use crate::directory::RecipientDirectory;
use crate::error::NotificationError;
use crate::event::NotificationEvent;
use crate::render::user_json;

pub mod business;
pub mod documents;
pub mod forums;
pub mod promotion;
pub mod social;
pub mod users;

// ---------------------------------------------------------------------------
// Static description
// ---------------------------------------------------------------------------

/// Content templates of a resource, one per channel.
#[derive(Debug, Clone, Copy)]
pub struct ContentTemplates {
    /// In-app text shown by clients.
    pub web: &'static str,
    pub push: &'static str,
    pub email_subject: &'static str,
    /// HTML body.
    pub email_body: &'static str,
}

/// Fixed attributes of a resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceMeta {
    pub runtime_tag: &'static str,
    /// Kind of [`TriggerInstance`](crate::event::TriggerInstance) the
    /// resource accepts.
    pub instance_kind: &'static str,
    /// Default notification title.
    pub title: &'static str,
    /// Deep link with `{base_url}` and `{id}` placeholders.
    pub deep_link: &'static str,
    /// Path inside the instance snapshot that fills `{id}`.
    pub id_path: &'static str,
    pub templates: ContentTemplates,
}

// ---------------------------------------------------------------------------
// NotificationResource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait NotificationResource: Send + Sync {
    fn meta(&self) -> &'static ResourceMeta;

    fn runtime_tag(&self) -> &'static str {
        self.meta().runtime_tag
    }

    fn instance_kind(&self) -> &'static str {
        self.meta().instance_kind
    }

    fn templates(&self) -> &'static ContentTemplates {
        &self.meta().templates
    }

    /// Title stored on the notification.
    fn title(&self, _event: &NotificationEvent) -> String {
        self.meta().title.to_string()
    }

    /// The user the notification is sent on behalf of.
    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.context_id("user_id")
    }

    /// Users the event concerns, before preference filtering.
    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError>;

    /// Values persisted with the notification so later renders do not
    /// depend on the target's current state.
    fn extra_payload(&self, _event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        Ok(Map::new())
    }

    /// Build the deep link from a prepared payload.
    ///
    /// A missing instance yields the link with an empty id.
    fn deep_link(&self, payload: &Value, base_url: &str) -> String {
        let meta = self.meta();
        let id = template::lookup(payload, "instance")
            .and_then(|instance| template::lookup(instance, meta.id_path))
            .map(id_text)
            .unwrap_or_default();
        template::deep_link(meta.deep_link, base_url, &id)
    }

    /// Add resource-specific values to a prepared payload.
    async fn extend_payload(
        &self,
        _payload: &mut Map<String, Value>,
        _directory: &dyn RecipientDirectory,
    ) -> Result<(), NotificationError> {
        Ok(())
    }
}

fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers for the built-in resources
// ---------------------------------------------------------------------------

/// Drop `excluded` from a user list.
pub(crate) fn without(users: Vec<User>, excluded: Option<DbId>) -> Vec<User> {
    match excluded {
        Some(id) => users.into_iter().filter(|u| u.id != id).collect(),
        None => users,
    }
}

/// Replace the user id stored at `key` in the payload with the user's
/// details, or `null` when the user no longer exists.
pub(crate) async fn expand_user(
    payload: &mut Map<String, Value>,
    key: &str,
    directory: &dyn RecipientDirectory,
) -> Result<(), NotificationError> {
    let user_id = payload.get(key).and_then(Value::as_i64);
    let expanded = match user_id {
        Some(id) => directory
            .users_by_ids(&[id])
            .await?
            .first()
            .map(user_json)
            .unwrap_or(Value::Null),
        None => Value::Null,
    };
    payload.insert(key.to_string(), expanded);
    Ok(())
}

// ---------------------------------------------------------------------------
// ResourceRegistry
// ---------------------------------------------------------------------------

/// Maps runtime tags to their resources.
#[derive(Default, Clone)]
pub struct ResourceRegistry {
    resources: HashMap<&'static str, Arc<dyn NotificationResource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in resource.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        business::register(&mut registry);
        documents::register(&mut registry);
        forums::register(&mut registry);
        promotion::register(&mut registry);
        social::register(&mut registry);
        users::register(&mut registry);
        registry
    }

    /// Register a resource, replacing any previous one for its tag.
    pub fn register(&mut self, resource: Arc<dyn NotificationResource>) {
        self.resources.insert(resource.runtime_tag(), resource);
    }

    pub fn get(&self, runtime_tag: &str) -> Option<Arc<dyn NotificationResource>> {
        self.resources.get(runtime_tag).cloned()
    }

    /// Look up the resource for an event and check the instance kind.
    pub fn bind(
        &self,
        event: &NotificationEvent,
    ) -> Result<Arc<dyn NotificationResource>, NotificationError> {
        let resource = self
            .get(&event.runtime_tag)
            .ok_or_else(|| NotificationError::UnknownResource(event.runtime_tag.clone()))?;
        if resource.instance_kind() != event.instance.kind {
            return Err(NotificationError::InstanceKindMismatch {
                runtime_tag: resource.runtime_tag(),
                expected: resource.instance_kind(),
                actual: event.instance.kind.clone(),
            });
        }
        Ok(resource)
    }

    /// Registered runtime tags, sorted.
    pub fn runtime_tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.resources.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use docket_core::runtime_tags as tags;
    use serde_json::json;

    use super::*;
    use crate::event::TriggerInstance;

    #[test]
    fn defaults_cover_every_built_in_tag() {
        let registry = ResourceRegistry::with_defaults();
        for tag in [
            tags::NEW_MESSAGE,
            tags::NEW_CHAT,
            tags::NEW_VIDEO_CALL,
            tags::NEW_CHAT_MESSAGE,
            tags::NEW_MATTER,
            tags::MATTER_STATUS_UPDATE,
            tags::NEW_MATTER_SHARED,
            tags::NEW_MATTER_REFERRED,
            tags::NEW_REFERRAL_DECLINED,
            tags::DOCUMENT_UPLOADED_TO_MATTER,
            tags::NEW_BILLING_ITEM,
            tags::NEW_INVOICE,
            tags::NEW_POST,
            tags::NEW_ATTORNEY_POST,
            tags::NEW_POST_ON_TOPIC,
            tags::NEW_ATTORNEY_EVENT,
            tags::NEW_OPPORTUNITIES,
            tags::NEW_REGISTERED_CONTACT_SHARED,
            tags::NEW_USER_REGISTERED,
            tags::NEW_REFERRAL_ACCEPTED,
            tags::MATTER_STAGE_UPDATE,
            tags::DOCUMENT_SHARED_BY_ATTORNEY,
            tags::DOCUMENT_UPLOADED,
            tags::NEW_PROPOSAL,
            tags::PROPOSAL_WITHDRAWN,
            tags::PROPOSAL_ACCEPTED,
            tags::POST_DEACTIVATED,
            tags::POST_REACTIVATED,
            tags::NEW_UNREGISTERED_CONTACT_SHARED,
        ] {
            let resource = registry.get(tag).unwrap_or_else(|| panic!("{tag} not registered"));
            assert_eq!(resource.runtime_tag(), tag);
            assert!(!resource.templates().email_subject.is_empty(), "{tag} has no subject");
        }
        assert_eq!(registry.runtime_tags().len(), 29);
    }

    #[test]
    fn bind_rejects_unknown_tag() {
        let registry = ResourceRegistry::with_defaults();
        let event = NotificationEvent::new("no_such_tag", TriggerInstance::new("matter", 1, json!({})));
        assert_matches!(
            registry.bind(&event).err(),
            Some(NotificationError::UnknownResource(tag)) if tag == "no_such_tag"
        );
    }

    #[test]
    fn bind_rejects_wrong_instance_kind() {
        let registry = ResourceRegistry::with_defaults();
        let event = NotificationEvent::new(
            tags::MATTER_STATUS_UPDATE,
            TriggerInstance::new("invoice", 1, json!({})),
        );
        assert_matches!(
            registry.bind(&event).err(),
            Some(NotificationError::InstanceKindMismatch { expected: "matter", .. })
        );
    }

    #[test]
    fn default_deep_link_reads_id_path() {
        let registry = ResourceRegistry::with_defaults();
        let resource = registry.get(tags::NEW_MATTER_SHARED).unwrap();
        let payload = json!({"instance": {"id": 3, "matter_id": 42}});
        assert_eq!(
            resource.deep_link(&payload, "https://app.example.com/"),
            "https://app.example.com/matters/42"
        );

        let missing = json!({"instance": null});
        assert_eq!(
            resource.deep_link(&missing, "https://app.example.com"),
            "https://app.example.com/matters/"
        );
    }
}
