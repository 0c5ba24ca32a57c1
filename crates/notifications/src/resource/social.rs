//! Social chat resources.
//!
//! `new_chat` announces an invitation to a group chat.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use docket_core::runtime_tags as tags;
use docket_core::types::DbId;
use docket_db::models::user::User;
use serde_json::{json, Map, Value};

use super::{expand_user, without, ContentTemplates, NotificationResource, ResourceMeta, ResourceRegistry};
use crate::directory::RecipientDirectory;
use crate::error::NotificationError;
use crate::event::{NotificationEvent, TriggerInstance};

pub(super) fn register(registry: &mut ResourceRegistry) {
    registry.register(Arc::new(NewGroupChat));
    registry.register(Arc::new(NewChatMessage));
}

/// Timestamp format of `callStartedAt` in end-of-call messages.
const CALL_STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Users were added to a new group chat. Notifies the invited users except
/// the inviter.
///
/// Snapshot (`chat`): `id`, `title`. Context: `inviter_id`, `invited_ids`,
/// optional `message` and `current_site`.
pub struct NewGroupChat;

static NEW_GROUP_CHAT: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_CHAT,
    instance_kind: "chat",
    title: "New Chat Created",
    deep_link: "{base_url}/social/chats/{id}/",
    id_path: "id",
    templates: ContentTemplates {
        web: "{% if inviter %}{{ inviter.full_name }} added you to {{ instance.title }}{% else %}You were added to {{ instance.title }}{% endif %}",
        push: "{% if inviter %}{{ inviter.full_name }} added you to a chat{% else %}You were added to a chat{% endif %}",
        email_subject: "Invitation to a network.",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{% if inviter %}{{ inviter.full_name }}{% else %}Someone{% endif %} added you to <b>{{ instance.title }}</b>.</p>\
{% if message %}<blockquote>{{ message }}</blockquote>{% endif %}\
<p><a href=\"{{ deep_link }}\">Open chat</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewGroupChat {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_GROUP_CHAT
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.context_id("inviter_id")
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let inviter = event.require_context_id("inviter_id")?;
        let invited = event.context_ids("invited_ids");
        Ok(without(directory.users_by_ids(&invited).await?, Some(inviter)))
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let mut extra = Map::new();
        extra.insert("inviter".into(), json!(event.require_context_id("inviter_id")?));
        extra.insert(
            "message".into(),
            event.context_value("message").cloned().unwrap_or(Value::Null),
        );
        extra.insert(
            "current_site".into(),
            json!(event.context_str("current_site").unwrap_or_default()),
        );
        Ok(extra)
    }

    async fn extend_payload(
        &self,
        payload: &mut Map<String, Value>,
        directory: &dyn RecipientDirectory,
    ) -> Result<(), NotificationError> {
        expand_user(payload, "inviter", directory).await
    }
}

/// A message was posted in a group chat. Notifies every chat participant
/// except the author.
///
/// Snapshot (`chat_message`): `chat_id`, `author_id`, `author.full_name`,
/// `author.role`, `type` (`text`, `endCall` or voice), `text`,
/// `chat.participant_ids`.
pub struct NewChatMessage;

static NEW_CHAT_MESSAGE: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_CHAT_MESSAGE,
    instance_kind: "chat_message",
    title: "New Message",
    deep_link: "{base_url}/social/chats/{id}/",
    id_path: "chat_id",
    templates: ContentTemplates {
        web: "{{ message }}",
        push: "{{ message }}",
        email_subject: "New message from {{ instance.author.full_name }}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.author.full_name }} wrote:</p>\
<blockquote>{{ message }}</blockquote>\
<p><a href=\"{{ deep_link }}\">Reply</a></p>",
    },
};

/// Text shown for a chat message, derived from its type.
pub fn message_text(instance: &TriggerInstance) -> String {
    let author = instance
        .field("author.full_name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let text = instance.field("text").and_then(Value::as_str).unwrap_or_default();

    match instance.field("type").and_then(Value::as_str) {
        Some("text") => text.to_string(),
        Some("endCall") => {
            let started = serde_json::from_str::<Value>(text)
                .ok()
                .and_then(|v| v.get("callStartedAt").and_then(Value::as_str).map(str::to_string))
                .and_then(|raw| NaiveDateTime::parse_from_str(&raw, CALL_STARTED_FORMAT).ok())
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            format!("{author} send you a Video Call request at {started}")
        }
        _ => format!("{author} send you a voice message"),
    }
}

#[async_trait]
impl NotificationResource for NewChatMessage {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_CHAT_MESSAGE
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("author_id").ok()
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let author = event.instance.id_at("author_id")?;
        let ids = event.instance.ids_at("chat.participant_ids");
        Ok(without(directory.users_by_ids(&ids).await?, Some(author)))
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let instance = &event.instance;
        let mut extra = Map::new();
        extra.insert("type".into(), instance.field("type").cloned().unwrap_or(Value::Null));
        extra.insert("message".into(), json!(message_text(instance)));
        extra.insert(
            "user_name".into(),
            instance.field("author.full_name").cloned().unwrap_or(Value::Null),
        );
        extra.insert(
            "user_type".into(),
            instance.field("author.role").cloned().unwrap_or(Value::Null),
        );
        Ok(extra)
    }
}
