//! Account and contact resources.
//!
//! | Tag                             | Kind             | Fields / context                       |
//! |---------------------------------|------------------|----------------------------------------|
//! | `new_opportunities`             | `user_statistic` | `user_id`, `count`                     |
//! | `new_registered_contact_shared` | `client`         | `user_id`, `display_name`, `email`, `phone`; context `receiver_ids` |
//! | `new_unregistered_contact_shared` | `invite`       | `uuid`, `full_name`, `email`, `phone`; context `receiver_ids` |
//! | `new_user_registered`           | `user`           | `id`, `full_name`                      |

use std::sync::Arc;

use async_trait::async_trait;
use docket_core::runtime_tags as tags;
use docket_core::types::DbId;
use docket_db::models::user::User;
use serde_json::{json, Map, Value};

use super::{ContentTemplates, NotificationResource, ResourceMeta, ResourceRegistry};
use crate::directory::RecipientDirectory;
use crate::error::NotificationError;
use crate::event::NotificationEvent;

pub(super) fn register(registry: &mut ResourceRegistry) {
    registry.register(Arc::new(NewOpportunities));
    registry.register(Arc::new(RegisteredContactShared));
    registry.register(Arc::new(UnregisteredContactShared));
    registry.register(Arc::new(NewUserRegistered));
}

/// New leads matched an attorney. Notifies the statistic's owner.
pub struct NewOpportunities;

static NEW_OPPORTUNITIES: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_OPPORTUNITIES,
    instance_kind: "user_statistic",
    title: "New opportunities",
    deep_link: "{base_url}/leads",
    id_path: "id",
    templates: ContentTemplates {
        web: "You have {{ instance.count }} new opportunities",
        push: "You have {{ instance.count }} new opportunities",
        email_subject: "You have {{ instance.count }} new opportunities.",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>You have {{ instance.count }} new opportunities waiting.</p>\
<p><a href=\"{{ deep_link }}\">See your leads</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewOpportunities {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_OPPORTUNITIES
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("user_id").ok()
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let owner = event.instance.id_at("user_id")?;
        directory.users_by_ids(&[owner]).await
    }
}

/// A registered client was shared with attorneys. Notifies the users listed
/// in the `receiver_ids` context value.
pub struct RegisteredContactShared;

static NEW_REGISTERED_CONTACT_SHARED: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_REGISTERED_CONTACT_SHARED,
    instance_kind: "client",
    title: "New Contact",
    deep_link: "{base_url}/clients",
    id_path: "id",
    templates: ContentTemplates {
        web: "{{ name }} was shared with you",
        push: "New contact shared: {{ name }}",
        email_subject: "New contact shared",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>A new contact was shared with you: <b>{{ name }}</b>{% if email %} ({{ email }}){% endif %}.</p>\
<p><a href=\"{{ deep_link }}\">See your contacts</a></p>",
    },
};

#[async_trait]
impl NotificationResource for RegisteredContactShared {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_REGISTERED_CONTACT_SHARED
    }

    fn sender_id(&self, _event: &NotificationEvent) -> Option<DbId> {
        None
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        directory.users_by_ids(&event.context_ids("receiver_ids")).await
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let instance = &event.instance;
        let field = |path: &str| instance.field(path).cloned().unwrap_or(Value::Null);
        let mut extra = Map::new();
        extra.insert("name".into(), field("display_name"));
        extra.insert("email".into(), field("email"));
        extra.insert("phone".into(), field("phone"));
        extra.insert("is_pending".into(), json!(false));
        extra.insert("id".into(), field("user_id"));
        Ok(extra)
    }
}

/// A pending invite was shared with attorneys. Notifies the users listed
/// in the `receiver_ids` context value.
pub struct UnregisteredContactShared;

static NEW_UNREGISTERED_CONTACT_SHARED: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_UNREGISTERED_CONTACT_SHARED,
    instance_kind: "invite",
    title: "New Contact",
    deep_link: "{base_url}/invites",
    id_path: "uuid",
    templates: ContentTemplates {
        web: "{{ name }} was shared with you",
        push: "New contact shared: {{ name }}",
        email_subject: "New contact shared",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>A new contact was shared with you: <b>{{ name }}</b>{% if email %} ({{ email }}){% endif %}. They have not joined yet.</p>\
<p><a href=\"{{ deep_link }}\">See your invites</a></p>",
    },
};

#[async_trait]
impl NotificationResource for UnregisteredContactShared {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_UNREGISTERED_CONTACT_SHARED
    }

    fn sender_id(&self, _event: &NotificationEvent) -> Option<DbId> {
        None
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        directory.users_by_ids(&event.context_ids("receiver_ids")).await
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let instance = &event.instance;
        let field = |path: &str| instance.field(path).cloned().unwrap_or(Value::Null);
        let mut extra = Map::new();
        extra.insert("name".into(), field("full_name"));
        extra.insert("email".into(), field("email"));
        extra.insert("phone".into(), field("phone"));
        extra.insert("is_pending".into(), json!(true));
        extra.insert("id".into(), field("uuid"));
        Ok(extra)
    }
}

/// A professional account registered. Notifies staff users.
pub struct NewUserRegistered;

static NEW_USER_REGISTERED: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_USER_REGISTERED,
    instance_kind: "user",
    title: "New User",
    deep_link: "{base_url}/admin",
    id_path: "id",
    templates: ContentTemplates {
        web: "{{ name }} registered",
        push: "{{ name }} registered",
        email_subject: "A new user is registered",
        email_body: "<p>{{ name }} ({{ instance.role }}) just registered.</p>\
<p><a href=\"{{ deep_link }}\">Open the admin</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewUserRegistered {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_USER_REGISTERED
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("id").ok()
    }

    async fn recipients(
        &self,
        _event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        directory.staff_users().await
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let mut extra = Map::new();
        extra.insert(
            "name".into(),
            event.instance.field("full_name").cloned().unwrap_or(Value::Null),
        );
        Ok(extra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TriggerInstance;
    use crate::testing::FakeDirectory;

    #[tokio::test]
    async fn contact_shared_uses_receiver_ids_from_context() {
        let directory = FakeDirectory::default()
            .with_user(1, "attorney")
            .with_user(2, "attorney")
            .with_user(3, "attorney");
        let event = NotificationEvent::new(
            tags::NEW_REGISTERED_CONTACT_SHARED,
            TriggerInstance::new(
                "client",
                8,
                json!({"user_id": 8, "display_name": "Dana Client", "email": "d@example.com"}),
            ),
        )
        .with_context("receiver_ids", json!([1, 3]));

        let users = RegisteredContactShared.recipients(&event, &directory).await.unwrap();
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(RegisteredContactShared.sender_id(&event), None);

        let extra = RegisteredContactShared.extra_payload(&event).unwrap();
        assert_eq!(extra["name"], "Dana Client");
        assert_eq!(extra["is_pending"], false);
        assert_eq!(extra["id"], 8);
    }

    #[tokio::test]
    async fn user_registered_notifies_staff() {
        let directory = FakeDirectory::default()
            .with_user(1, "attorney")
            .with_staff(9);
        let event = NotificationEvent::new(
            tags::NEW_USER_REGISTERED,
            TriggerInstance::new("user", 1, json!({"id": 1, "full_name": "Alice Smith"})),
        );
        let users = NewUserRegistered.recipients(&event, &directory).await.unwrap();
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![9]);
        assert_eq!(NewUserRegistered.extra_payload(&event).unwrap()["name"], "Alice Smith");
    }

    #[tokio::test]
    async fn opportunities_notify_statistic_owner() {
        let directory = FakeDirectory::default().with_user(4, "attorney");
        let event = NotificationEvent::new(
            tags::NEW_OPPORTUNITIES,
            TriggerInstance::new("user_statistic", 12, json!({"user_id": 4, "count": 3})),
        );
        let users = NewOpportunities.recipients(&event, &directory).await.unwrap();
        assert_eq!(users[0].id, 4);
    }

    #[tokio::test]
    async fn invite_shared_is_pending_and_keyed_by_uuid() {
        let directory = FakeDirectory::default().with_user(1, "attorney").with_user(2, "attorney");
        let event = NotificationEvent::new(
            tags::NEW_UNREGISTERED_CONTACT_SHARED,
            TriggerInstance::new(
                "invite",
                "6f1c2a",
                json!({"uuid": "6f1c2a", "full_name": "Erin Prospect", "email": "e@example.com"}),
            ),
        )
        .with_context("receiver_ids", json!([2]));

        let users = UnregisteredContactShared.recipients(&event, &directory).await.unwrap();
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2]);

        let extra = UnregisteredContactShared.extra_payload(&event).unwrap();
        assert_eq!(extra["name"], "Erin Prospect");
        assert_eq!(extra["is_pending"], true);
        assert_eq!(extra["id"], "6f1c2a");
        assert!(extra["phone"].is_null());
    }
}
