//! Attorney promotion resources.

use std::sync::Arc;

use async_trait::async_trait;
use docket_core::runtime_tags as tags;
use docket_core::types::DbId;
use docket_db::models::user::User;

use super::{ContentTemplates, NotificationResource, ResourceMeta, ResourceRegistry};
use crate::directory::RecipientDirectory;
use crate::error::NotificationError;
use crate::event::NotificationEvent;

pub(super) fn register(registry: &mut ResourceRegistry) {
    registry.register(Arc::new(NewAttorneyEvent));
}

/// An attorney published an event. Notifies the attorney's followers.
///
/// Snapshot (`attorney_event`): `attorney_id` (the attorney's user id),
/// `attorney.display_name`, `title`.
pub struct NewAttorneyEvent;

static NEW_ATTORNEY_EVENT: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_ATTORNEY_EVENT,
    instance_kind: "attorney_event",
    title: "New attorney event",
    deep_link: "{base_url}/attorneys/profile/{id}",
    id_path: "attorney_id",
    templates: ContentTemplates {
        web: "{{ instance.attorney.display_name }} added the event {{ instance.title }}",
        push: "New event added by {{ instance.attorney.display_name }}",
        email_subject: "New event added by {{ instance.attorney.display_name }}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.attorney.display_name }} added a new event: <b>{{ instance.title }}</b>.</p>\
<p><a href=\"{{ deep_link }}\">See the attorney's profile</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewAttorneyEvent {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_ATTORNEY_EVENT
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("attorney_id").ok()
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let attorney = event.instance.id_at("attorney_id")?;
        directory.followers_of_user(attorney).await
    }
}
