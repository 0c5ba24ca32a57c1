//! Document resources.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use docket_core::roles::UserRole;
use docket_core::runtime_tags as tags;
use docket_core::types::DbId;
use docket_db::models::user::User;
use serde_json::{json, Map, Value};

use super::{expand_user, without, ContentTemplates, NotificationResource, ResourceMeta, ResourceRegistry};
use crate::directory::RecipientDirectory;
use crate::error::NotificationError;
use crate::event::NotificationEvent;

pub(super) fn register(registry: &mut ResourceRegistry) {
    registry.register(Arc::new(DocumentUploadedToMatter));
    registry.register(Arc::new(DocumentSharedByAttorney));
    registry.register(Arc::new(DocumentUploaded));
}

/// A file was uploaded to a matter folder.
///
/// Notifies the users the document is shared with plus the other side of
/// the matter: the attorney when a client uploaded, the client when an
/// attorney uploaded. The uploader is never notified.
///
/// Snapshot (`document`): `created_by.id`, `created_by.role`,
/// `shared_with_ids`, `matter.client_id`, `matter.attorney_user_id`.
pub struct DocumentUploadedToMatter;

static DOCUMENT_UPLOADED_TO_MATTER: ResourceMeta = ResourceMeta {
    runtime_tag: tags::DOCUMENT_UPLOADED_TO_MATTER,
    instance_kind: "document",
    title: "File uploaded to matter",
    deep_link: "{base_url}/documents/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "{{ instance.created_by.full_name }} uploaded {{ instance.title }} to {{ instance.matter.title }}",
        push: "{{ instance.created_by.full_name }} has uploaded a file to {{ instance.matter.title }}",
        email_subject: "{{ instance.created_by.full_name }} has uploaded a file to the matter",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{% if notification_sender %}{{ notification_sender.full_name }}{% else %}Someone{% endif %} uploaded <b>{{ instance.title }}</b> to {{ instance.matter.title }}.</p>\
<p><a href=\"{{ deep_link }}\">Open document</a></p>",
    },
};

#[async_trait]
impl NotificationResource for DocumentUploadedToMatter {
    fn meta(&self) -> &'static ResourceMeta {
        &DOCUMENT_UPLOADED_TO_MATTER
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("created_by.id").ok()
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let uploader = event.instance.id_at("created_by.id")?;
        let role = event
            .instance
            .field("created_by.role")
            .and_then(Value::as_str)
            .and_then(UserRole::parse);

        let mut ids: BTreeSet<DbId> = event.instance.ids_at("shared_with_ids").into_iter().collect();
        match role {
            Some(UserRole::Client) => {
                ids.insert(event.instance.id_at("matter.attorney_user_id")?);
            }
            Some(UserRole::Attorney) => {
                ids.insert(event.instance.id_at("matter.client_id")?);
            }
            _ => {}
        }
        ids.remove(&uploader);

        let ids: Vec<DbId> = ids.into_iter().collect();
        directory.users_by_ids(&ids).await
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let mut extra = Map::new();
        extra.insert(
            "notification_sender".into(),
            json!(event.instance.id_at("created_by.id")?),
        );
        Ok(extra)
    }

    async fn extend_payload(
        &self,
        payload: &mut Map<String, Value>,
        directory: &dyn RecipientDirectory,
    ) -> Result<(), NotificationError> {
        expand_user(payload, "notification_sender", directory).await
    }
}

/// An attorney added a file to a matter's shared folder. Notifies the
/// matter's client.
///
/// Snapshot (`document`): `matter_id`, `matter.client_id`,
/// `matter.attorney_user_id`, `matter.title`.
pub struct DocumentSharedByAttorney;

static DOCUMENT_SHARED_BY_ATTORNEY: ResourceMeta = ResourceMeta {
    runtime_tag: tags::DOCUMENT_SHARED_BY_ATTORNEY,
    instance_kind: "document",
    title: "File shared",
    deep_link: "{base_url}/matters/{id}",
    id_path: "matter_id",
    templates: ContentTemplates {
        web: "A file was added to the shared folder of {{ instance.matter.title }}",
        push: "New file shared on {{ instance.matter.title }}",
        email_subject: "{{ instance.matter.title }} has had a file added to the shared folder",
        email_body: "<p>Hi {{ user_name }},</p>\
<p><b>{{ instance.title }}</b> was added to the shared folder of {{ instance.matter.title }}.</p>\
<p><a href=\"{{ deep_link }}\">View matter</a></p>",
    },
};

#[async_trait]
impl NotificationResource for DocumentSharedByAttorney {
    fn meta(&self) -> &'static ResourceMeta {
        &DOCUMENT_SHARED_BY_ATTORNEY
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("matter.attorney_user_id").ok()
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let client = event.instance.id_at("matter.client_id")?;
        directory.users_by_ids(&[client]).await
    }
}

/// Someone uploaded a file into a folder owned by another user. Notifies
/// the owner unless they uploaded it themselves.
///
/// Snapshot (`document`): `owner_id`, `created_by.id`,
/// `created_by.full_name`.
pub struct DocumentUploaded;

static DOCUMENT_UPLOADED: ResourceMeta = ResourceMeta {
    runtime_tag: tags::DOCUMENT_UPLOADED,
    instance_kind: "document",
    title: "File uploaded",
    deep_link: "{base_url}/documents/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "{{ instance.created_by.full_name }} uploaded {{ instance.title }}",
        push: "{{ instance.created_by.full_name }} has uploaded a file",
        email_subject: "{{ instance.created_by.full_name }} has uploaded a file to the shared folder",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{% if notification_sender %}{{ notification_sender.full_name }}{% else %}Someone{% endif %} uploaded <b>{{ instance.title }}</b> to your shared folder.</p>\
<p><a href=\"{{ deep_link }}\">Open document</a></p>",
    },
};

#[async_trait]
impl NotificationResource for DocumentUploaded {
    fn meta(&self) -> &'static ResourceMeta {
        &DOCUMENT_UPLOADED
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("created_by.id").ok()
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let owner = event.instance.id_at("owner_id")?;
        let uploader = event.instance.id_at("created_by.id")?;
        Ok(without(directory.users_by_ids(&[owner]).await?, Some(uploader)))
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let mut extra = Map::new();
        extra.insert(
            "notification_sender".into(),
            json!(event.instance.id_at("created_by.id")?),
        );
        Ok(extra)
    }

    async fn extend_payload(
        &self,
        payload: &mut Map<String, Value>,
        directory: &dyn RecipientDirectory,
    ) -> Result<(), NotificationError> {
        expand_user(payload, "notification_sender", directory).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TriggerInstance;
    use crate::testing::FakeDirectory;

    fn event(uploader: DbId, role: &str) -> NotificationEvent {
        NotificationEvent::new(
            tags::DOCUMENT_UPLOADED_TO_MATTER,
            TriggerInstance::new(
                "document",
                30,
                json!({
                    "created_by": {"id": uploader, "role": role},
                    "shared_with_ids": [4, 1],
                    "matter": {"client_id": 2, "attorney_user_id": 1}
                }),
            ),
        )
    }

    #[tokio::test]
    async fn client_upload_notifies_attorney_and_shared_users() {
        let directory = FakeDirectory::default()
            .with_user(1, "attorney")
            .with_user(2, "client")
            .with_user(4, "paralegal");
        let users = DocumentUploadedToMatter
            .recipients(&event(2, "client"), &directory)
            .await
            .unwrap();
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1, 4]);
    }

    #[tokio::test]
    async fn attorney_upload_notifies_client_but_not_uploader() {
        let directory = FakeDirectory::default()
            .with_user(1, "attorney")
            .with_user(2, "client")
            .with_user(4, "paralegal");
        let users = DocumentUploadedToMatter
            .recipients(&event(1, "attorney"), &directory)
            .await
            .unwrap();
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2, 4]);
    }

    #[tokio::test]
    async fn attorney_share_notifies_matter_client_and_links_to_matter() {
        let directory = FakeDirectory::default().with_user(1, "attorney").with_user(2, "client");
        let event = NotificationEvent::new(
            tags::DOCUMENT_SHARED_BY_ATTORNEY,
            TriggerInstance::new(
                "document",
                30,
                json!({"matter_id": 7, "matter": {"client_id": 2, "attorney_user_id": 1}}),
            ),
        );
        let users = DocumentSharedByAttorney.recipients(&event, &directory).await.unwrap();
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(DocumentSharedByAttorney.sender_id(&event), Some(1));

        let payload = json!({"instance": event.instance.data});
        assert_eq!(
            DocumentSharedByAttorney.deep_link(&payload, "https://app.example.com"),
            "https://app.example.com/matters/7"
        );
    }

    #[tokio::test]
    async fn folder_upload_notifies_owner_but_not_self_uploads() {
        let directory = FakeDirectory::default().with_user(1, "attorney").with_user(4, "paralegal");
        let upload = |uploader: DbId| {
            NotificationEvent::new(
                tags::DOCUMENT_UPLOADED,
                TriggerInstance::new("document", 31, json!({"owner_id": 1, "created_by": {"id": uploader}})),
            )
        };

        let users = DocumentUploaded.recipients(&upload(4), &directory).await.unwrap();
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(DocumentUploaded.extra_payload(&upload(4)).unwrap()["notification_sender"], 4);

        assert!(DocumentUploaded.recipients(&upload(1), &directory).await.unwrap().is_empty());
    }
}
