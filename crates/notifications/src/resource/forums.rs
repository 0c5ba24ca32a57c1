//! Forum resources.
//!
//! | Tag                 | Kind            | Fields                     |
//! |---------------------|-----------------|----------------------------|
//! | `new_post`          | `forum_comment` | `post_id`, `author_id`     |
//! | `new_attorney_post` | `forum_comment` | `post_id`, `author_id`     |
//! | `new_post_on_topic` | `forum_post`    | `topic_id`                 |

use std::sync::Arc;

use async_trait::async_trait;
use docket_core::runtime_tags as tags;
use docket_core::types::DbId;
use docket_db::models::user::User;

use super::{without, ContentTemplates, NotificationResource, ResourceMeta, ResourceRegistry};
use crate::directory::RecipientDirectory;
use crate::error::NotificationError;
use crate::event::NotificationEvent;

pub(super) fn register(registry: &mut ResourceRegistry) {
    registry.register(Arc::new(NewComment));
    registry.register(Arc::new(NewAttorneyComment));
    registry.register(Arc::new(NewTopicPost));
}

/// A reply was posted. Notifies the post's followers except the author.
pub struct NewComment;

static NEW_POST: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_POST,
    instance_kind: "forum_comment",
    title: "New comment",
    deep_link: "{base_url}/forum/post/{id}/0",
    id_path: "post_id",
    templates: ContentTemplates {
        web: "{{ instance.author.display_name }} replied on {{ instance.post.title }}",
        push: "New reply on {{ instance.post.title }}",
        email_subject: "New reply on {{ instance.post.title }}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.author.display_name }} replied on <b>{{ instance.post.title }}</b>.</p>\
<p><a href=\"{{ deep_link }}\">Read the reply</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewComment {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_POST
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("author_id").ok()
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let post = event.instance.id_at("post_id")?;
        let author = event.instance.id_at("author_id")?;
        Ok(without(directory.post_followers(post).await?, Some(author)))
    }
}

/// An attorney commented on the forum. Notifies the attorney's followers.
pub struct NewAttorneyComment;

static NEW_ATTORNEY_POST: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_ATTORNEY_POST,
    instance_kind: "forum_comment",
    title: "New attorney comment",
    deep_link: "{base_url}/forum/post/{id}/0",
    id_path: "post_id",
    templates: ContentTemplates {
        web: "{{ instance.author.display_name }} posted on {{ instance.post.title }}",
        push: "New forum activity from {{ instance.author.display_name }}",
        email_subject: "New forum activity from {{ instance.author.display_name }}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.author.display_name }}, whom you follow, posted on <b>{{ instance.post.title }}</b>.</p>\
<p><a href=\"{{ deep_link }}\">Read the post</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewAttorneyComment {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_ATTORNEY_POST
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
        directory.followers_of_user(author).await
    }
}

/// A new post was opened in a topic. Notifies the topic's followers.
pub struct NewTopicPost;

static NEW_POST_ON_TOPIC: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_POST_ON_TOPIC,
    instance_kind: "forum_post",
    title: "New Post",
    deep_link: "{base_url}/forum/post/{id}/0",
    id_path: "id",
    templates: ContentTemplates {
        web: "New post {{ instance.title }} on {{ instance.topic.title }}",
        push: "New post on topic {{ instance.topic.title }}",
        email_subject: "New Post on topic {{ instance.topic.title }}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>A new post, <b>{{ instance.title }}</b>, was opened on {{ instance.topic.title }}.</p>\
<p><a href=\"{{ deep_link }}\">Read the post</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewTopicPost {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_POST_ON_TOPIC
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("author_id").ok()
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let topic = event.instance.id_at("topic_id")?;
        directory.topic_followers(topic).await
    }
}
