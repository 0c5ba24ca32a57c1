//! Chat, matter and engagement resources.
//!
//! Snapshot fields read by each resource:
//!
//! | Tag                     | Kind                 | Fields                                                         |
//! |-------------------------|----------------------|----------------------------------------------------------------|
//! | `new_message`           | `matter_comment`     | `author_id`, `participant_ids`, `post_id`, `post.participant_ids` |
//! | `new_video_call`        | `video_call`         | `participant_ids`, `call_url`, `participants[]`                |
//! | `new_matter`            | `matter`             | `client_id`                                                    |
//! | `matter_status_update`  | `matter`             | `client_id`, `attorney.user_id`                                |
//! | `new_matter_shared`     | `matter_shared_with` | `user_id`, `matter_id`, `matter.attorney.user_id`              |
//! | `new_matter_referred`   | `matter`             | `referral.attorney_user_id`, `referral.message`                 |
//! | `new_referral_declined` | `matter`             | `attorney.user_id`                                             |
//! | `new_referral_accepted` | `matter`             | `attorney.user_id`                                             |
//! | `matter_stage_update`   | `matter`             | `client_id`, `stage.title`                                     |
//! | `new_proposal`          | `proposal`           | `post.client_id`, `attorney.user_id`                           |
//! | `proposal_withdrawn`    | `proposal`           | `post.client_id`                                               |
//! | `proposal_accepted`     | `proposal`           | `attorney.user_id`                                             |
//! | `post_deactivated`      | `posted_matter`      | `proposal_attorney_ids`                                        |
//! | `post_reactivated`      | `posted_matter`      | `proposal_attorney_ids`                                        |
//! | `new_invoice`           | `invoice`            | `matter.client_id`, `matter.attorney.user_id`                  |
//! | `new_billing_item`      | `billing_item`       | `matter.client_id`, `matter.attorney.user_id`                  |

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use docket_core::runtime_tags as tags;
use docket_core::template;
use docket_core::types::DbId;
use docket_db::models::user::User;
use serde_json::{json, Map, Value};

use super::{expand_user, without, ContentTemplates, NotificationResource, ResourceMeta, ResourceRegistry};
use crate::directory::RecipientDirectory;
use crate::error::NotificationError;
use crate::event::NotificationEvent;

pub(super) fn register(registry: &mut ResourceRegistry) {
    registry.register(Arc::new(NewMessage));
    registry.register(Arc::new(NewVideoCall));
    registry.register(Arc::new(NewMatter));
    registry.register(Arc::new(MatterStatusUpdate));
    registry.register(Arc::new(MatterShared));
    registry.register(Arc::new(MatterReferred));
    registry.register(Arc::new(ReferralDeclined));
    registry.register(Arc::new(ReferralAccepted));
    registry.register(Arc::new(MatterStageUpdate));
    registry.register(Arc::new(NewProposal));
    registry.register(Arc::new(ProposalWithdrawn));
    registry.register(Arc::new(ProposalAccepted));
    registry.register(Arc::new(PostDeactivated));
    registry.register(Arc::new(PostReactivated));
    registry.register(Arc::new(NewInvoice));
    registry.register(Arc::new(NewBillingItem));
}

// ---------------------------------------------------------------------------
// new_message
// ---------------------------------------------------------------------------

/// A client or attorney posted in a matter topic. Notifies the comment's
/// participants who also take part in the topic, except the author.
pub struct NewMessage;

static NEW_MESSAGE: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_MESSAGE,
    instance_kind: "matter_comment",
    title: "New message",
    deep_link: "{base_url}/matters/messages/{id}",
    id_path: "post_id",
    templates: ContentTemplates {
        web: "{{ instance.author.display_name }} sent a new message in {{ instance.post.matter.title }}",
        push: "{{ instance.author.display_name }}: {{ instance.text }}",
        email_subject: "{% if recipient.is_attorney %}{{ instance.author.display_name }} sent you a new message in {{ instance.post.matter.title }}{% else %}New message from {{ instance.author.display_name }} in {{ instance.post.matter.title }}{% endif %}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.author.display_name }} sent you a new message in <b>{{ instance.post.matter.title }}</b>.</p>\
<p><a href=\"{{ deep_link }}\">Open the conversation</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewMessage {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_MESSAGE
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
        let topic_members: HashSet<DbId> =
            event.instance.ids_at("post.participant_ids").into_iter().collect();
        let ids: Vec<DbId> = event
            .instance
            .ids_at("participant_ids")
            .into_iter()
            .filter(|id| *id != author && topic_members.contains(id))
            .collect();
        directory.users_by_ids(&ids).await
    }
}

// ---------------------------------------------------------------------------
// new_video_call
// ---------------------------------------------------------------------------

/// A video call was started. Notifies every participant except the caller.
/// Context: `caller_id`. The deep link is the call URL itself.
pub struct NewVideoCall;

static NEW_VIDEO_CALL: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_VIDEO_CALL,
    instance_kind: "video_call",
    title: "New video call",
    deep_link: "{base_url}",
    id_path: "id",
    templates: ContentTemplates {
        web: "You are invited to a video call",
        push: "Join the video call{% if other_participants %} with {{ other_participants.0.display_name }}{% endif %}",
        email_subject: "Invitation to a video call.",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>You are invited to a video call{% if other_participants %} with {{ other_participants.0.display_name }}{% endif %}.</p>\
<p><a href=\"{{ deep_link }}\">Join the call</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewVideoCall {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_VIDEO_CALL
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.context_id("caller_id")
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let caller = event.require_context_id("caller_id")?;
        let ids = event.instance.ids_at("participant_ids");
        Ok(without(directory.users_by_ids(&ids).await?, Some(caller)))
    }

    fn deep_link(&self, payload: &Value, _base_url: &str) -> String {
        template::lookup(payload, "instance.call_url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Adds `other_participants`: the call's participants minus the
    /// recipient.
    async fn extend_payload(
        &self,
        payload: &mut Map<String, Value>,
        _directory: &dyn RecipientDirectory,
    ) -> Result<(), NotificationError> {
        let recipient_id = payload
            .get("recipient")
            .and_then(|r| r.get("id"))
            .and_then(Value::as_i64);
        let others: Vec<Value> = payload
            .get("instance")
            .and_then(|i| i.get("participants"))
            .and_then(Value::as_array)
            .map(|participants| {
                participants
                    .iter()
                    .filter(|p| p.get("id").and_then(Value::as_i64) != recipient_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        payload.insert("other_participants".into(), Value::Array(others));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// new_matter
// ---------------------------------------------------------------------------

/// A matter was opened for a client. Notifies the client.
pub struct NewMatter;

static NEW_MATTER: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_MATTER,
    instance_kind: "matter",
    title: "New Matter",
    deep_link: "{base_url}/matters/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "New matter {{ instance.title }} was created",
        push: "{{ instance.attorney.display_name }} created the matter {{ instance.title }}",
        email_subject: "A new matter is created",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.attorney.display_name }} created the matter <b>{{ instance.title }}</b> for you.</p>\
<p><a href=\"{{ deep_link }}\">View matter</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewMatter {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_MATTER
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let client = event.instance.id_at("client_id")?;
        directory.users_by_ids(&[client]).await
    }
}

// ---------------------------------------------------------------------------
// matter_status_update
// ---------------------------------------------------------------------------

/// The attorney changed a matter's status. Notifies the client.
///
/// Context: `new_status`, stored in the extra payload so later renders keep
/// showing the status the notification was about.
pub struct MatterStatusUpdate;

static MATTER_STATUS_UPDATE: ResourceMeta = ResourceMeta {
    runtime_tag: tags::MATTER_STATUS_UPDATE,
    instance_kind: "matter",
    title: "Matter status update",
    deep_link: "{base_url}/matters/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "{{ instance.title }} status changed to {{ new_status }}",
        push: "{{ instance.attorney.display_name }} changed {{ instance.title }} to {{ new_status }}",
        email_subject: "Matter status change from {{ instance.attorney.display_name }} on {{ instance.title }}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>The status of <b>{{ instance.title }}</b> is now <b>{{ new_status }}</b>.</p>\
<p><a href=\"{{ deep_link }}\">View matter</a></p>",
    },
};

#[async_trait]
impl NotificationResource for MatterStatusUpdate {
    fn meta(&self) -> &'static ResourceMeta {
        &MATTER_STATUS_UPDATE
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("attorney.user_id").ok()
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let client = event.instance.id_at("client_id")?;
        directory.users_by_ids(&[client]).await
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let new_status = event
            .context_value("new_status")
            .cloned()
            .ok_or_else(|| NotificationError::MissingField("context.new_status".to_string()))?;
        let mut extra = Map::new();
        extra.insert("new_status".into(), new_status);
        Ok(extra)
    }
}

// ---------------------------------------------------------------------------
// new_matter_shared
// ---------------------------------------------------------------------------

/// A matter was shared with another attorney or support user. Notifies the
/// user it was shared with.
///
/// Context: `inviter_id`, `title`, `message`. The title replaces the
/// default notification title when given.
pub struct MatterShared;

static NEW_MATTER_SHARED: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_MATTER_SHARED,
    instance_kind: "matter_shared_with",
    title: "New Matter Shared",
    deep_link: "{base_url}/matters/{id}",
    id_path: "matter_id",
    templates: ContentTemplates {
        web: "{% if inviter %}{{ inviter.full_name }} shared {{ instance.matter.title }} with you{% else %}{{ instance.matter.title }} was shared with you{% endif %}",
        push: "{% if inviter %}{{ inviter.full_name }} shared a matter with you{% else %}A matter was shared with you{% endif %}",
        email_subject: "{% if inviter %}New shared matter from {{ inviter.full_name }}{% else %}New shared matter {{ instance.matter.title }}{% endif %}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p><b>{{ title }}</b></p>\
<p>{{ message }}</p>\
<p><a href=\"{{ deep_link }}\">View matter</a></p>",
    },
};

#[async_trait]
impl NotificationResource for MatterShared {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_MATTER_SHARED
    }

    fn title(&self, event: &NotificationEvent) -> String {
        event
            .context_str("title")
            .filter(|t| !t.is_empty())
            .unwrap_or(NEW_MATTER_SHARED.title)
            .to_string()
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("matter.attorney.user_id").ok()
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let user = event.instance.id_at("user_id")?;
        directory.users_by_ids(&[user]).await
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let mut extra = Map::new();
        extra.insert("title".into(), json!(self.title(event)));
        extra.insert("inviter_id".into(), json!(event.require_context_id("inviter_id")?));
        extra.insert(
            "message".into(),
            json!(event.context_str("message").unwrap_or_default()),
        );
        Ok(extra)
    }

    /// Adds `inviter`, resolved from the stored `inviter_id`.
    async fn extend_payload(
        &self,
        payload: &mut Map<String, Value>,
        directory: &dyn RecipientDirectory,
    ) -> Result<(), NotificationError> {
        let inviter = payload.get("inviter_id").cloned().unwrap_or(Value::Null);
        payload.insert("inviter".into(), inviter);
        expand_user(payload, "inviter", directory).await
    }
}

// ---------------------------------------------------------------------------
// new_matter_referred
// ---------------------------------------------------------------------------

/// A matter was referred to another attorney. Notifies the referral's
/// attorney. Context: `notification_sender_id`.
pub struct MatterReferred;

static NEW_MATTER_REFERRED: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_MATTER_REFERRED,
    instance_kind: "matter",
    title: "New Matter Referred",
    deep_link: "{base_url}/matters/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "{% if notification_sender %}{{ notification_sender.full_name }} referred {{ instance.title }} to you{% else %}{{ instance.title }} was referred to you{% endif %}",
        push: "{% if notification_sender %}New matter referred from {{ notification_sender.full_name }}{% else %}New matter referred{% endif %}",
        email_subject: "{% if notification_sender %}New matter referred from {{ notification_sender.full_name }}{% else %}New referred matter {{ instance.title }}{% endif %}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p><b>{{ instance.title }}</b> was referred to you.</p>\
{% if message %}<p>{{ message }}</p>{% endif %}\
<p><a href=\"{{ deep_link }}\">Review the referral</a></p>",
    },
};

#[async_trait]
impl NotificationResource for MatterReferred {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_MATTER_REFERRED
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let attorney = event.instance.id_at("referral.attorney_user_id")?;
        directory.users_by_ids(&[attorney]).await
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let mut extra = Map::new();
        extra.insert(
            "message".into(),
            event.instance.field("referral.message").cloned().unwrap_or(Value::Null),
        );
        extra.insert(
            "notification_sender".into(),
            json!(event.require_context_id("notification_sender_id")?),
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

// ---------------------------------------------------------------------------
// new_referral_declined
// ---------------------------------------------------------------------------

/// A referred attorney declined. Notifies the matter's attorney.
/// Context: `notification_sender_id`.
pub struct ReferralDeclined;

static NEW_REFERRAL_DECLINED: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_REFERRAL_DECLINED,
    instance_kind: "matter",
    title: "Referral Declined",
    deep_link: "{base_url}/matters/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "{% if notification_sender %}{{ notification_sender.full_name }} declined the referral of {{ instance.title }}{% else %}The referral of {{ instance.title }} was declined{% endif %}",
        push: "{% if notification_sender %}Referral declined by {{ notification_sender.full_name }}{% else %}Referral declined{% endif %}",
        email_subject: "{% if notification_sender %}Referral declined by {{ notification_sender.full_name }}{% else %}Matter referral declined {{ instance.title }}{% endif %}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>The referral of <b>{{ instance.title }}</b> was declined.</p>\
<p><a href=\"{{ deep_link }}\">View matter</a></p>",
    },
};

#[async_trait]
impl NotificationResource for ReferralDeclined {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_REFERRAL_DECLINED
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let attorney = event.instance.id_at("attorney.user_id")?;
        directory.users_by_ids(&[attorney]).await
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let mut extra = Map::new();
        extra.insert(
            "notification_sender".into(),
            json!(event.require_context_id("notification_sender_id")?),
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

// ---------------------------------------------------------------------------
// new_referral_accepted
// ---------------------------------------------------------------------------

/// A referred attorney accepted the matter. Notifies the matter's attorney.
/// Context: `notification_sender_id`.
pub struct ReferralAccepted;

static NEW_REFERRAL_ACCEPTED: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_REFERRAL_ACCEPTED,
    instance_kind: "matter",
    title: "Referral Accepted",
    deep_link: "{base_url}/matters/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "{% if notification_sender %}{{ notification_sender.full_name }} accepted the referral of {{ instance.title }}{% else %}The referral of {{ instance.title }} was accepted{% endif %}",
        push: "{% if notification_sender %}Referral accepted by {{ notification_sender.full_name }}{% else %}Referral accepted{% endif %}",
        email_subject: "{% if notification_sender %}Referral accepted from {{ notification_sender.full_name }}{% else %}Matter referral accepted {{ instance.title }}{% endif %}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>The referral of <b>{{ instance.title }}</b> was accepted.</p>\
<p><a href=\"{{ deep_link }}\">View matter</a></p>",
    },
};

#[async_trait]
impl NotificationResource for ReferralAccepted {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_REFERRAL_ACCEPTED
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let attorney = event.instance.id_at("attorney.user_id")?;
        directory.users_by_ids(&[attorney]).await
    }

    fn extra_payload(&self, event: &NotificationEvent) -> Result<Map<String, Value>, NotificationError> {
        let mut extra = Map::new();
        extra.insert(
            "notification_sender".into(),
            json!(event.require_context_id("notification_sender_id")?),
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

// ---------------------------------------------------------------------------
// matter_stage_update
// ---------------------------------------------------------------------------

/// The attorney moved a matter to another stage. Notifies the client.
pub struct MatterStageUpdate;

static MATTER_STAGE_UPDATE: ResourceMeta = ResourceMeta {
    runtime_tag: tags::MATTER_STAGE_UPDATE,
    instance_kind: "matter",
    title: "Matter stage update",
    deep_link: "{base_url}/matters/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "{{ instance.title }} moved to stage {{ instance.stage.title }}",
        push: "{{ instance.title }} moved to stage {{ instance.stage.title }}",
        email_subject: "Matter stage changed to {{ instance.stage.title }} on {{ instance.title }}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p><b>{{ instance.title }}</b> is now at stage <b>{{ instance.stage.title }}</b>.</p>\
<p><a href=\"{{ deep_link }}\">View matter</a></p>",
    },
};

#[async_trait]
impl NotificationResource for MatterStageUpdate {
    fn meta(&self) -> &'static ResourceMeta {
        &MATTER_STAGE_UPDATE
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let client = event.instance.id_at("client_id")?;
        directory.users_by_ids(&[client]).await
    }
}

// ---------------------------------------------------------------------------
// Proposals on posted matters
// ---------------------------------------------------------------------------

/// Client who posted the matter a proposal answers.
async fn post_client(
    event: &NotificationEvent,
    directory: &dyn RecipientDirectory,
) -> Result<Vec<User>, NotificationError> {
    let client = event.instance.id_at("post.client_id")?;
    directory.users_by_ids(&[client]).await
}

/// Attorneys who sent proposals on a posted matter.
async fn proposal_attorneys(
    event: &NotificationEvent,
    directory: &dyn RecipientDirectory,
) -> Result<Vec<User>, NotificationError> {
    let ids = event.instance.ids_at("proposal_attorney_ids");
    directory.users_by_ids(&ids).await
}

/// An attorney submitted a proposal. Notifies the client who posted the
/// matter.
pub struct NewProposal;

static NEW_PROPOSAL: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_PROPOSAL,
    instance_kind: "proposal",
    title: "New Proposal Submitted",
    deep_link: "{base_url}/business/proposals/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "{{ instance.attorney.full_name }} submitted a proposal on {{ instance.post.title }}",
        push: "New proposal from {{ instance.attorney.full_name }}",
        email_subject: "{{ instance.attorney.full_name }} has submitted a proposal on the {{ instance.post.title }}.",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.attorney.full_name }} submitted a proposal on <b>{{ instance.post.title }}</b>.</p>\
<p><a href=\"{{ deep_link }}\">Review the proposal</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewProposal {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_PROPOSAL
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("attorney.user_id").ok()
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        post_client(event, directory).await
    }
}

/// An attorney withdrew a proposal. Notifies the client who posted the
/// matter.
pub struct ProposalWithdrawn;

static PROPOSAL_WITHDRAWN: ResourceMeta = ResourceMeta {
    runtime_tag: tags::PROPOSAL_WITHDRAWN,
    instance_kind: "proposal",
    title: "Proposal Withdrawn",
    deep_link: "{base_url}/business/proposals/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "{{ instance.attorney.full_name }} withdrew the proposal on {{ instance.post.title }}",
        push: "{{ instance.attorney.full_name }} withdrew a proposal",
        email_subject: "{{ instance.attorney.full_name }} has withdrawn the proposal submitted on the {{ instance.post.title }}.",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.attorney.full_name }} withdrew the proposal on <b>{{ instance.post.title }}</b>.</p>\
<p><a href=\"{{ deep_link }}\">View proposal</a></p>",
    },
};

#[async_trait]
impl NotificationResource for ProposalWithdrawn {
    fn meta(&self) -> &'static ResourceMeta {
        &PROPOSAL_WITHDRAWN
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        post_client(event, directory).await
    }
}

/// The client accepted a proposal. Notifies the proposing attorney.
pub struct ProposalAccepted;

static PROPOSAL_ACCEPTED: ResourceMeta = ResourceMeta {
    runtime_tag: tags::PROPOSAL_ACCEPTED,
    instance_kind: "proposal",
    title: "Proposal Accepted",
    deep_link: "{base_url}/business/proposals/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "Your proposal on {{ instance.post.title }} was accepted",
        push: "Your proposal on {{ instance.post.title }} was accepted",
        email_subject: "Your proposal on the {{ instance.post.title }} has been accepted.",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>Your proposal on <b>{{ instance.post.title }}</b> has been accepted.</p>\
<p><a href=\"{{ deep_link }}\">View proposal</a></p>",
    },
};

#[async_trait]
impl NotificationResource for ProposalAccepted {
    fn meta(&self) -> &'static ResourceMeta {
        &PROPOSAL_ACCEPTED
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        let attorney = event.instance.id_at("attorney.user_id")?;
        directory.users_by_ids(&[attorney]).await
    }
}

/// The client deactivated a posted matter. Notifies every attorney with a
/// proposal on it.
pub struct PostDeactivated;

static POST_DEACTIVATED: ResourceMeta = ResourceMeta {
    runtime_tag: tags::POST_DEACTIVATED,
    instance_kind: "posted_matter",
    title: "Posted Matter Deactivated",
    deep_link: "{base_url}/business/posted-matters/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "{{ instance.client.full_name }} deactivated {{ instance.title }}",
        push: "{{ instance.title }} was deactivated",
        email_subject: "{{ instance.client.full_name }} has deactivated {{ instance.title }}.",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.client.full_name }} deactivated <b>{{ instance.title }}</b>, which you sent a proposal on.</p>\
<p><a href=\"{{ deep_link }}\">View posted matter</a></p>",
    },
};

#[async_trait]
impl NotificationResource for PostDeactivated {
    fn meta(&self) -> &'static ResourceMeta {
        &POST_DEACTIVATED
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        proposal_attorneys(event, directory).await
    }
}

/// The client reactivated a posted matter. Notifies every attorney with a
/// proposal on it.
pub struct PostReactivated;

static POST_REACTIVATED: ResourceMeta = ResourceMeta {
    runtime_tag: tags::POST_REACTIVATED,
    instance_kind: "posted_matter",
    title: "Posted Matter Reactivated",
    deep_link: "{base_url}/business/posted-matters/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "{{ instance.client.full_name }} reactivated {{ instance.title }}",
        push: "{{ instance.title }} is active again",
        email_subject: "{{ instance.client.full_name }} has reactivated {{ instance.title }}.",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.client.full_name }} reactivated <b>{{ instance.title }}</b>, which you sent a proposal on.</p>\
<p><a href=\"{{ deep_link }}\">View posted matter</a></p>",
    },
};

#[async_trait]
impl NotificationResource for PostReactivated {
    fn meta(&self) -> &'static ResourceMeta {
        &POST_REACTIVATED
    }

    async fn recipients(
        &self,
        event: &NotificationEvent,
        directory: &dyn RecipientDirectory,
    ) -> Result<Vec<User>, NotificationError> {
        proposal_attorneys(event, directory).await
    }
}

// ---------------------------------------------------------------------------
// new_invoice / new_billing_item
// ---------------------------------------------------------------------------

/// An invoice was issued on a matter. Notifies the matter's client.
pub struct NewInvoice;

static NEW_INVOICE: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_INVOICE,
    instance_kind: "invoice",
    title: "New invoice",
    deep_link: "{base_url}/matters/invoice/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "New invoice for {{ instance.matter.title }}",
        push: "New invoice from {{ instance.matter.attorney.display_name }}",
        email_subject: "New invoice from {{ instance.matter.attorney.display_name }}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.matter.attorney.display_name }} sent you an invoice for <b>{{ instance.matter.title }}</b>.</p>\
<p><a href=\"{{ deep_link }}\">View invoice</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewInvoice {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_INVOICE
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("matter.attorney.user_id").ok()
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

/// A billing item was added to a matter. Notifies the matter's client.
pub struct NewBillingItem;

static NEW_BILLING_ITEM: ResourceMeta = ResourceMeta {
    runtime_tag: tags::NEW_BILLING_ITEM,
    instance_kind: "billing_item",
    title: "New billing item",
    deep_link: "{base_url}/matters/billing-item/{id}",
    id_path: "id",
    templates: ContentTemplates {
        web: "New billing item on {{ instance.matter.title }}",
        push: "New billing item from {{ instance.matter.attorney.display_name }}",
        email_subject: "New billing item from {{ instance.matter.attorney.display_name }}",
        email_body: "<p>Hi {{ user_name }},</p>\
<p>{{ instance.matter.attorney.display_name }} added a billing item to <b>{{ instance.matter.title }}</b>.</p>\
<p><a href=\"{{ deep_link }}\">View billing item</a></p>",
    },
};

#[async_trait]
impl NotificationResource for NewBillingItem {
    fn meta(&self) -> &'static ResourceMeta {
        &NEW_BILLING_ITEM
    }

    fn sender_id(&self, event: &NotificationEvent) -> Option<DbId> {
        event.instance.id_at("matter.attorney.user_id").ok()
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
