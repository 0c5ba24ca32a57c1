//! Notification groups gating delivery per topic area.
//!
//! Every notification type belongs to at most one preference group. A user
//! who switches a group off in their settings receives nothing tagged with
//! a runtime tag from that group, regardless of their channel toggles.

use serde::{Deserialize, Serialize};

use crate::runtime_tags as tags;

/// Preference group a runtime tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationGroup {
    Chats,
    Matters,
    Forums,
    Contacts,
}

const CHATS_TAGS: &[&str] = &[tags::NEW_MESSAGE, tags::NEW_CHAT, tags::NEW_VIDEO_CALL];

const MATTERS_TAGS: &[&str] = &[
    tags::MATTER_STATUS_UPDATE,
    tags::NEW_MATTER_SHARED,
    tags::NEW_MATTER_REFERRED,
    tags::NEW_REFERRAL_DECLINED,
    tags::NEW_REFERRAL_ACCEPTED,
    tags::MATTER_STAGE_UPDATE,
    tags::DOCUMENT_UPLOADED_TO_MATTER,
    tags::NEW_BILLING_ITEM,
    tags::NEW_INVOICE,
];

const FORUMS_TAGS: &[&str] = &[
    tags::NEW_POST,
    tags::NEW_ATTORNEY_POST,
    tags::NEW_POST_ON_TOPIC,
];

const CONTACTS_TAGS: &[&str] = &[
    tags::NEW_OPPORTUNITIES,
    tags::NEW_REGISTERED_CONTACT_SHARED,
    tags::NEW_UNREGISTERED_CONTACT_SHARED,
];

impl NotificationGroup {
    /// Resolve the preference group for a runtime tag.
    ///
    /// Tags outside every group return `None` and are gated by the channel
    /// toggles alone.
    pub fn for_runtime_tag(runtime_tag: &str) -> Option<Self> {
        if CHATS_TAGS.contains(&runtime_tag) {
            Some(Self::Chats)
        } else if MATTERS_TAGS.contains(&runtime_tag) {
            Some(Self::Matters)
        } else if FORUMS_TAGS.contains(&runtime_tag) {
            Some(Self::Forums)
        } else if CONTACTS_TAGS.contains(&runtime_tag) {
            Some(Self::Contacts)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chats => "chats",
            Self::Matters => "matters",
            Self::Forums => "forums",
            Self::Contacts => "contacts",
        }
    }

    /// All runtime tags gated by this group.
    pub fn runtime_tags(&self) -> &'static [&'static str] {
        match self {
            Self::Chats => CHATS_TAGS,
            Self::Matters => MATTERS_TAGS,
            Self::Forums => FORUMS_TAGS,
            Self::Contacts => CONTACTS_TAGS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_tags_map_to_chats() {
        assert_eq!(
            NotificationGroup::for_runtime_tag("new_message"),
            Some(NotificationGroup::Chats)
        );
        assert_eq!(
            NotificationGroup::for_runtime_tag("new_video_call"),
            Some(NotificationGroup::Chats)
        );
    }

    #[test]
    fn matter_tags_map_to_matters() {
        for tag in ["new_invoice", "new_billing_item", "document_uploaded_to_matter"] {
            assert_eq!(
                NotificationGroup::for_runtime_tag(tag),
                Some(NotificationGroup::Matters),
                "{tag}"
            );
        }
    }

    #[test]
    fn forum_and_contact_tags() {
        assert_eq!(
            NotificationGroup::for_runtime_tag("new_post_on_topic"),
            Some(NotificationGroup::Forums)
        );
        assert_eq!(
            NotificationGroup::for_runtime_tag("new_opportunities"),
            Some(NotificationGroup::Contacts)
        );
    }

    #[test]
    fn referral_stage_and_invite_tags_are_gated() {
        assert_eq!(
            NotificationGroup::for_runtime_tag("new_referral_accepted"),
            Some(NotificationGroup::Matters)
        );
        assert_eq!(
            NotificationGroup::for_runtime_tag("matter_stage_update"),
            Some(NotificationGroup::Matters)
        );
        assert_eq!(
            NotificationGroup::for_runtime_tag("new_unregistered_contact_shared"),
            Some(NotificationGroup::Contacts)
        );
    }

    #[test]
    fn ungrouped_tags_return_none() {
        assert_eq!(NotificationGroup::for_runtime_tag("new_proposal"), None);
        assert_eq!(NotificationGroup::for_runtime_tag("document_uploaded"), None);
        assert_eq!(NotificationGroup::for_runtime_tag("new_user_registered"), None);
        assert_eq!(NotificationGroup::for_runtime_tag("new_chat_message"), None);
        assert_eq!(NotificationGroup::for_runtime_tag(""), None);
    }

    #[test]
    fn no_tag_belongs_to_two_groups() {
        let groups = [
            NotificationGroup::Chats,
            NotificationGroup::Matters,
            NotificationGroup::Forums,
            NotificationGroup::Contacts,
        ];
        for group in groups {
            for tag in group.runtime_tags() {
                assert_eq!(NotificationGroup::for_runtime_tag(tag), Some(group));
            }
        }
    }
}
