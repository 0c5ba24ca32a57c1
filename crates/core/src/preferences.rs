//! Per-user delivery preferences and the preference gate.
//!
//! A user's [`DeliveryPreferences`] decide which channels a notification may
//! use and whether a notification group is wanted at all. [`gate`] combines
//! them with a runtime tag into the channels a dispatch is eligible for.

use serde::{Deserialize, Serialize};

use crate::notification_groups::NotificationGroup;

/// Per-user toggles, mirroring a `notification_settings` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPreferences {
    pub by_email: bool,
    pub by_push: bool,
    pub by_chats: bool,
    pub by_matters: bool,
    pub by_forums: bool,
    pub by_contacts: bool,
}

impl Default for DeliveryPreferences {
    fn default() -> Self {
        Self {
            by_email: true,
            by_push: true,
            by_chats: true,
            by_matters: true,
            by_forums: true,
            by_contacts: true,
        }
    }
}

impl DeliveryPreferences {
    /// Whether the given group is switched on.
    pub fn permits_group(&self, group: NotificationGroup) -> bool {
        match group {
            NotificationGroup::Chats => self.by_chats,
            NotificationGroup::Matters => self.by_matters,
            NotificationGroup::Forums => self.by_forums,
            NotificationGroup::Contacts => self.by_contacts,
        }
    }

    pub fn channels(&self) -> ChannelSelection {
        ChannelSelection {
            email: self.by_email,
            push: self.by_push,
        }
    }
}

/// Channels a single dispatch will be attempted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChannelSelection {
    pub email: bool,
    pub push: bool,
}

impl ChannelSelection {
    pub fn is_empty(&self) -> bool {
        !self.email && !self.push
    }
}

/// How users without a settings row are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingSettingsPolicy {
    /// No settings row means no notifications.
    #[default]
    Exclude,
    /// No settings row means the default preferences (everything on).
    Defaults,
}

impl MissingSettingsPolicy {
    /// Parse `exclude` or `defaults` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exclude" => Some(Self::Exclude),
            "defaults" => Some(Self::Defaults),
            _ => None,
        }
    }
}

/// Decide which channels a user may be notified on for a runtime tag.
///
/// Returns `None` when the user must not be notified at all: no settings row
/// under [`MissingSettingsPolicy::Exclude`], both channels off, or the tag's
/// group switched off.
pub fn gate(
    settings: Option<&DeliveryPreferences>,
    runtime_tag: &str,
    policy: MissingSettingsPolicy,
) -> Option<ChannelSelection> {
    let defaults = DeliveryPreferences::default();
    let prefs = match (settings, policy) {
        (Some(prefs), _) => prefs,
        (None, MissingSettingsPolicy::Defaults) => &defaults,
        (None, MissingSettingsPolicy::Exclude) => return None,
    };

    let channels = prefs.channels();
    if channels.is_empty() {
        return None;
    }

    if let Some(group) = NotificationGroup::for_runtime_tag(runtime_tag) {
        if !prefs.permits_group(group) {
            return None;
        }
    }

    Some(channels)
}
