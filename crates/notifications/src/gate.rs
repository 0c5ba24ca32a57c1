//! Recipient filtering by delivery preferences.

use std::collections::{HashMap, HashSet};

use docket_core::preferences::{self, ChannelSelection, DeliveryPreferences, MissingSettingsPolicy};
use docket_core::types::DbId;
use docket_db::models::notification::DispatchDelivery;
use docket_db::models::user::User;

/// A recipient that passed the gate, with the channels it may receive on.
#[derive(Debug, Clone)]
pub struct GatedRecipient {
    pub user: User,
    pub channels: ChannelSelection,
}

/// Applies per-user delivery preferences to recipients and dispatches.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferenceGate {
    policy: MissingSettingsPolicy,
}

impl PreferenceGate {
    pub fn new(policy: MissingSettingsPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MissingSettingsPolicy {
        self.policy
    }

    /// Keep the recipients allowed to receive `runtime_tag`.
    ///
    /// Input order is preserved and repeated users are kept once.
    pub fn filter(
        &self,
        recipients: Vec<User>,
        settings: &HashMap<DbId, DeliveryPreferences>,
        runtime_tag: &str,
    ) -> Vec<GatedRecipient> {
        let mut seen = HashSet::new();
        recipients
            .into_iter()
            .filter(|user| seen.insert(user.id))
            .filter_map(|user| {
                preferences::gate(settings.get(&user.id), runtime_tag, self.policy)
                    .map(|channels| GatedRecipient { user, channels })
            })
            .collect()
    }

    /// Channels an existing dispatch may be sent on, judged against the
    /// recipient's current settings.
    ///
    /// Only the channel toggles are checked here; group toggles were
    /// applied when the dispatch was created.
    pub fn send_channels(&self, delivery: &DispatchDelivery) -> Option<ChannelSelection> {
        let prefs = match (delivery.preferences(), self.policy) {
            (Some(prefs), _) => prefs,
            (None, MissingSettingsPolicy::Defaults) => DeliveryPreferences::default(),
            (None, MissingSettingsPolicy::Exclude) => return None,
        };
        let channels = prefs.channels();
        (!channels.is_empty()).then_some(channels)
    }
}
