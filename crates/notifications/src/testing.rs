//! In-memory fakes for the notification seams.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use docket_core::dispatch_status::{DispatchStatus, STATUS_PREPARED};
use docket_core::preferences::DeliveryPreferences;
use docket_core::types::DbId;
use docket_db::models::device::PushDevice;
use docket_db::models::notification::{
    CreateNotification, DispatchDelivery, Notification, NotificationDispatch, NotificationType,
};
use docket_db::models::user::User;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::directory::RecipientDirectory;
use crate::error::NotificationError;
use crate::sender::{EmailSender, PushSender};
use crate::store::DispatchStore;
use crate::targets::TargetStore;

pub fn user_with_role(id: DbId, role: &str) -> User {
    User {
        id,
        uuid: Uuid::nil(),
        email: format!("u{id}@example.com"),
        first_name: "User".to_string(),
        last_name: id.to_string(),
        role: role.to_string(),
        is_staff: false,
        is_active: true,
    }
}

pub fn user(id: DbId) -> User {
    user_with_role(id, "client")
}

/// A `prepared` `new_matter` dispatch for `recipient_id` with every
/// preference switched on.
pub fn delivery(dispatch_id: DbId, recipient_id: DbId) -> DispatchDelivery {
    DispatchDelivery {
        dispatch_id,
        status: STATUS_PREPARED.to_string(),
        sender_id: None,
        notification_id: 1,
        notification_title: "A new matter is created".to_string(),
        extra_payload: json!({}),
        target_kind: "matter".to_string(),
        target_id: "1".to_string(),
        runtime_tag: "new_matter".to_string(),
        recipient_id,
        recipient_uuid: Uuid::nil(),
        recipient_email: format!("r{recipient_id}@example.com"),
        recipient_first_name: "Recipient".to_string(),
        recipient_last_name: recipient_id.to_string(),
        recipient_role: "client".to_string(),
        by_email: Some(true),
        by_push: Some(true),
        by_chats: Some(true),
        by_matters: Some(true),
        by_forums: Some(true),
        by_contacts: Some(true),
    }
}

// ---------------------------------------------------------------------------
// FakeDirectory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeDirectory {
    users: BTreeMap<DbId, User>,
    followers: Vec<(DbId, DbId)>,
    topic_followers: Vec<(DbId, DbId)>,
    post_followers: Vec<(DbId, DbId)>,
    devices: Vec<(DbId, String)>,
}

impl FakeDirectory {
    pub fn with_user(mut self, id: DbId, role: &str) -> Self {
        self.users.insert(id, user_with_role(id, role));
        self
    }

    pub fn with_staff(mut self, id: DbId) -> Self {
        let mut staff = user_with_role(id, "support");
        staff.is_staff = true;
        self.users.insert(id, staff);
        self
    }

    pub fn with_follower(mut self, user_id: DbId, follower_id: DbId) -> Self {
        self.followers.push((user_id, follower_id));
        self
    }

    pub fn with_topic_follower(mut self, topic_id: DbId, user_id: DbId) -> Self {
        self.topic_followers.push((topic_id, user_id));
        self
    }

    pub fn with_post_follower(mut self, post_id: DbId, user_id: DbId) -> Self {
        self.post_followers.push((post_id, user_id));
        self
    }

    pub fn with_device(mut self, user_id: DbId, token: &str) -> Self {
        self.devices.push((user_id, token.to_string()));
        self
    }

    fn collect(&self, ids: impl IntoIterator<Item = DbId>) -> Vec<User> {
        let wanted: HashSet<DbId> = ids.into_iter().collect();
        self.users
            .values()
            .filter(|u| wanted.contains(&u.id))
            .cloned()
            .collect()
    }

    fn related(pairs: &[(DbId, DbId)], key: DbId) -> Vec<DbId> {
        pairs.iter().filter(|(k, _)| *k == key).map(|(_, v)| *v).collect()
    }
}

#[async_trait]
impl RecipientDirectory for FakeDirectory {
    async fn users_by_ids(&self, ids: &[DbId]) -> Result<Vec<User>, NotificationError> {
        Ok(self.collect(ids.iter().copied()))
    }

    async fn staff_users(&self) -> Result<Vec<User>, NotificationError> {
        Ok(self.users.values().filter(|u| u.is_staff).cloned().collect())
    }

    async fn followers_of_user(&self, user_id: DbId) -> Result<Vec<User>, NotificationError> {
        Ok(self.collect(Self::related(&self.followers, user_id)))
    }

    async fn topic_followers(&self, topic_id: DbId) -> Result<Vec<User>, NotificationError> {
        Ok(self.collect(Self::related(&self.topic_followers, topic_id)))
    }

    async fn post_followers(&self, post_id: DbId) -> Result<Vec<User>, NotificationError> {
        Ok(self.collect(Self::related(&self.post_followers, post_id)))
    }

    async fn push_devices(&self, user_id: DbId) -> Result<Vec<PushDevice>, NotificationError> {
        Ok(self
            .devices
            .iter()
            .enumerate()
            .filter(|(_, (owner, _))| *owner == user_id)
            .map(|(i, (owner, token))| PushDevice {
                id: i as DbId + 1,
                user_id: *owner,
                registration_id: token.clone(),
                active: true,
                created_at: Utc::now(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// FakeStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    type_tags: Vec<String>,
    notifications: Vec<Notification>,
    dispatches: Vec<NotificationDispatch>,
}

/// In-memory [`DispatchStore`]. Every runtime tag resolves to a
/// notification type unless it was removed with [`FakeStore::without_type`].
#[derive(Default)]
pub struct FakeStore {
    users: BTreeMap<DbId, User>,
    settings: Mutex<HashMap<DbId, DeliveryPreferences>>,
    missing_types: HashSet<String>,
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn with_user(mut self, id: DbId, role: &str) -> Self {
        self.users.insert(id, user_with_role(id, role));
        self
    }

    pub fn with_settings(self, user_id: DbId, prefs: DeliveryPreferences) -> Self {
        self.update_settings(user_id, prefs);
        self
    }

    pub fn update_settings(&self, user_id: DbId, prefs: DeliveryPreferences) {
        self.settings.lock().unwrap().insert(user_id, prefs);
    }

    pub fn without_type(mut self, runtime_tag: &str) -> Self {
        self.missing_types.insert(runtime_tag.to_string());
        self
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.lock().unwrap().notifications.clone()
    }

    pub fn dispatches(&self) -> Vec<NotificationDispatch> {
        self.state.lock().unwrap().dispatches.clone()
    }

    pub fn status_of(&self, id: DbId) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .dispatches
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.status.clone())
    }

    /// Overwrite a dispatch status directly.
    pub fn set_status(&self, id: DbId, status: DispatchStatus) {
        let mut state = self.state.lock().unwrap();
        if let Some(d) = state.dispatches.iter_mut().find(|d| d.id == id) {
            d.status = status.as_str().to_string();
        }
    }
}

#[async_trait]
impl DispatchStore for FakeStore {
    async fn notification_type(
        &self,
        runtime_tag: &str,
    ) -> Result<Option<NotificationType>, NotificationError> {
        if self.missing_types.contains(runtime_tag) {
            return Ok(None);
        }
        let mut state = self.state.lock().unwrap();
        let index = match state.type_tags.iter().position(|t| t == runtime_tag) {
            Some(index) => index,
            None => {
                state.type_tags.push(runtime_tag.to_string());
                state.type_tags.len() - 1
            }
        };
        Ok(Some(NotificationType {
            id: index as DbId + 1,
            group_id: None,
            runtime_tag: runtime_tag.to_string(),
            title: runtime_tag.to_string(),
            description: None,
            is_for_client: true,
            is_for_attorney: true,
            is_for_paralegal: true,
            is_for_enterprise: true,
            is_for_other: true,
            is_for_support: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }))
    }

    async fn create_notification(
        &self,
        input: &CreateNotification,
    ) -> Result<Notification, NotificationError> {
        let mut state = self.state.lock().unwrap();
        let notification = Notification {
            id: state.notifications.len() as DbId + 1,
            notification_type_id: input.notification_type_id,
            title: input.title.clone(),
            extra_payload: input.extra_payload.clone(),
            target_kind: input.target_kind.clone(),
            target_id: input.target_id.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn settings_for(
        &self,
        user_ids: &[DbId],
    ) -> Result<HashMap<DbId, DeliveryPreferences>, NotificationError> {
        let settings = self.settings.lock().unwrap();
        Ok(user_ids
            .iter()
            .filter_map(|id| settings.get(id).map(|p| (*id, *p)))
            .collect())
    }

    async fn create_dispatches(
        &self,
        notification_id: DbId,
        sender_id: Option<DbId>,
        recipient_ids: &[DbId],
    ) -> Result<Vec<DbId>, NotificationError> {
        let mut state = self.state.lock().unwrap();
        let mut created = Vec::new();
        for recipient_id in recipient_ids {
            let exists = state
                .dispatches
                .iter()
                .any(|d| d.notification_id == notification_id && d.recipient_id == *recipient_id);
            if exists {
                continue;
            }
            let id = state.dispatches.len() as DbId + 1;
            state.dispatches.push(NotificationDispatch {
                id,
                notification_id,
                recipient_id: *recipient_id,
                sender_id,
                status: STATUS_PREPARED.to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
            created.push(id);
        }
        Ok(created)
    }

    async fn deliveries(&self, ids: &[DbId]) -> Result<Vec<DispatchDelivery>, NotificationError> {
        let state = self.state.lock().unwrap();
        let settings = self.settings.lock().unwrap();
        let mut out = Vec::new();
        for d in state.dispatches.iter().filter(|d| ids.contains(&d.id)) {
            let Some(n) = state.notifications.iter().find(|n| n.id == d.notification_id) else {
                continue;
            };
            let Some(u) = self.users.get(&d.recipient_id) else {
                continue;
            };
            let prefs = settings.get(&u.id);
            out.push(DispatchDelivery {
                dispatch_id: d.id,
                status: d.status.clone(),
                sender_id: d.sender_id,
                notification_id: n.id,
                notification_title: n.title.clone(),
                extra_payload: n.extra_payload.clone(),
                target_kind: n.target_kind.clone(),
                target_id: n.target_id.clone(),
                runtime_tag: state
                    .type_tags
                    .get((n.notification_type_id - 1) as usize)
                    .cloned()
                    .unwrap_or_default(),
                recipient_id: u.id,
                recipient_uuid: u.uuid,
                recipient_email: u.email.clone(),
                recipient_first_name: u.first_name.clone(),
                recipient_last_name: u.last_name.clone(),
                recipient_role: u.role.clone(),
                by_email: prefs.map(|p| p.by_email),
                by_push: prefs.map(|p| p.by_push),
                by_chats: prefs.map(|p| p.by_chats),
                by_matters: prefs.map(|p| p.by_matters),
                by_forums: prefs.map(|p| p.by_forums),
                by_contacts: prefs.map(|p| p.by_contacts),
            });
        }
        Ok(out)
    }

    async fn find_dispatch(
        &self,
        id: DbId,
    ) -> Result<Option<NotificationDispatch>, NotificationError> {
        Ok(self.dispatches().into_iter().find(|d| d.id == id))
    }

    async fn find_dispatch_for(
        &self,
        id: DbId,
        recipient_id: DbId,
    ) -> Result<Option<NotificationDispatch>, NotificationError> {
        Ok(self
            .dispatches()
            .into_iter()
            .find(|d| d.id == id && d.recipient_id == recipient_id))
    }

    async fn transition(
        &self,
        id: DbId,
        from: DispatchStatus,
        to: DispatchStatus,
    ) -> Result<bool, NotificationError> {
        let mut state = self.state.lock().unwrap();
        match state
            .dispatches
            .iter_mut()
            .find(|d| d.id == id && d.status == from.as_str())
        {
            Some(d) => {
                d.status = to.as_str().to_string();
                d.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn filter_prepared(&self, ids: &[DbId]) -> Result<Vec<DbId>, NotificationError> {
        Ok(self
            .dispatches()
            .into_iter()
            .filter(|d| ids.contains(&d.id) && d.status == STATUS_PREPARED)
            .map(|d| d.id)
            .collect())
    }

    async fn list_prepared(&self, limit: i64) -> Result<Vec<DbId>, NotificationError> {
        let mut rows: Vec<_> = self
            .dispatches()
            .into_iter()
            .filter(|d| d.status == STATUS_PREPARED)
            .collect();
        rows.sort_by_key(|d| (d.updated_at, d.id));
        Ok(rows
            .into_iter()
            .map(|d| d.id)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn record_attempt(&self, ids: &[DbId]) -> Result<(), NotificationError> {
        let mut state = self.state.lock().unwrap();
        // Strictly later than every existing row, so ordering never ties.
        let latest = state.dispatches.iter().map(|d| d.updated_at).max();
        let stamp = latest.map_or_else(Utc::now, |t| t + chrono::Duration::milliseconds(1));
        for d in state
            .dispatches
            .iter_mut()
            .filter(|d| ids.contains(&d.id) && d.status == STATUS_PREPARED)
        {
            d.updated_at = stamp;
        }
        Ok(())
    }

    async fn unread_count(&self, recipient_id: DbId) -> Result<i64, NotificationError> {
        Ok(self
            .dispatches()
            .iter()
            .filter(|d| d.recipient_id == recipient_id && d.status != DispatchStatus::Read.as_str())
            .count() as i64)
    }

    async fn list_for_user(
        &self,
        recipient_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationDispatch>, NotificationError> {
        let mut rows: Vec<_> = self
            .dispatches()
            .into_iter()
            .filter(|d| d.recipient_id == recipient_id)
            .collect();
        rows.sort_by_key(|d| (d.status == DispatchStatus::Read.as_str(), std::cmp::Reverse(d.id)));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn delete_notifications_for_target(
        &self,
        target_kind: &str,
        target_id: &str,
    ) -> Result<u64, NotificationError> {
        let mut state = self.state.lock().unwrap();
        let doomed: HashSet<DbId> = state
            .notifications
            .iter()
            .filter(|n| n.target_kind == target_kind && n.target_id == target_id)
            .map(|n| n.id)
            .collect();
        state.notifications.retain(|n| !doomed.contains(&n.id));
        state.dispatches.retain(|d| !doomed.contains(&d.notification_id));
        Ok(doomed.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// FakeTargets
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeTargets {
    targets: Mutex<HashMap<(String, String), Value>>,
}

impl FakeTargets {
    pub fn with_target(self, kind: &str, id: &str, data: Value) -> Self {
        self.targets
            .lock()
            .unwrap()
            .insert((kind.to_string(), id.to_string()), data);
        self
    }

    pub fn contains(&self, kind: &str, id: &str) -> bool {
        self.targets
            .lock()
            .unwrap()
            .contains_key(&(kind.to_string(), id.to_string()))
    }
}

#[async_trait]
impl TargetStore for FakeTargets {
    async fn load(&self, kind: &str, id: &str) -> Result<Option<Value>, NotificationError> {
        Ok(self
            .targets
            .lock()
            .unwrap()
            .get(&(kind.to_string(), id.to_string()))
            .cloned())
    }

    async fn save(&self, kind: &str, id: &str, data: &Value) -> Result<(), NotificationError> {
        self.targets
            .lock()
            .unwrap()
            .insert((kind.to_string(), id.to_string()), data.clone());
        Ok(())
    }

    async fn forget(&self, kind: &str, id: &str) -> Result<bool, NotificationError> {
        Ok(self
            .targets
            .lock()
            .unwrap()
            .remove(&(kind.to_string(), id.to_string()))
            .is_some())
    }
}

// ---------------------------------------------------------------------------
// RecordingSender
// ---------------------------------------------------------------------------

/// One message handed to a [`RecordingSender`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub dispatch_id: DbId,
    pub recipient_id: DbId,
    pub title: String,
    pub content: String,
}

/// Email and push sender that records messages and answers with a fixed
/// result.
pub struct RecordingSender {
    succeed: AtomicBool,
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingSender {
    pub fn new(succeed: bool) -> Self {
        Self {
            succeed: AtomicBool::new(succeed),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_succeed(&self, succeed: bool) {
        self.succeed.store(succeed, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, delivery: &DispatchDelivery, title: &str, content: &str) -> bool {
        self.sent.lock().unwrap().push(SentMessage {
            dispatch_id: delivery.dispatch_id,
            recipient_id: delivery.recipient_id,
            title: title.to_string(),
            content: content.to_string(),
        });
        self.succeed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send_by_email(&self, delivery: &DispatchDelivery, title: &str, content: &str) -> bool {
        self.record(delivery, title, content)
    }
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send_by_push(&self, delivery: &DispatchDelivery, title: &str, content: &str) -> bool {
        self.record(delivery, title, content)
    }
}
