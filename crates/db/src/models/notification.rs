//! Notification entity models and DTOs.

use docket_core::dispatch_status::DispatchStatus;
use docket_core::error::CoreError;
use docket_core::preferences::DeliveryPreferences;
use docket_core::roles::{
    UserRole, RECIPIENT_TYPE_ALL, ROLE_ATTORNEY, ROLE_CLIENT, ROLE_ENTERPRISE, ROLE_PARALEGAL,
};
use docket_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub notification_type_id: DbId,
    pub title: String,
    pub extra_payload: serde_json::Value,
    pub target_kind: String,
    pub target_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotification {
    pub notification_type_id: DbId,
    pub title: String,
    pub extra_payload: serde_json::Value,
    pub target_kind: String,
    pub target_id: String,
}

/// A row from the `notification_dispatches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationDispatch {
    pub id: DbId,
    pub notification_id: DbId,
    pub recipient_id: DbId,
    pub sender_id: Option<DbId>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationDispatch {
    pub fn status(&self) -> Result<DispatchStatus, CoreError> {
        DispatchStatus::parse(&self.status)
    }
}

/// Everything needed to deliver one dispatch: the dispatch, its
/// notification and type tag, the recipient, and the recipient's settings.
///
/// Settings columns come from a `LEFT JOIN` and are `None` when the
/// recipient has no `notification_settings` row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DispatchDelivery {
    pub dispatch_id: DbId,
    pub status: String,
    pub sender_id: Option<DbId>,
    pub notification_id: DbId,
    pub notification_title: String,
    pub extra_payload: serde_json::Value,
    pub target_kind: String,
    pub target_id: String,
    pub runtime_tag: String,
    pub recipient_id: DbId,
    pub recipient_uuid: Uuid,
    pub recipient_email: String,
    pub recipient_first_name: String,
    pub recipient_last_name: String,
    pub recipient_role: String,
    pub by_email: Option<bool>,
    pub by_push: Option<bool>,
    pub by_chats: Option<bool>,
    pub by_matters: Option<bool>,
    pub by_forums: Option<bool>,
    pub by_contacts: Option<bool>,
}

impl DispatchDelivery {
    /// Recipient preferences, or `None` when no settings row exists.
    pub fn preferences(&self) -> Option<DeliveryPreferences> {
        Some(DeliveryPreferences {
            by_email: self.by_email?,
            by_push: self.by_push?,
            by_chats: self.by_chats?,
            by_matters: self.by_matters?,
            by_forums: self.by_forums?,
            by_contacts: self.by_contacts?,
        })
    }
}

/// A row from the `notification_types` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationType {
    pub id: DbId,
    pub group_id: Option<DbId>,
    pub runtime_tag: String,
    pub title: String,
    pub description: Option<String>,
    pub is_for_client: bool,
    pub is_for_attorney: bool,
    pub is_for_paralegal: bool,
    pub is_for_enterprise: bool,
    pub is_for_other: bool,
    pub is_for_support: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationType {
    /// Whether the type is offered to users with the given role.
    pub fn is_for(&self, role: UserRole) -> bool {
        match role {
            UserRole::Client => self.is_for_client,
            UserRole::Attorney => self.is_for_attorney,
            UserRole::Paralegal => self.is_for_paralegal,
            UserRole::Enterprise => self.is_for_enterprise,
            UserRole::Other => self.is_for_other,
            UserRole::Support => self.is_for_support,
        }
    }

    /// Legacy single-value recipient type kept for older clients.
    pub fn recipient_type(&self) -> &'static str {
        if self.is_for_attorney {
            ROLE_ATTORNEY
        } else if self.is_for_client {
            ROLE_CLIENT
        } else if self.is_for_paralegal {
            ROLE_PARALEGAL
        } else if self.is_for_enterprise {
            ROLE_ENTERPRISE
        } else {
            RECIPIENT_TYPE_ALL
        }
    }
}

/// A row from the `notification_groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationGroupRow {
    pub id: DbId,
    pub title: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `notification_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationSetting {
    pub id: DbId,
    pub user_id: DbId,
    pub by_email: bool,
    pub by_push: bool,
    pub by_chats: bool,
    pub by_matters: bool,
    pub by_forums: bool,
    pub by_contacts: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationSetting {
    pub fn preferences(&self) -> DeliveryPreferences {
        DeliveryPreferences {
            by_email: self.by_email,
            by_push: self.by_push,
            by_chats: self.by_chats,
            by_matters: self.by_matters,
            by_forums: self.by_forums,
            by_contacts: self.by_contacts,
        }
    }
}

/// DTO for updating notification settings. `None` fields are left as is.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateNotificationSetting {
    pub by_email: Option<bool>,
    pub by_push: Option<bool>,
    pub by_chats: Option<bool>,
    pub by_matters: Option<bool>,
    pub by_forums: Option<bool>,
    pub by_contacts: Option<bool>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn notification_type(client: bool, attorney: bool, paralegal: bool) -> NotificationType {
        NotificationType {
            id: 1,
            group_id: None,
            runtime_tag: "new_message".to_string(),
            title: "New message".to_string(),
            description: None,
            is_for_client: client,
            is_for_attorney: attorney,
            is_for_paralegal: paralegal,
            is_for_enterprise: false,
            is_for_other: false,
            is_for_support: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn recipient_type_prefers_attorney() {
        assert_eq!(notification_type(true, true, false).recipient_type(), "attorney");
        assert_eq!(notification_type(true, false, true).recipient_type(), "client");
        assert_eq!(notification_type(false, false, true).recipient_type(), "paralegal");
        assert_eq!(notification_type(false, false, false).recipient_type(), "all");
    }

    #[test]
    fn is_for_checks_role_flag() {
        let t = notification_type(true, false, false);
        assert!(t.is_for(UserRole::Client));
        assert!(!t.is_for(UserRole::Attorney));
    }

    #[test]
    fn delivery_without_settings_row_has_no_preferences() {
        let delivery = DispatchDelivery {
            dispatch_id: 1,
            status: "prepared".to_string(),
            sender_id: None,
            notification_id: 1,
            notification_title: "t".to_string(),
            extra_payload: serde_json::json!({}),
            target_kind: "matter".to_string(),
            target_id: "1".to_string(),
            runtime_tag: "new_matter".to_string(),
            recipient_id: 2,
            recipient_uuid: Uuid::nil(),
            recipient_email: "r@example.com".to_string(),
            recipient_first_name: "R".to_string(),
            recipient_last_name: "S".to_string(),
            recipient_role: "client".to_string(),
            by_email: None,
            by_push: None,
            by_chats: None,
            by_matters: None,
            by_forums: None,
            by_contacts: None,
        };
        assert!(delivery.preferences().is_none());

        let with_settings = DispatchDelivery {
            by_email: Some(false),
            by_push: Some(true),
            by_chats: Some(true),
            by_matters: Some(true),
            by_forums: Some(true),
            by_contacts: Some(true),
            ..delivery
        };
        let prefs = with_settings.preferences().expect("settings present");
        assert!(!prefs.by_email);
        assert!(prefs.by_push);
    }
}
