//! Repository for the `notification_settings` table.

use docket_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{NotificationSetting, UpdateNotificationSetting};

/// Column list for `notification_settings` queries.
const COLUMNS: &str = "id, user_id, by_email, by_push, by_chats, by_matters, by_forums, \
    by_contacts, created_at, updated_at";

/// Provides CRUD operations for per-user notification settings.
pub struct NotificationSettingRepo;

impl NotificationSettingRepo {
    /// Get a user's settings row, if any.
    pub async fn get_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<NotificationSetting>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_settings WHERE user_id = $1");
        sqlx::query_as::<_, NotificationSetting>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Get a user's settings, creating the default row when missing.
    pub async fn get_or_create(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<NotificationSetting, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_settings (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationSetting>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Insert or update a user's settings.
    ///
    /// Uses `COALESCE` to only overwrite fields that are `Some` in the input;
    /// a new row takes the column defaults for the rest.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        input: &UpdateNotificationSetting,
    ) -> Result<NotificationSetting, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_settings \
                (user_id, by_email, by_push, by_chats, by_matters, by_forums, by_contacts) \
             VALUES ($1, COALESCE($2, true), COALESCE($3, true), COALESCE($4, true), \
                     COALESCE($5, true), COALESCE($6, true), COALESCE($7, true)) \
             ON CONFLICT (user_id) DO UPDATE SET \
                by_email = COALESCE($2, notification_settings.by_email), \
                by_push = COALESCE($3, notification_settings.by_push), \
                by_chats = COALESCE($4, notification_settings.by_chats), \
                by_matters = COALESCE($5, notification_settings.by_matters), \
                by_forums = COALESCE($6, notification_settings.by_forums), \
                by_contacts = COALESCE($7, notification_settings.by_contacts), \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationSetting>(&query)
            .bind(user_id)
            .bind(input.by_email)
            .bind(input.by_push)
            .bind(input.by_chats)
            .bind(input.by_matters)
            .bind(input.by_forums)
            .bind(input.by_contacts)
            .fetch_one(pool)
            .await
    }

    /// Load the settings rows for a set of users. Users without a row are
    /// simply absent from the result.
    pub async fn list_for_users(
        pool: &PgPool,
        user_ids: &[DbId],
    ) -> Result<Vec<NotificationSetting>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query =
            format!("SELECT {COLUMNS} FROM notification_settings WHERE user_id = ANY($1)");
        sqlx::query_as::<_, NotificationSetting>(&query)
            .bind(user_ids)
            .fetch_all(pool)
            .await
    }
}
