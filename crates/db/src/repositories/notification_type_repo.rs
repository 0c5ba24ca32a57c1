//! Repository for the `notification_types` and `notification_groups` tables.

use docket_core::roles::UserRole;
use sqlx::PgPool;

use crate::models::notification::{NotificationGroupRow, NotificationType};

/// Column list for `notification_types` queries.
const COLUMNS: &str = "id, group_id, runtime_tag, title, description, is_for_client, \
    is_for_attorney, is_for_paralegal, is_for_enterprise, is_for_other, is_for_support, \
    created_at, updated_at";

/// Provides read operations for the notification type catalog.
pub struct NotificationTypeRepo;

impl NotificationTypeRepo {
    /// Find a notification type by its runtime tag.
    pub async fn get_by_runtime_tag(
        pool: &PgPool,
        runtime_tag: &str,
    ) -> Result<Option<NotificationType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_types WHERE runtime_tag = $1");
        sqlx::query_as::<_, NotificationType>(&query)
            .bind(runtime_tag)
            .fetch_optional(pool)
            .await
    }

    /// List every notification type ordered by group then title.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<NotificationType>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM notification_types ORDER BY group_id NULLS LAST, title");
        sqlx::query_as::<_, NotificationType>(&query)
            .fetch_all(pool)
            .await
    }

    /// List the notification types available to users with `role`.
    pub async fn list_for_role(
        pool: &PgPool,
        role: UserRole,
    ) -> Result<Vec<NotificationType>, sqlx::Error> {
        // The column name comes from a closed enum, never from input.
        let query = format!(
            "SELECT {COLUMNS} FROM notification_types \
             WHERE is_for_{} = true \
             ORDER BY group_id NULLS LAST, title",
            role.as_str()
        );
        sqlx::query_as::<_, NotificationType>(&query)
            .fetch_all(pool)
            .await
    }

    /// List notification groups ordered by title.
    pub async fn list_groups(pool: &PgPool) -> Result<Vec<NotificationGroupRow>, sqlx::Error> {
        sqlx::query_as::<_, NotificationGroupRow>(
            "SELECT id, title, created_at, updated_at FROM notification_groups ORDER BY title",
        )
        .fetch_all(pool)
        .await
    }
}
