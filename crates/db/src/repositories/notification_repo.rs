//! Repository for the `notifications` table.

use docket_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{CreateNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, notification_type_id, title, extra_payload, target_kind, target_id, \
    created_at, updated_at";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications \
                (notification_type_id, title, extra_payload, target_kind, target_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.notification_type_id)
            .bind(&input.title)
            .bind(&input.extra_payload)
            .bind(&input.target_kind)
            .bind(&input.target_id)
            .fetch_one(pool)
            .await
    }

    /// Find a notification by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE id = $1");
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List notifications linked to a target object.
    pub async fn list_for_target(
        pool: &PgPool,
        target_kind: &str,
        target_id: &str,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE target_kind = $1 AND target_id = $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(target_kind)
            .bind(target_id)
            .fetch_all(pool)
            .await
    }

    /// Delete every notification linked to a target object.
    ///
    /// Dispatches are removed by `ON DELETE CASCADE`. Returns the number of
    /// notifications deleted.
    pub async fn delete_for_target(
        pool: &PgPool,
        target_kind: &str,
        target_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE target_kind = $1 AND target_id = $2")
                .bind(target_kind)
                .bind(target_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
