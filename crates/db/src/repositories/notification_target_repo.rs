//! Repository for the `notification_targets` table.

use sqlx::PgPool;

use crate::models::target::NotificationTarget;

/// Column list for `notification_targets` queries.
const COLUMNS: &str = "kind, object_id, data, updated_at";

/// Stores the current snapshot of every domain object a notification can
/// link to.
pub struct NotificationTargetRepo;

impl NotificationTargetRepo {
    /// Insert or replace the snapshot of a target object.
    pub async fn upsert(
        pool: &PgPool,
        kind: &str,
        object_id: &str,
        data: &serde_json::Value,
    ) -> Result<NotificationTarget, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_targets (kind, object_id, data) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (kind, object_id) DO UPDATE SET \
                data = EXCLUDED.data, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationTarget>(&query)
            .bind(kind)
            .bind(object_id)
            .bind(data)
            .fetch_one(pool)
            .await
    }

    /// Find a target snapshot.
    pub async fn find(
        pool: &PgPool,
        kind: &str,
        object_id: &str,
    ) -> Result<Option<NotificationTarget>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_targets WHERE kind = $1 AND object_id = $2"
        );
        sqlx::query_as::<_, NotificationTarget>(&query)
            .bind(kind)
            .bind(object_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a target snapshot. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, kind: &str, object_id: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM notification_targets WHERE kind = $1 AND object_id = $2")
                .bind(kind)
                .bind(object_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
