//! Repository for the `notification_outbox` table.

use docket_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::outbox::OutboxEntry;

/// Column list for `notification_outbox` queries.
const COLUMNS: &str =
    "id, task, attempts, last_error, created_at, claimed_at, processed_at";

/// Provides staging, claiming and completion of outbox rows.
pub struct NotificationOutboxRepo;

impl NotificationOutboxRepo {
    /// Insert a task on the caller's connection.
    ///
    /// Pass `&mut *tx` to stage the task inside an open transaction; the row
    /// becomes visible to the worker only when that transaction commits.
    pub async fn stage(
        conn: &mut PgConnection,
        task: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar("INSERT INTO notification_outbox (task) VALUES ($1) RETURNING id")
            .bind(task)
            .fetch_one(conn)
            .await
    }

    /// Atomically claim up to `limit` unprocessed rows, oldest first.
    ///
    /// Rows claimed more than `lease_secs` ago without completing are
    /// claimable again. Uses `FOR UPDATE SKIP LOCKED` so concurrent workers
    /// never claim the same row.
    pub async fn claim_batch(
        pool: &PgPool,
        limit: i64,
        lease_secs: i64,
    ) -> Result<Vec<OutboxEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE notification_outbox \
             SET claimed_at = NOW(), attempts = attempts + 1 \
             WHERE id IN ( \
                 SELECT id FROM notification_outbox \
                 WHERE processed_at IS NULL \
                   AND (claimed_at IS NULL OR claimed_at < NOW() - make_interval(secs => $2)) \
                 ORDER BY id \
                 LIMIT $1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let mut entries = sqlx::query_as::<_, OutboxEntry>(&query)
            .bind(limit)
            .bind(lease_secs as f64)
            .fetch_all(pool)
            .await?;
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    /// Mark a claimed row processed, recording the error if it failed.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        error: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_outbox \
             SET processed_at = NOW(), last_error = $2 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Count rows not yet processed.
    pub async fn pending_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification_outbox WHERE processed_at IS NULL",
        )
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
