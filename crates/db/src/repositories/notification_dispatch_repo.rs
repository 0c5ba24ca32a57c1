//! Repository for the `notification_dispatches` table.

use docket_core::dispatch_status::{DispatchStatus, STATUS_PREPARED, STATUS_READ};
use docket_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{DispatchDelivery, NotificationDispatch};

/// Column list for `notification_dispatches` queries.
const COLUMNS: &str =
    "id, notification_id, recipient_id, sender_id, status, created_at, updated_at";

/// Select list for [`DispatchDelivery`] rows. Expects the aliases `d`
/// (dispatch), `n` (notification), `t` (type), `u` (recipient) and `s`
/// (settings, left-joined).
const DELIVERY_SELECT: &str = "SELECT \
        d.id AS dispatch_id, d.status, d.sender_id, \
        n.id AS notification_id, n.title AS notification_title, n.extra_payload, \
        n.target_kind, n.target_id, \
        t.runtime_tag, \
        u.id AS recipient_id, u.uuid AS recipient_uuid, u.email AS recipient_email, \
        u.first_name AS recipient_first_name, u.last_name AS recipient_last_name, \
        u.role AS recipient_role, \
        s.by_email, s.by_push, s.by_chats, s.by_matters, s.by_forums, s.by_contacts \
    FROM notification_dispatches d \
    JOIN notifications n ON n.id = d.notification_id \
    JOIN notification_types t ON t.id = n.notification_type_id \
    JOIN users u ON u.id = d.recipient_id \
    LEFT JOIN notification_settings s ON s.user_id = d.recipient_id";

/// Provides CRUD and status operations for notification dispatches.
pub struct NotificationDispatchRepo;

impl NotificationDispatchRepo {
    /// Create one `prepared` dispatch per recipient.
    ///
    /// Existing `(notification_id, recipient_id)` pairs are skipped, so
    /// calling this twice never duplicates rows. Returns the ids of the rows
    /// created by this call.
    pub async fn create_for_recipients(
        pool: &PgPool,
        notification_id: DbId,
        sender_id: Option<DbId>,
        recipient_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        if recipient_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar(
            "INSERT INTO notification_dispatches (notification_id, recipient_id, sender_id) \
             SELECT $1, r.recipient_id, $2 FROM UNNEST($3::BIGINT[]) AS r(recipient_id) \
             ON CONFLICT (notification_id, recipient_id) DO NOTHING \
             RETURNING id",
        )
        .bind(notification_id)
        .bind(sender_id)
        .bind(recipient_ids)
        .fetch_all(pool)
        .await
    }

    /// Find a dispatch by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<NotificationDispatch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_dispatches WHERE id = $1");
        sqlx::query_as::<_, NotificationDispatch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a dispatch by id, restricted to its recipient.
    pub async fn find_for_recipient(
        pool: &PgPool,
        id: DbId,
        recipient_id: DbId,
    ) -> Result<Option<NotificationDispatch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_dispatches WHERE id = $1 AND recipient_id = $2"
        );
        sqlx::query_as::<_, NotificationDispatch>(&query)
            .bind(id)
            .bind(recipient_id)
            .fetch_optional(pool)
            .await
    }

    /// List all dispatches of a notification.
    pub async fn list_for_notification(
        pool: &PgPool,
        notification_id: DbId,
    ) -> Result<Vec<NotificationDispatch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_dispatches \
             WHERE notification_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, NotificationDispatch>(&query)
            .bind(notification_id)
            .fetch_all(pool)
            .await
    }

    /// Load delivery rows for the given dispatch ids, ordered by id.
    pub async fn list_deliveries(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<DispatchDelivery>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("{DELIVERY_SELECT} WHERE d.id = ANY($1) ORDER BY d.id");
        sqlx::query_as::<_, DispatchDelivery>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Keep only the ids whose dispatch is still `prepared`.
    pub async fn filter_prepared(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar(
            "SELECT id FROM notification_dispatches \
             WHERE id = ANY($1) AND status = $2 \
             ORDER BY id",
        )
        .bind(ids)
        .bind(STATUS_PREPARED)
        .fetch_all(pool)
        .await
    }

    /// List the ids of `prepared` dispatches, least recently attempted
    /// first.
    pub async fn list_prepared_ids(pool: &PgPool, limit: i64) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM notification_dispatches WHERE status = $1 \
             ORDER BY updated_at, id LIMIT $2",
        )
        .bind(STATUS_PREPARED)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Record a delivery attempt on `prepared` dispatches that stay
    /// `prepared`, moving them to the back of [`Self::list_prepared_ids`].
    pub async fn touch_prepared(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE notification_dispatches SET updated_at = NOW() \
             WHERE id = ANY($1) AND status = $2",
        )
        .bind(ids)
        .bind(STATUS_PREPARED)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Move a dispatch from `from` to `to`.
    ///
    /// The update only applies while the row is still in `from`, so a
    /// concurrent transition is never overwritten. Returns `true` when the
    /// row was updated.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        from: DispatchStatus,
        to: DispatchStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notification_dispatches \
             SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count a user's dispatches that are not `read`.
    pub async fn unread_count(pool: &PgPool, recipient_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification_dispatches \
             WHERE recipient_id = $1 AND status <> $2",
        )
        .bind(recipient_id)
        .bind(STATUS_READ)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// List a user's dispatches, unread first, newest first.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationDispatch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_dispatches \
             WHERE recipient_id = $1 \
             ORDER BY (status = $2), updated_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, NotificationDispatch>(&query)
            .bind(recipient_id)
            .bind(STATUS_READ)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
