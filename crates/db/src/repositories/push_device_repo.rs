//! Repository for the `push_devices` table.

use docket_core::types::DbId;
use sqlx::PgPool;

use crate::models::device::PushDevice;

/// Column list for `push_devices` queries.
const COLUMNS: &str = "id, user_id, registration_id, active, created_at";

/// Provides lookups and registration for push devices.
pub struct PushDeviceRepo;

impl PushDeviceRepo {
    /// List a user's active devices.
    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PushDevice>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM push_devices \
             WHERE user_id = $1 AND active = true \
             ORDER BY id"
        );
        sqlx::query_as::<_, PushDevice>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Register a device for a user.
    ///
    /// A registration id already known for another user is moved to this
    /// user and reactivated.
    pub async fn register(
        pool: &PgPool,
        user_id: DbId,
        registration_id: &str,
    ) -> Result<PushDevice, sqlx::Error> {
        let query = format!(
            "INSERT INTO push_devices (user_id, registration_id) VALUES ($1, $2) \
             ON CONFLICT (registration_id) DO UPDATE SET \
                user_id = EXCLUDED.user_id, \
                active = true \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PushDevice>(&query)
            .bind(user_id)
            .bind(registration_id)
            .fetch_one(pool)
            .await
    }

    /// Mark a device inactive. Returns `true` if the device existed.
    pub async fn deactivate(pool: &PgPool, registration_id: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE push_devices SET active = false WHERE registration_id = $1")
                .bind(registration_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
