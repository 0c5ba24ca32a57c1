//! Read-only queries over users and their follower relations.

use docket_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::User;

/// Column list for `users` queries.
const COLUMNS: &str = "id, uuid, email, first_name, last_name, role, is_staff, is_active";

/// Same columns qualified with the `u` alias, for joins.
const JOINED_COLUMNS: &str = "u.id, u.uuid, u.email, u.first_name, u.last_name, u.role, \
    u.is_staff, u.is_active";

/// Provides user lookups for recipient resolution.
pub struct UserRepo;

impl UserRepo {
    /// Load active users by id, ordered by id. Unknown ids are skipped.
    pub async fn list_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<User>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE id = ANY($1) AND is_active = true ORDER BY id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List active staff users.
    pub async fn list_staff(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE is_staff = true AND is_active = true ORDER BY id"
        );
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// List the active followers of a user.
    pub async fn list_followers(pool: &PgPool, user_id: DbId) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM user_followers f \
             JOIN users u ON u.id = f.follower_id \
             WHERE f.user_id = $1 AND u.is_active = true \
             ORDER BY u.id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// List the active followers of a forum topic.
    pub async fn list_topic_followers(
        pool: &PgPool,
        topic_id: DbId,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM topic_followers f \
             JOIN users u ON u.id = f.user_id \
             WHERE f.topic_id = $1 AND u.is_active = true \
             ORDER BY u.id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(topic_id)
            .fetch_all(pool)
            .await
    }

    /// List the active followers of a forum post.
    pub async fn list_post_followers(
        pool: &PgPool,
        post_id: DbId,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM post_followers f \
             JOIN users u ON u.id = f.user_id \
             WHERE f.post_id = $1 AND u.is_active = true \
             ORDER BY u.id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(post_id)
            .fetch_all(pool)
            .await
    }
}
