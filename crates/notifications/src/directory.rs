//! Recipient lookups used by resources and the push sender.

use async_trait::async_trait;
use docket_core::types::DbId;
use docket_db::models::device::PushDevice;
use docket_db::models::user::User;
use docket_db::repositories::{PushDeviceRepo, UserRepo};
use docket_db::DbPool;

use crate::error::NotificationError;

/// Read access to users, their follower relations and push devices.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Active users with the given ids. Unknown ids are skipped.
    async fn users_by_ids(&self, ids: &[DbId]) -> Result<Vec<User>, NotificationError>;

    /// Active staff users.
    async fn staff_users(&self) -> Result<Vec<User>, NotificationError>;

    /// Active users following `user_id`.
    async fn followers_of_user(&self, user_id: DbId) -> Result<Vec<User>, NotificationError>;

    async fn topic_followers(&self, topic_id: DbId) -> Result<Vec<User>, NotificationError>;

    async fn post_followers(&self, post_id: DbId) -> Result<Vec<User>, NotificationError>;

    /// Active push devices registered by `user_id`.
    async fn push_devices(&self, user_id: DbId) -> Result<Vec<PushDevice>, NotificationError>;
}

/// [`RecipientDirectory`] over the PostgreSQL user tables.
pub struct PgRecipientDirectory {
    pool: DbPool,
}

impl PgRecipientDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientDirectory for PgRecipientDirectory {
    async fn users_by_ids(&self, ids: &[DbId]) -> Result<Vec<User>, NotificationError> {
        Ok(UserRepo::list_by_ids(&self.pool, ids).await?)
    }

    async fn staff_users(&self) -> Result<Vec<User>, NotificationError> {
        Ok(UserRepo::list_staff(&self.pool).await?)
    }

    async fn followers_of_user(&self, user_id: DbId) -> Result<Vec<User>, NotificationError> {
        Ok(UserRepo::list_followers(&self.pool, user_id).await?)
    }

    async fn topic_followers(&self, topic_id: DbId) -> Result<Vec<User>, NotificationError> {
        Ok(UserRepo::list_topic_followers(&self.pool, topic_id).await?)
    }

    async fn post_followers(&self, post_id: DbId) -> Result<Vec<User>, NotificationError> {
        Ok(UserRepo::list_post_followers(&self.pool, post_id).await?)
    }

    async fn push_devices(&self, user_id: DbId) -> Result<Vec<PushDevice>, NotificationError> {
        Ok(PushDeviceRepo::list_active_for_user(&self.pool, user_id).await?)
    }
}
