//! Durable hand-off of notification tasks through `notification_outbox`.
//!
//! Producers in other processes call [`stage`] on their own transaction, so
//! a task exists exactly when the data it describes was committed.
//! [`OutboxRelay`] polls the table, claims rows with `FOR UPDATE SKIP LOCKED`
//! and runs them through the [`NotificationService`].

use std::sync::Arc;
use std::time::Duration;

use docket_core::types::DbId;
use docket_db::models::outbox::OutboxEntry;
use docket_db::repositories::NotificationOutboxRepo;
use docket_db::DbPool;
use sqlx::PgConnection;
use tokio_util::sync::CancellationToken;

use crate::error::NotificationError;
use crate::queue::NotificationTask;
use crate::service::NotificationService;

/// Default polling interval for the relay loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of rows claimed per poll.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Claimed rows not completed within this many seconds are claimed again.
pub const DEFAULT_LEASE_SECS: i64 = 300;

/// Database errors are retried through the lease until a row has been
/// claimed this many times.
pub const MAX_ATTEMPTS: i32 = 5;

/// Stage a task on the caller's connection, typically `&mut *tx`.
pub async fn stage(
    conn: &mut PgConnection,
    task: &NotificationTask,
) -> Result<DbId, NotificationError> {
    let value = serde_json::to_value(task)?;
    Ok(NotificationOutboxRepo::stage(conn, &value).await?)
}

/// Polls the outbox and processes claimed tasks one at a time.
pub struct OutboxRelay {
    pool: DbPool,
    service: Arc<NotificationService>,
    poll_interval: Duration,
    batch_size: i64,
    lease_secs: i64,
}

impl OutboxRelay {
    pub fn new(pool: DbPool, service: Arc<NotificationService>) -> Self {
        Self {
            pool,
            service,
            poll_interval: DEFAULT_POLL_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            lease_secs: DEFAULT_LEASE_SECS,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Run the relay loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            batch_size = self.batch_size,
            "Outbox relay started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Outbox relay shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        tracing::error!(error = %e, "Outbox poll failed");
                    }
                }
            }
        }
    }

    /// Claim one batch and process it. Returns the number of rows claimed.
    pub async fn poll_once(&self) -> Result<usize, NotificationError> {
        let entries =
            NotificationOutboxRepo::claim_batch(&self.pool, self.batch_size, self.lease_secs)
                .await?;
        for entry in &entries {
            self.handle(entry).await?;
        }
        Ok(entries.len())
    }

    async fn handle(&self, entry: &OutboxEntry) -> Result<(), NotificationError> {
        let result = match serde_json::from_value::<NotificationTask>(entry.task.clone()) {
            Ok(task) => {
                let label = task.label();
                self.service.process(task).await.map(|summary| (label, summary))
            }
            Err(e) => Err(e.into()),
        };

        let error = match result {
            Ok((label, summary)) => {
                tracing::info!(
                    outbox_id = entry.id,
                    task = label,
                    created = summary.created,
                    sent = summary.sent,
                    failed = summary.failed,
                    skipped = summary.skipped,
                    "Outbox task done"
                );
                None
            }
            Err(NotificationError::Database(e)) if entry.attempts < MAX_ATTEMPTS => {
                tracing::warn!(
                    outbox_id = entry.id,
                    attempts = entry.attempts,
                    error = %e,
                    "Outbox task hit a database error, leaving it for a later claim"
                );
                return Ok(());
            }
            Err(e) => {
                tracing::error!(outbox_id = entry.id, error = %e, "Outbox task failed");
                Some(e.to_string())
            }
        };

        NotificationOutboxRepo::complete(&self.pool, entry.id, error.as_deref()).await?;
        Ok(())
    }
}
