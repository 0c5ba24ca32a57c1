//! Commit-then-enqueue for notifications raised inside a transaction.
//!
//! Domain code that changes data and raises notifications in the same
//! transaction collects the tasks in [`PendingNotifications`]. They reach
//! the queue only after the transaction commits, so a worker never sees an
//! event whose data was rolled back.

use docket_core::types::DbId;
use sqlx::{Postgres, Transaction};

use crate::error::NotificationError;
use crate::event::NotificationEvent;
use crate::queue::{NotificationQueue, NotificationTask};

pub struct PendingNotifications {
    queue: NotificationQueue,
    tasks: Vec<NotificationTask>,
}

impl PendingNotifications {
    pub fn new(queue: NotificationQueue) -> Self {
        Self {
            queue,
            tasks: Vec::new(),
        }
    }

    pub fn push(&mut self, task: NotificationTask) {
        self.tasks.push(task);
    }

    pub fn send(&mut self, event: NotificationEvent) {
        self.push(NotificationTask::Send(event));
    }

    pub fn resend(&mut self, ids: Vec<DbId>) {
        self.push(NotificationTask::Resend(ids));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Commit the transaction, then enqueue every collected task.
    ///
    /// Returns the number of tasks enqueued. Nothing is enqueued when the
    /// commit fails.
    pub async fn commit(mut self, tx: Transaction<'_, Postgres>) -> Result<usize, NotificationError> {
        if let Err(e) = tx.commit().await {
            self.tasks.clear();
            return Err(e.into());
        }
        self.flush()
    }

    /// Roll the transaction back and drop the collected tasks.
    pub async fn rollback(mut self, tx: Transaction<'_, Postgres>) -> Result<(), NotificationError> {
        self.tasks.clear();
        tx.rollback().await?;
        Ok(())
    }

    /// Drop the collected tasks without touching any transaction.
    pub fn discard(mut self) {
        self.tasks.clear();
    }

    pub(crate) fn flush(&mut self) -> Result<usize, NotificationError> {
        let tasks = std::mem::take(&mut self.tasks);
        let count = tasks.len();
        for task in tasks {
            self.queue.enqueue(task)?;
        }
        Ok(count)
    }
}

impl Drop for PendingNotifications {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            tracing::debug!(
                count = self.tasks.len(),
                "Discarding notifications of an uncommitted transaction"
            );
        }
    }
}
