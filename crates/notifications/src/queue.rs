//! Background queue for notification work.
//!
//! Producers push [`NotificationTask`]s through a [`NotificationQueue`];
//! a single [`NotificationWorker`] drains them one at a time, so the
//! dispatches of one notification are never processed concurrently.

use std::sync::Arc;

use docket_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::NotificationError;
use crate::event::NotificationEvent;
use crate::service::NotificationService;

/// One unit of notification work.
///
/// Serialized as `{"kind": "send" | "resend", "payload": ...}` when staged
/// in the outbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum NotificationTask {
    /// Create a notification for the event and fan it out.
    Send(NotificationEvent),
    /// Deliver existing dispatches again.
    Resend(Vec<DbId>),
}

impl NotificationTask {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Send(_) => "send",
            Self::Resend(_) => "resend",
        }
    }
}

/// Cloneable producer side of the notification queue.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::UnboundedSender<NotificationTask>,
}

impl NotificationQueue {
    /// Create a queue and the receiver to hand to a [`NotificationWorker`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn enqueue(&self, task: NotificationTask) -> Result<(), NotificationError> {
        self.sender
            .send(task)
            .map_err(|_| NotificationError::QueueClosed)
    }
}

// ---------------------------------------------------------------------------
// NotificationWorker
// ---------------------------------------------------------------------------

/// Consumes queued tasks and runs them through the [`NotificationService`].
pub struct NotificationWorker {
    service: Arc<NotificationService>,
}

impl NotificationWorker {
    pub fn new(service: Arc<NotificationService>) -> Self {
        Self { service }
    }

    /// Process tasks until the token is cancelled or every queue handle is
    /// dropped. A failing task is logged and does not stop the loop.
    pub async fn run(
        &self,
        mut receiver: mpsc::UnboundedReceiver<NotificationTask>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification worker cancelled");
                    break;
                }
                task = receiver.recv() => {
                    let Some(task) = task else {
                        tracing::info!("Notification queue closed, worker shutting down");
                        break;
                    };
                    self.handle(task).await;
                }
            }
        }
    }

    async fn handle(&self, task: NotificationTask) {
        let label = task.label();
        match self.service.process(task).await {
            Ok(summary) => tracing::info!(
                task = label,
                created = summary.created,
                sent = summary.sent,
                failed = summary.failed,
                skipped = summary.skipped,
                "Notification task done"
            ),
            Err(e) => tracing::error!(task = label, error = %e, "Notification task failed"),
        }
    }
}
