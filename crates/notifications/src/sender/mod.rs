//! Delivery channels for dispatches.
//!
//! Senders report success as a plain `bool`: transport errors are logged
//! where they happen and never abort the dispatch loop. A dispatch is only
//! marked `sent` when every channel it was attempted on returned `true`.

use async_trait::async_trait;
use docket_db::models::notification::DispatchDelivery;

pub mod email;
pub mod push;

/// Sends rendered notifications by email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send an HTML email with `title` as the subject.
    async fn send_by_email(&self, delivery: &DispatchDelivery, title: &str, content: &str) -> bool;
}

/// Sends rendered notifications to the recipient's push devices.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send_by_push(&self, delivery: &DispatchDelivery, title: &str, content: &str) -> bool;
}
