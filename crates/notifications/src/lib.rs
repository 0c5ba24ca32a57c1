//! Notification fan-out and dispatch.
//!
//! This crate turns domain events into per-recipient deliveries:
//!
//! - [`NotificationEvent`] is the event envelope handed in by the domain.
//! - [`resource`] maps each runtime tag to a [`NotificationResource`] that
//!   knows the recipients, title and content templates of the event.
//! - [`PreferenceGate`] filters recipients by their delivery settings.
//! - [`Dispatcher`] creates the dispatch rows, renders content per channel
//!   and sends it through the [`sender`] adapters (SMTP email, FCM push).
//! - [`NotificationQueue`] / [`NotificationWorker`] run the work off the
//!   request path; [`PendingNotifications`] enqueues only after commit.
//! - [`outbox::stage`] and [`OutboxRelay`] carry tasks between processes
//!   through the `notification_outbox` table.
//! - [`Inbox`], [`ResendService`] and [`TargetCleanup`] cover read state,
//!   operator re-sends and notifications whose target was deleted.

pub mod cleanup;
pub mod commit;
pub mod config;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod gate;
pub mod inbox;
pub mod outbox;
pub mod queue;
pub mod render;
pub mod resend;
pub mod resource;
pub mod sender;
pub mod service;
pub mod store;
pub mod targets;

#[cfg(test)]
pub(crate) mod testing;

pub use cleanup::TargetCleanup;
pub use commit::PendingNotifications;
pub use config::NotificationConfig;
pub use directory::{PgRecipientDirectory, RecipientDirectory};
pub use dispatcher::{DispatchSummary, Dispatcher};
pub use error::NotificationError;
pub use event::{NotificationEvent, TriggerInstance};
pub use gate::{GatedRecipient, PreferenceGate};
pub use inbox::{Inbox, InboxEntry};
pub use outbox::OutboxRelay;
pub use queue::{NotificationQueue, NotificationTask, NotificationWorker};
pub use render::ContentRenderer;
pub use resend::ResendService;
pub use resource::{NotificationResource, ResourceRegistry};
pub use sender::email::{EmailConfig, SmtpEmailSender};
pub use sender::push::{FcmPushSender, PushConfig};
pub use sender::{EmailSender, PushSender};
pub use service::NotificationService;
pub use store::{DispatchStore, PgDispatchStore};
pub use targets::{PgTargetStore, TargetStore};
