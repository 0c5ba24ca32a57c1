use docket_core::error::CoreError;

/// Errors raised while creating, dispatching or managing notifications.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// No resource is registered for the runtime tag.
    #[error("Unknown notification resource: {0}")]
    UnknownResource(String),

    /// An event was bound to a resource built for another kind of object.
    #[error("Resource '{runtime_tag}' works with '{expected}' instances, got '{actual}'")]
    InstanceKindMismatch {
        runtime_tag: &'static str,
        expected: &'static str,
        actual: String,
    },

    /// The runtime tag has no row in `notification_types`.
    #[error("Notification type not found for runtime tag '{0}'")]
    UnknownType(String),

    /// The event lacks a value a resource needs to resolve recipients.
    #[error("Event field missing or invalid: {0}")]
    MissingField(String),

    /// Invalid environment configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The worker side of the queue is gone.
    #[error("Notification queue is closed")]
    QueueClosed,

    /// An outbox row does not decode into a task.
    #[error("Invalid outbox task: {0}")]
    InvalidTask(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
