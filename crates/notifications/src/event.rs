//! The event envelope handed to the notification pipeline.
//!
//! A [`NotificationEvent`] names a runtime tag, carries the object that
//! triggered it as a [`TriggerInstance`] (kind, id and a JSON snapshot),
//! and holds event-specific context values such as the acting user or a
//! new matter status.

use chrono::{DateTime, Utc};
use docket_core::types::DbId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::NotificationError;

// ---------------------------------------------------------------------------
// TriggerInstance
// ---------------------------------------------------------------------------

/// The domain object that triggered a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerInstance {
    /// Object kind, e.g. `"matter"` or `"forum_post"`.
    pub kind: String,
    /// Object id as text, matching `notifications.target_id`.
    pub id: String,
    /// Snapshot of the object at event time.
    pub data: Value,
}

impl TriggerInstance {
    pub fn new(kind: impl Into<String>, id: impl ToString, data: Value) -> Self {
        Self {
            kind: kind.into(),
            id: id.to_string(),
            data,
        }
    }

    /// Look up a dotted path inside the snapshot.
    pub fn field(&self, path: &str) -> Option<&Value> {
        docket_core::template::lookup(&self.data, path)
    }

    /// Read a required id at `path`.
    pub fn id_at(&self, path: &str) -> Result<DbId, NotificationError> {
        self.field(path)
            .and_then(as_id)
            .ok_or_else(|| NotificationError::MissingField(format!("{}.{path}", self.kind)))
    }

    /// Read an id list at `path`. A missing path is an empty list.
    pub fn ids_at(&self, path: &str) -> Vec<DbId> {
        self.field(path)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(as_id).collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// NotificationEvent
// ---------------------------------------------------------------------------

/// A domain event that should produce a notification.
///
/// Constructed via [`NotificationEvent::new`] and enriched with
/// [`with_context`](NotificationEvent::with_context).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Runtime tag of the notification type, e.g. `"matter_status_update"`.
    pub runtime_tag: String,

    /// The object the notification links to.
    pub instance: TriggerInstance,

    /// Event-specific values (`user_id`, `new_status`, `receiver_ids`, ...).
    pub context: Map<String, Value>,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(runtime_tag: impl Into<String>, instance: TriggerInstance) -> Self {
        Self {
            runtime_tag: runtime_tag.into(),
            instance,
            context: Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a context value.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    pub fn context_id(&self, key: &str) -> Option<DbId> {
        self.context.get(key).and_then(as_id)
    }

    /// Read a required id from the context.
    pub fn require_context_id(&self, key: &str) -> Result<DbId, NotificationError> {
        self.context_id(key)
            .ok_or_else(|| NotificationError::MissingField(format!("context.{key}")))
    }

    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(Value::as_str)
    }

    /// Read an id list from the context. A missing key is an empty list.
    pub fn context_ids(&self, key: &str) -> Vec<DbId> {
        self.context
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(as_id).collect())
            .unwrap_or_default()
    }
}

/// Accept ids stored either as JSON numbers or numeric strings.
fn as_id(value: &Value) -> Option<DbId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
