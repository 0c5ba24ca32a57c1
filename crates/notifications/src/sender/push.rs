//! Push delivery through the FCM HTTP API.
//!
//! [`FcmPushSender`] posts one message per active device of the recipient.
//! The send counts as successful when at least one device accepted it.
//! With push disabled, or for recipients without devices, there is nothing
//! to deliver and the send reports success.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docket_db::models::notification::DispatchDelivery;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::PushSender;
use crate::directory::RecipientDirectory;
use crate::error::NotificationError;

/// Legacy FCM send endpoint used when `FCM_ENDPOINT` is not set.
const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

/// HTTP request timeout for a single device send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a single device send.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("Push gateway returned HTTP {0}")]
    HttpStatus(u16),

    /// The gateway answered but rejected the message.
    #[error("Push gateway rejected the message: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// PushConfig
// ---------------------------------------------------------------------------

/// Configuration for push delivery.
#[derive(Debug, Clone, Default)]
pub struct PushConfig {
    /// Master switch. Disabled push reports every send as successful.
    pub enabled: bool,
    /// FCM send endpoint.
    pub endpoint: String,
    /// Server key sent as `Authorization: key=...`.
    pub server_key: Option<String>,
    /// Extra data merged into the push payload, keyed by runtime tag.
    pub extra_params: Map<String, Value>,
}

impl PushConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable            | Required | Default                               |
    /// |---------------------|----------|---------------------------------------|
    /// | `FCM_ENABLED`       | no       | `false`                               |
    /// | `FCM_ENDPOINT`      | no       | `https://fcm.googleapis.com/fcm/send` |
    /// | `FCM_SERVER_KEY`    | no       | -                                     |
    /// | `PUSH_EXTRA_PARAMS` | no       | `{}` (JSON object, tag -> object)     |
    pub fn from_env() -> Result<Self, NotificationError> {
        let enabled = std::env::var("FCM_ENABLED")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let extra_params = match std::env::var("PUSH_EXTRA_PARAMS") {
            Ok(raw) => parse_extra_params(&raw)?,
            Err(_) => Map::new(),
        };

        Ok(Self {
            enabled,
            endpoint: std::env::var("FCM_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_FCM_ENDPOINT.to_string()),
            server_key: std::env::var("FCM_SERVER_KEY").ok(),
            extra_params,
        })
    }
}

fn parse_extra_params(raw: &str) -> Result<Map<String, Value>, NotificationError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(NotificationError::Config(
            "PUSH_EXTRA_PARAMS must be a JSON object".to_string(),
        )),
        Err(e) => Err(NotificationError::Config(format!(
            "PUSH_EXTRA_PARAMS is not valid JSON: {e}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// FcmPushSender
// ---------------------------------------------------------------------------

/// Subset of the FCM send response we care about.
#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    success: i64,
    #[serde(default)]
    results: Vec<Value>,
}

/// Sends push notifications to every active device of a recipient.
pub struct FcmPushSender {
    config: PushConfig,
    client: reqwest::Client,
    directory: Arc<dyn RecipientDirectory>,
}

impl FcmPushSender {
    pub fn new(config: PushConfig, directory: Arc<dyn RecipientDirectory>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            config,
            client,
            directory,
        }
    }

    /// Data block attached to every push: the dispatch identifiers plus the
    /// configured extra params for the runtime tag.
    pub fn message_data(&self, delivery: &DispatchDelivery) -> Value {
        let mut data = Map::new();
        data.insert("runtime_tag".into(), json!(delivery.runtime_tag));
        data.insert("object_id".into(), json!(delivery.target_id));
        data.insert("dispatch_id".into(), json!(delivery.dispatch_id));
        data.insert("notification_foreground".into(), json!(true));
        if let Some(Value::Object(extra)) = self.config.extra_params.get(&delivery.runtime_tag) {
            for (key, value) in extra {
                data.insert(key.clone(), value.clone());
            }
        }
        Value::Object(data)
    }

    /// Send one message to one device.
    async fn send_to_device(
        &self,
        registration_id: &str,
        title: &str,
        content: &str,
        data: &Value,
    ) -> Result<Value, PushError> {
        let body = json!({
            "to": registration_id,
            "notification": { "title": title, "body": content },
            "data": data,
        });

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.server_key {
            request = request.header(reqwest::header::AUTHORIZATION, format!("key={key}"));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(PushError::HttpStatus(response.status().as_u16()));
        }

        let parsed: FcmResponse = response.json().await?;
        let result = parsed.results.into_iter().next().unwrap_or(Value::Null);
        if parsed.success == 0 {
            return Err(PushError::Rejected(result.to_string()));
        }
        Ok(result)
    }
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send_by_push(&self, delivery: &DispatchDelivery, title: &str, content: &str) -> bool {
        tracing::info!(
            dispatch_id = delivery.dispatch_id,
            recipient_id = delivery.recipient_id,
            title,
            "Sending push notification"
        );

        if !self.config.enabled {
            return true;
        }

        let devices = match self.directory.push_devices(delivery.recipient_id).await {
            Ok(devices) => devices,
            Err(e) => {
                tracing::error!(
                    recipient_id = delivery.recipient_id,
                    error = %e,
                    "Failed to load push devices"
                );
                return false;
            }
        };

        if devices.is_empty() {
            tracing::info!(
                recipient_id = delivery.recipient_id,
                "Recipient has no devices to push to"
            );
            return true;
        }

        let data = self.message_data(delivery);
        let mut success = 0usize;
        let mut failure = 0usize;
        for device in &devices {
            match self
                .send_to_device(&device.registration_id, title, content, &data)
                .await
            {
                Ok(result) => {
                    success += 1;
                    tracing::debug!(device_id = device.id, result = %result, "Push accepted");
                }
                Err(e) => {
                    failure += 1;
                    tracing::warn!(device_id = device.id, error = %e, "Push rejected");
                }
            }
        }

        tracing::info!(
            dispatch_id = delivery.dispatch_id,
            recipient_id = delivery.recipient_id,
            success,
            failure,
            "Push notification results"
        );

        if success == 0 {
            tracing::warn!(
                dispatch_id = delivery.dispatch_id,
                recipient_id = delivery.recipient_id,
                "Push notification failed on every device"
            );
        }
        success > 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
