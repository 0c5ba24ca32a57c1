//! Payload preparation and per-channel rendering.
//!
//! Every dispatch gets its own payload. The notification's stored extra
//! payload is cloned, recipient-specific keys are added to the clone, and
//! the templates of the resource are rendered against it. Nothing written
//! for one recipient is visible when rendering for the next.

use docket_core::roles::UserRole;
use docket_core::template;
use docket_db::models::notification::DispatchDelivery;
use docket_db::models::user::User;
use serde_json::{json, Map, Value};

use crate::resource::NotificationResource;

/// JSON view of a user as templates see it.
pub fn user_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "uuid": user.uuid,
        "email": user.email,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "full_name": user.full_name(),
        "role": user.role,
        "is_attorney": user.is_attorney(),
        "is_client": user.is_client(),
    })
}

/// JSON view of a dispatch's recipient.
pub fn recipient_json(delivery: &DispatchDelivery) -> Value {
    let role = UserRole::parse(&delivery.recipient_role);
    json!({
        "id": delivery.recipient_id,
        "uuid": delivery.recipient_uuid,
        "email": delivery.recipient_email,
        "first_name": delivery.recipient_first_name,
        "last_name": delivery.recipient_last_name,
        "full_name": recipient_name(delivery),
        "role": delivery.recipient_role,
        "is_attorney": role == Some(UserRole::Attorney),
        "is_client": role == Some(UserRole::Client),
    })
}

/// `first_name last_name`, as used for the `user_name` payload key.
pub fn recipient_name(delivery: &DispatchDelivery) -> String {
    format!(
        "{} {}",
        delivery.recipient_first_name, delivery.recipient_last_name
    )
    .trim()
    .to_string()
}

/// Builds payloads and renders resource templates.
#[derive(Debug, Clone)]
pub struct ContentRenderer {
    base_url: String,
}

impl ContentRenderer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the template payload for one dispatch.
    ///
    /// Keys are written in this order, later ones winning on collision:
    /// `notification_type`, `notification`, the stored extra payload, the
    /// per-recipient keys (`user_name`, `user_key`, `current_site`),
    /// `instance` (`null` when the target is gone), `recipient` and
    /// finally `deep_link`, computed from everything before it.
    pub fn prepare_payload(
        &self,
        delivery: &DispatchDelivery,
        instance: Option<Value>,
        resource: &dyn NotificationResource,
    ) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert(
            "notification_type".into(),
            json!({ "runtime_tag": delivery.runtime_tag }),
        );
        payload.insert(
            "notification".into(),
            json!({ "id": delivery.notification_id, "title": delivery.notification_title }),
        );

        if let Value::Object(extra) = delivery.extra_payload.clone() {
            payload.extend(extra);
        }
        payload.insert("user_name".into(), json!(recipient_name(delivery)));
        payload.insert("user_key".into(), json!(delivery.recipient_uuid));
        payload.insert("current_site".into(), json!(self.base_url));

        payload.insert("instance".into(), instance.unwrap_or(Value::Null));
        payload.insert("recipient".into(), recipient_json(delivery));

        let deep_link = resource.deep_link(&Value::Object(payload.clone()), &self.base_url);
        payload.insert("deep_link".into(), json!(deep_link));
        payload
    }

    pub fn render_web(&self, resource: &dyn NotificationResource, payload: &Value) -> String {
        template::render(resource.templates().web, payload)
    }

    pub fn render_push(&self, resource: &dyn NotificationResource, payload: &Value) -> String {
        template::render(resource.templates().push, payload)
    }

    pub fn render_email_subject(&self, resource: &dyn NotificationResource, payload: &Value) -> String {
        template::render(resource.templates().email_subject, payload)
    }

    /// HTML body of the email. Payload values are escaped.
    pub fn render_email_body(&self, resource: &dyn NotificationResource, payload: &Value) -> String {
        template::render_html(resource.templates().email_body, payload)
    }
}
