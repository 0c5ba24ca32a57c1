//! Well-known delivery channel name constants.
//!
//! These are the values used in log fields and delivery summaries. A
//! dispatch is eligible for a channel when the recipient's
//! [`DeliveryPreferences`](crate::preferences::DeliveryPreferences) allow it.

/// Email notification delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";

/// Push notification delivered to the recipient's registered devices.
pub const CHANNEL_PUSH: &str = "push";
