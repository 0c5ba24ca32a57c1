//! Environment configuration for the notification pipeline.

use docket_core::preferences::MissingSettingsPolicy;

use crate::error::NotificationError;
use crate::sender::email::EmailConfig;
use crate::sender::push::PushConfig;

/// Default base URL used in deep links and the `current_site` payload key.
const DEFAULT_SITE_BASE_URL: &str = "http://localhost:3000";

/// Settings shared by the dispatcher and the senders.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Public site URL, without a trailing slash.
    pub site_base_url: String,
    /// Treatment of recipients without a `notification_settings` row.
    pub missing_settings: MissingSettingsPolicy,
    pub push: PushConfig,
    /// `None` disables email delivery.
    pub email: Option<EmailConfig>,
}

impl NotificationConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                  | Required | Default                 |
    /// |---------------------------|----------|-------------------------|
    /// | `SITE_BASE_URL`           | no       | `http://localhost:3000` |
    /// | `NOTIFY_MISSING_SETTINGS` | no       | `exclude`               |
    ///
    /// Push settings are read by [`PushConfig::from_env`] and SMTP settings
    /// by [`EmailConfig::from_env`].
    pub fn from_env() -> Result<Self, NotificationError> {
        let site_base_url = std::env::var("SITE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SITE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let missing_settings = match std::env::var("NOTIFY_MISSING_SETTINGS") {
            Ok(raw) => MissingSettingsPolicy::parse(&raw).ok_or_else(|| {
                NotificationError::Config(format!(
                    "NOTIFY_MISSING_SETTINGS must be 'exclude' or 'defaults', got '{raw}'"
                ))
            })?,
            Err(_) => MissingSettingsPolicy::default(),
        };

        Ok(Self {
            site_base_url,
            missing_settings,
            push: PushConfig::from_env()?,
            email: EmailConfig::from_env(),
        })
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            site_base_url: DEFAULT_SITE_BASE_URL.to_string(),
            missing_settings: MissingSettingsPolicy::default(),
            push: PushConfig::default(),
            email: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_excludes_users_without_settings() {
        let config = NotificationConfig::default();
        assert_eq!(config.missing_settings, MissingSettingsPolicy::Exclude);
        assert_eq!(config.site_base_url, "http://localhost:3000");
        assert!(!config.push.enabled);
        assert!(config.email.is_none());
    }
}
