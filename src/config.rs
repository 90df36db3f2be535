use std::fmt;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Shared secret used to sign helpdesk webhooks. Never printed.
#[derive(Clone)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Shop admin base URL, always ending with `/`.
    pub admin_url: String,
    /// chrono strftime pattern for order dates.
    pub date_format: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            admin_url: "http://localhost/wp-admin/".to_string(),
            date_format: "%B %-d, %Y, %-I:%M %p".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub secret_key: SecretKey,
    /// The support mailbox; never looked up as a customer.
    pub own_email: Option<String>,
    pub query_timeout: Duration,
    pub render: RenderSettings,
}

impl LookupConfig {
    pub fn new(secret_key: SecretKey) -> Self {
        Self {
            secret_key,
            own_email: None,
            query_timeout: Duration::from_millis(5_000),
            render: RenderSettings::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = std::env::var("HELPSCOUT_SECRET_KEY")
            .ok()
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing("HELPSCOUT_SECRET_KEY"))?;
        let mut config = Self::new(SecretKey::new(secret));

        if let Ok(value) = std::env::var("HELPSCOUT_EMAIL")
            && !value.trim().is_empty()
        {
            config.own_email = Some(value.trim().to_string());
        }
        if let Ok(value) = std::env::var("SHOP_ADMIN_URL")
            && !value.trim().is_empty()
        {
            config.render.admin_url = normalize_admin_url(&value);
        }
        if let Ok(value) = std::env::var("LOOKUP_QUERY_TIMEOUT_MS")
            && let Ok(parsed) = value.parse::<u64>()
        {
            config.query_timeout = Duration::from_millis(parsed.max(1));
        }
        if let Ok(value) = std::env::var("LOOKUP_DATE_FORMAT") {
            validate_date_format(&value)?;
            config.render.date_format = value;
        }

        Ok(config)
    }
}

pub fn normalize_admin_url(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    format!("{trimmed}/")
}

/// Rejects patterns chrono cannot render, so formatting never fails later.
pub fn validate_date_format(pattern: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::Invalid {
            field: "LOOKUP_DATE_FORMAT",
            message: format!("unsupported strftime pattern {pattern:?}"),
        });
    }
    Ok(())
}
