//! Provider configuration block
//!
//! `host` and `refresh_token` come from the provider block first and fall
//! back to `BANYAN_HOST` / `BANYAN_REFRESH_TOKEN`.

use std::collections::HashMap;

use banyan_client::DEFAULT_HOST;
use banyan_core::resource::Value;
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use thiserror::Error;

pub const HOST_ENV: &str = "BANYAN_HOST";
pub const REFRESH_TOKEN_ENV: &str = "BANYAN_REFRESH_TOKEN";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("refresh_token is required (set it in the provider block or BANYAN_REFRESH_TOKEN)")]
    MissingRefreshToken,

    #[error("invalid host '{0}': expected an http(s) URL")]
    InvalidHost(String),
}

/// Validated provider settings
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub host: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("host", &self.host)
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve settings from the provider block, then the process environment
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        Self::resolve(attributes, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve(
        attributes: &HashMap<String, Value>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let setting = |name: &str, env_key: &str| {
            attributes
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .filter(|s| !s.is_empty())
                .or_else(|| env(env_key).filter(|s| !s.is_empty()))
        };

        let host = setting("host", HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        if !(host.starts_with("https://") || host.starts_with("http://")) {
            return Err(ConfigError::InvalidHost(host));
        }

        let refresh_token =
            setting("refresh_token", REFRESH_TOKEN_ENV).ok_or(ConfigError::MissingRefreshToken)?;

        Ok(Self {
            host,
            refresh_token,
        })
    }
}

pub fn config_schema() -> ResourceSchema {
    ResourceSchema::new("banyan")
        .with_description("Banyan control-plane connection")
        .attribute(
            AttributeSchema::new("host", AttributeType::String)
                .with_description(format!(
                    "Control-plane URL. Defaults to {} or ${}",
                    DEFAULT_HOST, HOST_ENV
                )),
        )
        .attribute(
            AttributeSchema::new("refresh_token", AttributeType::String)
                .sensitive()
                .with_description(format!("API refresh token. Defaults to ${}", REFRESH_TOKEN_ENV)),
        )
}
