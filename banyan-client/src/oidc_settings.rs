//! Tenant OIDC provider endpoints

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::rest::RestClient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OidcSettings {
    #[serde(default)]
    pub issuer_url: String,
    #[serde(default)]
    pub authorization_endpoint: String,
    #[serde(default)]
    pub token_endpoint: String,
    #[serde(default)]
    pub jwks_endpoint: String,
    #[serde(default)]
    pub redirect_url: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub userinfo_endpoint: String,
    #[serde(default)]
    pub openid_configuration_endpoint: String,
}

#[async_trait]
pub trait OidcSettingsApi: Send + Sync {
    async fn get(&self) -> ClientResult<OidcSettings>;
}

#[async_trait]
impl OidcSettingsApi for RestClient {
    async fn get(&self) -> ClientResult<OidcSettings> {
        self.get("api/v1/oidc_settings", &[]).await
    }
}
