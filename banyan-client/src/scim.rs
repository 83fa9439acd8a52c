//! SCIM provisioning
//!
//! SCIM is a tenant singleton: it can be switched on or off and, while on,
//! hands out bearer tokens for the identity provider to push users with.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::rest::RestClient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScimInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub token_infos: Vec<TokenInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub uuid: String,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScimToken {
    pub uuid: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
struct ScimEnable {
    is_enabled: bool,
}

#[async_trait]
pub trait ScimApi: Send + Sync {
    async fn get(&self) -> ClientResult<ScimInfo>;
    async fn set_enabled(&self, enabled: bool) -> ClientResult<ScimInfo>;
    async fn create_token(&self) -> ClientResult<ScimToken>;
    async fn delete_token(&self, uuid: &str) -> ClientResult<()>;
}

#[async_trait]
impl ScimApi for RestClient {
    async fn get(&self) -> ClientResult<ScimInfo> {
        self.get_v2("api/v2/scim", &[]).await
    }

    async fn set_enabled(&self, enabled: bool) -> ClientResult<ScimInfo> {
        self.put_v2("api/v2/scim", &ScimEnable { is_enabled: enabled })
            .await
    }

    async fn create_token(&self) -> ClientResult<ScimToken> {
        self.post_v2("api/v2/scim/token", &serde_json::json!({})).await
    }

    async fn delete_token(&self, uuid: &str) -> ClientResult<()> {
        RestClient::delete(self, &format!("api/v2/scim/token/{}", uuid), &[]).await
    }
}
