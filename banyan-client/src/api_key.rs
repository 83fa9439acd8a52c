//! API keys

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::rest::RestClient;

/// Scopes an API key can be minted for
pub const SCOPES: &[&str] = &["satellite", "access_tier", "admin", "serviceaccount", "scim"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyPost {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub scope: String,
    /// Only present in the create response
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub created_at: i64,
}

#[async_trait]
pub trait ApiKeyApi: Send + Sync {
    async fn get(&self, id: &str) -> ClientResult<ApiKeyInfo>;
    async fn create(&self, key: &ApiKeyPost) -> ClientResult<ApiKeyInfo>;
    async fn update(&self, id: &str, key: &ApiKeyPost) -> ClientResult<ApiKeyInfo>;
    async fn delete(&self, id: &str) -> ClientResult<()>;
}

fn key_path(id: &str) -> String {
    format!("api/v2/api_key/{}", id)
}

#[async_trait]
impl ApiKeyApi for RestClient {
    async fn get(&self, id: &str) -> ClientResult<ApiKeyInfo> {
        self.get_v2(&key_path(id), &[]).await
    }

    async fn create(&self, key: &ApiKeyPost) -> ClientResult<ApiKeyInfo> {
        self.post_v2("api/v2/api_key", key).await
    }

    async fn update(&self, id: &str, key: &ApiKeyPost) -> ClientResult<ApiKeyInfo> {
        self.put_v2(&key_path(id), key).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        RestClient::delete(self, &key_path(id), &[]).await
    }
}
