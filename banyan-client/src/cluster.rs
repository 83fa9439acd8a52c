//! Shield clusters available to the tenant

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ClientResult;
use crate::rest::RestClient;

#[derive(Debug, Deserialize)]
struct ShieldConfig {
    #[serde(rename = "Configs", default)]
    configs: BTreeMap<String, serde_json::Value>,
}

#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Cluster names in sorted order
    async fn list(&self) -> ClientResult<Vec<String>>;
}

#[async_trait]
impl ClusterApi for RestClient {
    async fn list(&self) -> ClientResult<Vec<String>> {
        let config: ShieldConfig = self.get("api/v1/shield_config", &[]).await?;
        Ok(config.configs.into_keys().collect())
    }
}
