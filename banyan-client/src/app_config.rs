//! Tenant-wide desktop app configuration

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::rest::RestClient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub id: String,
    /// Push Name Resolution Policy Table entries to Windows clients
    #[serde(default)]
    pub nrpt_config: bool,
}

#[derive(Debug, Serialize)]
struct AppConfigPut {
    nrpt_config: bool,
}

#[async_trait]
pub trait AppConfigApi: Send + Sync {
    async fn get(&self) -> ClientResult<AppConfig>;
    async fn update(&self, nrpt_config: bool) -> ClientResult<AppConfig>;
}

#[async_trait]
impl AppConfigApi for RestClient {
    async fn get(&self) -> ClientResult<AppConfig> {
        self.get_v2("api/v2/app_config", &[]).await
    }

    async fn update(&self, nrpt_config: bool) -> ClientResult<AppConfig> {
        self.put_v2("api/v2/app_config", &AppConfigPut { nrpt_config })
            .await
    }
}
