//! Access tier groups

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::access_tier::TunnelInfo;
use crate::error::ClientResult;
use crate::rest::RestClient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessTierGroupPost {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cluster_name: String,
    /// Tunnel settings shared by every member tier
    #[serde(default)]
    pub tunnel_enduser: Option<TunnelInfo>,
    #[serde(default)]
    pub advanced_settings: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTierGroupInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub tunnel_enduser: Option<TunnelInfo>,
    #[serde(default)]
    pub access_tier_ids: Vec<String>,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessTierList {
    pub access_tier_ids: Vec<String>,
}

#[async_trait]
pub trait AccessTierGroupApi: Send + Sync {
    async fn get(&self, id: &str) -> ClientResult<AccessTierGroupInfo>;
    async fn create(&self, group: &AccessTierGroupPost) -> ClientResult<AccessTierGroupInfo>;
    async fn update(&self, id: &str, group: &AccessTierGroupPost) -> ClientResult<AccessTierGroupInfo>;
    async fn delete(&self, id: &str) -> ClientResult<()>;

    async fn attach_access_tiers(&self, id: &str, tiers: &AccessTierList) -> ClientResult<()>;
    async fn detach_access_tiers(&self, id: &str, tiers: &AccessTierList) -> ClientResult<()>;
}

fn group_path(id: &str) -> String {
    format!("api/v2/access_tier_group/{}", id)
}

#[async_trait]
impl AccessTierGroupApi for RestClient {
    async fn get(&self, id: &str) -> ClientResult<AccessTierGroupInfo> {
        self.get_v2(&group_path(id), &[]).await
    }

    async fn create(&self, group: &AccessTierGroupPost) -> ClientResult<AccessTierGroupInfo> {
        self.post_v2("api/v2/access_tier_group", group).await
    }

    async fn update(&self, id: &str, group: &AccessTierGroupPost) -> ClientResult<AccessTierGroupInfo> {
        self.put_v2(&group_path(id), group).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        RestClient::delete(self, &group_path(id), &[]).await
    }

    async fn attach_access_tiers(&self, id: &str, tiers: &AccessTierList) -> ClientResult<()> {
        let _: serde_json::Value = self
            .post_v2(&format!("{}/attach", group_path(id)), tiers)
            .await?;
        Ok(())
    }

    async fn detach_access_tiers(&self, id: &str, tiers: &AccessTierList) -> ClientResult<()> {
        let _: serde_json::Value = self
            .post_v2(&format!("{}/detach", group_path(id)), tiers)
            .await?;
        Ok(())
    }
}
