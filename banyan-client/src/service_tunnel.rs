//! Service tunnels (v2 API)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::rest::RestClient;

pub const TUNNEL_KIND: &str = "BanyanServiceTunnel";
pub const API_VERSION: &str = "rbac.banyanops.com/v1";
pub const TUNNEL_TYPE: &str = "origin";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelRequest {
    pub kind: String,
    pub api_version: String,
    #[serde(rename = "type")]
    pub tunnel_type: String,
    pub metadata: TunnelMetadata,
    pub spec: TunnelSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelMetadata {
    pub name: String,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: TunnelTags,
    #[serde(default)]
    pub autorun: bool,
    #[serde(default)]
    pub lock_autorun: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelTags {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelSpec {
    #[serde(default)]
    pub peer_access_tiers: Vec<PeerAccessTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_resolution: Option<NameResolution>,
}

/// One path into the private network: a set of tiers, or a group, or
/// connectors behind the wildcard tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerAccessTier {
    #[serde(default)]
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_tiers: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_tier_group: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_cidrs: Option<IncludeExclude>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_domains: Option<IncludeExclude>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applications: Option<IncludeExclude>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncludeExclude {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl IncludeExclude {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameResolution {
    #[serde(default)]
    pub name_servers: Vec<String>,
    #[serde(default)]
    pub dns_search_domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunnelInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    pub spec: TunnelRequest,
}

/// Policy bound to a tunnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunnelPolicy {
    pub policy_id: String,
    #[serde(default)]
    pub policy_enforcing: bool,
}

#[async_trait]
pub trait ServiceTunnelApi: Send + Sync {
    async fn get(&self, id: &str) -> ClientResult<TunnelInfo>;
    async fn create(&self, request: &TunnelRequest) -> ClientResult<TunnelInfo>;
    async fn update(&self, id: &str, request: &TunnelRequest) -> ClientResult<TunnelInfo>;
    async fn delete(&self, id: &str) -> ClientResult<()>;

    async fn attach_policy(&self, id: &str, policy: &TunnelPolicy) -> ClientResult<TunnelPolicy>;
    async fn get_policy(&self, id: &str) -> ClientResult<TunnelPolicy>;
    async fn detach_policy(&self, id: &str, policy_id: &str) -> ClientResult<()>;
}

fn tunnel_path(id: &str) -> String {
    format!("api/v2/service_tunnel/{}", id)
}

#[async_trait]
impl ServiceTunnelApi for RestClient {
    async fn get(&self, id: &str) -> ClientResult<TunnelInfo> {
        self.get_v2(&tunnel_path(id), &[]).await
    }

    async fn create(&self, request: &TunnelRequest) -> ClientResult<TunnelInfo> {
        self.post_v2("api/v2/service_tunnel", request).await
    }

    async fn update(&self, id: &str, request: &TunnelRequest) -> ClientResult<TunnelInfo> {
        self.put_v2(&tunnel_path(id), request).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        RestClient::delete(self, &tunnel_path(id), &[]).await
    }

    async fn attach_policy(&self, id: &str, policy: &TunnelPolicy) -> ClientResult<TunnelPolicy> {
        self.post_v2(&format!("{}/security_policy", tunnel_path(id)), policy)
            .await
    }

    async fn get_policy(&self, id: &str) -> ClientResult<TunnelPolicy> {
        self.get_v2(&format!("{}/security_policy", tunnel_path(id)), &[])
            .await
    }

    async fn detach_policy(&self, id: &str, policy_id: &str) -> ClientResult<()> {
        RestClient::delete(
            self,
            &format!("{}/security_policy/{}", tunnel_path(id), policy_id),
            &[],
        )
        .await
    }
}
