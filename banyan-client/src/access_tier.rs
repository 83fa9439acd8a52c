//! Access tiers and their local config sub-resource

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::rest::RestClient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessTierPost {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub tunnel_enduser: Option<TunnelInfo>,
    #[serde(default)]
    pub tunnel_satellite: Option<TunnelInfo>,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub disable_snat: bool,
    #[serde(default)]
    pub src_nat_cidr_range: String,
    #[serde(default)]
    pub api_key_id: String,
    #[serde(default)]
    pub description: String,
}

/// Tunnel settings for one side of the tier (end users or connectors)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelInfo {
    #[serde(default)]
    pub udp_port_number: i64,
    #[serde(default)]
    pub dns_enabled: bool,
    #[serde(default)]
    pub cidrs: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub dns_search_domains: String,
    #[serde(default)]
    pub keepalive: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shared_fqdn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTierInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub tunnel_enduser: Option<TunnelInfo>,
    #[serde(default)]
    pub tunnel_satellite: Option<TunnelInfo>,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub disable_snat: bool,
    #[serde(default)]
    pub src_nat_cidr_range: String,
    #[serde(default)]
    pub api_key_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub access_tier_group_id: String,
    #[serde(default)]
    pub created_at: i64,
}

/// Settings the tier's netagent pulls at runtime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub events: Events,
    #[serde(default)]
    pub hosted_web_services: HostedWebServices,
    #[serde(default)]
    pub debugging: Debugging,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Logging {
    #[serde(default)]
    pub console_log_level: String,
    #[serde(default)]
    pub file_log_level: String,
    #[serde(default)]
    pub file_log: bool,
    #[serde(default)]
    pub log_num: i64,
    #[serde(default)]
    pub log_size: i64,
    #[serde(default)]
    pub statsd: bool,
    #[serde(default)]
    pub statsd_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Events {
    #[serde(default)]
    pub access_event_credits_limiting: bool,
    #[serde(default)]
    pub access_event_credits_max: i64,
    #[serde(default)]
    pub access_event_credits_interval: i64,
    #[serde(default)]
    pub access_event_credits_per_interval: i64,
    #[serde(default)]
    pub access_event_key_limiting: bool,
    #[serde(default)]
    pub access_event_key_expiration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostedWebServices {
    #[serde(default)]
    pub forward_trust_cookie: bool,
    #[serde(default)]
    pub enable_hsts: bool,
    #[serde(default)]
    pub enable_http_backend_log: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Debugging {
    #[serde(default)]
    pub enable_dev_mode: bool,
    #[serde(default)]
    pub enable_debug_logging: bool,
}

#[async_trait]
pub trait AccessTierApi: Send + Sync {
    async fn get(&self, id: &str) -> ClientResult<AccessTierInfo>;
    async fn create(&self, tier: &AccessTierPost) -> ClientResult<AccessTierInfo>;
    async fn update(&self, id: &str, tier: &AccessTierPost) -> ClientResult<AccessTierInfo>;
    async fn delete(&self, id: &str) -> ClientResult<()>;

    async fn get_local_config(&self, id: &str) -> ClientResult<LocalConfig>;
    async fn update_local_config(&self, id: &str, config: &LocalConfig) -> ClientResult<LocalConfig>;
}

#[derive(Debug, Deserialize)]
struct AccessTierList {
    #[serde(default)]
    access_tiers: Vec<AccessTierInfo>,
}

fn tier_path(id: &str) -> String {
    format!("api/v2/access_tier/{}", id)
}

#[async_trait]
impl AccessTierApi for RestClient {
    async fn get(&self, id: &str) -> ClientResult<AccessTierInfo> {
        let list: AccessTierList = self.get_v2("api/v2/access_tiers", &[("id", id)]).await?;
        list.access_tiers
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::not_found(format!("access tier {}", id)))
    }

    async fn create(&self, tier: &AccessTierPost) -> ClientResult<AccessTierInfo> {
        self.post_v2("api/v2/access_tier", tier).await
    }

    async fn update(&self, id: &str, tier: &AccessTierPost) -> ClientResult<AccessTierInfo> {
        self.put_v2(&tier_path(id), tier).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        RestClient::delete(self, &tier_path(id), &[]).await
    }

    async fn get_local_config(&self, id: &str) -> ClientResult<LocalConfig> {
        self.get_v2(&format!("{}/config", tier_path(id)), &[]).await
    }

    async fn update_local_config(&self, id: &str, config: &LocalConfig) -> ClientResult<LocalConfig> {
        self.put_v2(&format!("{}/config", tier_path(id)), config).await
    }
}
