//! Registered domains
//!
//! Domains on the global-edge cluster prove ownership through a TXT-record
//! challenge created ahead of the domain itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::rest::RestClient;

pub const GLOBAL_EDGE_CLUSTER: &str = "global-edge";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisteredDomainPost {
    pub name: String,
    pub cluster_name: String,
    #[serde(default)]
    pub cname: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub registered_domain_challenge_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredDomainInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub cname: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub acme_cname: String,
    #[serde(default)]
    pub domain_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengePost {
    pub registered_domain_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeInfo {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
}

#[async_trait]
pub trait RegisteredDomainApi: Send + Sync {
    async fn create_challenge(&self, domain_name: &str) -> ClientResult<ChallengeInfo>;
    async fn get(&self, id: &str) -> ClientResult<RegisteredDomainInfo>;
    async fn create(&self, domain: &RegisteredDomainPost) -> ClientResult<RegisteredDomainInfo>;
    async fn delete(&self, id: &str) -> ClientResult<()>;

    /// Ask the server to verify the domain's DNS records
    async fn validate(&self, id: &str) -> ClientResult<RegisteredDomainInfo>;
}

fn domain_path(id: &str) -> String {
    format!("api/v2/registered_domain/{}", id)
}

#[async_trait]
impl RegisteredDomainApi for RestClient {
    async fn create_challenge(&self, domain_name: &str) -> ClientResult<ChallengeInfo> {
        let body = ChallengePost {
            registered_domain_name: domain_name.to_string(),
        };
        self.post_v2("api/v2/registered_domain_challenge", &body).await
    }

    async fn get(&self, id: &str) -> ClientResult<RegisteredDomainInfo> {
        self.get_v2(&domain_path(id), &[]).await
    }

    async fn create(&self, domain: &RegisteredDomainPost) -> ClientResult<RegisteredDomainInfo> {
        self.post_v2("api/v2/registered_domain", domain).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        RestClient::delete(self, &domain_path(id), &[]).await
    }

    async fn validate(&self, id: &str) -> ClientResult<RegisteredDomainInfo> {
        self.post_v2(&format!("{}/validate", domain_path(id)), &serde_json::json!({}))
            .await
    }
}
