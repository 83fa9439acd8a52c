//! Connectors (satellites)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::rest::{RestClient, parse_embedded};

pub const CONNECTOR_KIND: &str = "BanyanConnector";
pub const API_VERSION: &str = "rbac.banyanops.com/v1";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(rename = "type")]
    pub connector_type: String,
    pub metadata: ConnectorMetadata,
    pub spec: ConnectorSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorMetadata {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSpec {
    pub api_key_id: String,
    #[serde(default)]
    pub keepalive: i64,
    #[serde(default)]
    pub cidrs: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub peer_access_tiers: Vec<ConnectorPeer>,
    #[serde(default)]
    pub disable_snat: bool,
    #[serde(default)]
    pub dns_search_domains: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorPeer {
    pub cluster: String,
    #[serde(default)]
    pub access_tiers: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_tier_group: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorInfo {
    pub id: String,
    pub name: String,
    pub status: String,
    pub spec: ConnectorDocument,
}

#[derive(Debug, Deserialize)]
struct RawConnectorInfo {
    id: String,
    name: String,
    #[serde(default)]
    status: String,
    spec: String,
}

impl TryFrom<RawConnectorInfo> for ConnectorInfo {
    type Error = ClientError;

    fn try_from(raw: RawConnectorInfo) -> ClientResult<Self> {
        Ok(Self {
            spec: parse_embedded(&raw.spec)?,
            id: raw.id,
            name: raw.name,
            status: raw.status,
        })
    }
}

#[async_trait]
pub trait ConnectorApi: Send + Sync {
    async fn get(&self, id: &str) -> ClientResult<ConnectorInfo>;
    async fn create(&self, doc: &ConnectorDocument) -> ClientResult<ConnectorInfo>;
    async fn update(&self, id: &str, doc: &ConnectorDocument) -> ClientResult<ConnectorInfo>;
    async fn delete(&self, id: &str) -> ClientResult<()>;
}

fn connector_path(id: &str) -> String {
    format!("api/v2/satellite/{}", id)
}

#[async_trait]
impl ConnectorApi for RestClient {
    async fn get(&self, id: &str) -> ClientResult<ConnectorInfo> {
        let raw: RawConnectorInfo = self.get_v2(&connector_path(id), &[]).await?;
        raw.try_into()
    }

    async fn create(&self, doc: &ConnectorDocument) -> ClientResult<ConnectorInfo> {
        let raw: RawConnectorInfo = self.post_v2("api/v2/satellite", doc).await?;
        raw.try_into()
    }

    async fn update(&self, id: &str, doc: &ConnectorDocument) -> ClientResult<ConnectorInfo> {
        let raw: RawConnectorInfo = self.put_v2(&connector_path(id), doc).await?;
        raw.try_into()
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        RestClient::delete(self, &connector_path(id), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_embedded_connector_spec() {
        let raw: RawConnectorInfo = serde_json::from_str(
            r#"{"id":"c1","name":"edge","status":"Healthy","spec":"{\"apiVersion\":\"rbac.banyanops.com/v1\",\"kind\":\"BanyanConnector\",\"type\":\"attribute-based\",\"metadata\":{\"name\":\"edge\"},\"spec\":{\"api_key_id\":\"k1\",\"peer_access_tiers\":[{\"cluster\":\"c\",\"access_tiers\":[\"*\"]}]}}"}"#,
        )
        .unwrap();
        let info = ConnectorInfo::try_from(raw).unwrap();
        assert_eq!(info.spec.spec.api_key_id, "k1");
        assert_eq!(info.spec.spec.peer_access_tiers[0].access_tiers, vec!["*"]);
    }
}
