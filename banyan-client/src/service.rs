//! Registered services (web, TCP, SSH, RDP, Kubernetes, database, generic)
//!
//! All service kinds share one wire document; the kind is selected by the
//! `template` and `service_app_type` tags.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::rest::{RestClient, parse_embedded};

pub const SERVICE_KIND: &str = "BanyanService";
pub const API_VERSION: &str = "rbac.banyanops.com/v1";
pub const SITE_NAME_SELECTOR: &str = "com.banyanops.hosttag.site_name";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDocument {
    pub kind: String,
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub metadata: ServiceMetadata,
    pub spec: ServiceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub tags: ServiceTags,
}

/// Metadata tags; absent tags are omitted from the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_facing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_app_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banyanproxy_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_listen_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_ca_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_service_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_ssh_config: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_chain_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_host_directive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_user_override: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_domains: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub attributes: ServiceAttributes,
    pub backend: Backend,
    pub cert_settings: CertSettings,
    pub http_settings: HttpSettings,
    #[serde(default)]
    pub client_cidrs: Vec<ClientCidrs>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceAttributes {
    #[serde(default)]
    pub tls_sni: Vec<String>,
    #[serde(default)]
    pub frontend_addresses: Vec<FrontendAddress>,
    #[serde(default)]
    pub host_tag_selector: Vec<HashMap<String, String>>,
    #[serde(default)]
    pub disable_private_dns: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontendAddress {
    pub cidr: String,
    pub port: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backend {
    pub target: Target,
    #[serde(default)]
    pub dns_overrides: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub connector_name: String,
    #[serde(default)]
    pub http_connect: bool,
    #[serde(default)]
    pub allow_patterns: Vec<AllowPattern>,
    /// Deprecated by the server; always sent empty
    #[serde(default)]
    pub whitelist: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub tls_insecure: bool,
    #[serde(default)]
    pub client_certificate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowPattern {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cidrs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hostnames: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<PatternPorts>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternPorts {
    #[serde(default)]
    pub port_list: Vec<i64>,
    #[serde(default)]
    pub port_range: Vec<PortRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertSettings {
    #[serde(default)]
    pub dns_names: Vec<String>,
    #[serde(default)]
    pub custom_tls_cert: CustomTlsCert,
    #[serde(default)]
    pub letsencrypt: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomTlsCert {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub cert_file: String,
    #[serde(default)]
    pub key_file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub oidc_settings: OidcSettings,
    #[serde(default)]
    pub exempted_paths: ExemptedPaths,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_trust_cookie: Option<CustomTrustCookie>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OidcSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub service_domain_name: String,
    #[serde(default)]
    pub post_auth_redirect_path: String,
    #[serde(default)]
    pub api_path: String,
    #[serde(default)]
    pub suppress_device_trust_verification: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExemptedPaths {
    #[serde(default)]
    pub enabled: bool,
    /// Legacy flat path list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<Pattern>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(default)]
    pub source_cidrs: Vec<String>,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub mandatory_headers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Host {
    #[serde(default)]
    pub origin_header: Vec<String>,
    #[serde(default)]
    pub target: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomTrustCookie {
    #[serde(default)]
    pub same_site_policy: String,
    #[serde(default)]
    pub trust_cookie_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientCidrs {
    #[serde(default)]
    pub address: Vec<String>,
}

/// Service as stored by the server
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInfo {
    pub id: String,
    pub name: String,
    pub cluster: String,
    pub enabled: bool,
    pub created_at: i64,
    pub spec: ServiceDocument,
}

#[derive(Debug, Deserialize)]
struct RawServiceInfo {
    #[serde(rename = "ServiceID")]
    service_id: String,
    #[serde(rename = "ServiceName")]
    service_name: String,
    #[serde(rename = "ClusterName", default)]
    cluster_name: String,
    #[serde(rename = "Enabled", default)]
    enabled: String,
    #[serde(rename = "CreatedAt", default)]
    created_at: i64,
    #[serde(rename = "ServiceSpec")]
    service_spec: String,
}

impl TryFrom<RawServiceInfo> for ServiceInfo {
    type Error = ClientError;

    fn try_from(raw: RawServiceInfo) -> ClientResult<Self> {
        Ok(Self {
            spec: parse_embedded(&raw.service_spec)?,
            id: raw.service_id,
            name: raw.service_name,
            cluster: raw.cluster_name,
            enabled: raw.enabled.eq_ignore_ascii_case("true"),
            created_at: raw.created_at,
        })
    }
}

#[async_trait]
pub trait ServiceApi: Send + Sync {
    async fn get(&self, id: &str) -> ClientResult<ServiceInfo>;
    async fn create(&self, doc: &ServiceDocument) -> ClientResult<ServiceInfo>;
    async fn update(&self, id: &str, doc: &ServiceDocument) -> ClientResult<ServiceInfo>;
    async fn delete(&self, id: &str) -> ClientResult<()>;
}

#[async_trait]
impl ServiceApi for RestClient {
    async fn get(&self, id: &str) -> ClientResult<ServiceInfo> {
        let found: Vec<RawServiceInfo> = self
            .get("api/v1/registered_services", &[("ServiceID", id)])
            .await?;
        found
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::not_found(format!("service {}", id)))?
            .try_into()
    }

    async fn create(&self, doc: &ServiceDocument) -> ClientResult<ServiceInfo> {
        let raw: RawServiceInfo = self
            .post("api/v1/insert_registered_service", &[], doc)
            .await?;
        raw.try_into()
    }

    async fn update(&self, id: &str, doc: &ServiceDocument) -> ClientResult<ServiceInfo> {
        // insert is an upsert keyed on name and cluster
        let info = ServiceApi::create(self, doc).await?;
        if info.id != id {
            log::warn!("service {} was re-registered as {}", id, info.id);
        }
        Ok(info)
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        RestClient::delete(self, "api/v1/delete_registered_service", &[("ServiceID", id)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_tags_are_omitted() {
        let tags = ServiceTags {
            template: Some("WEB_USER".to_string()),
            port: Some("443".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&tags).unwrap();
        assert_eq!(json, serde_json::json!({"template": "WEB_USER", "port": "443"}));
    }

    #[test]
    fn raw_info_decodes_embedded_spec() {
        let doc = ServiceDocument {
            kind: SERVICE_KIND.to_string(),
            api_version: API_VERSION.to_string(),
            service_type: "origin".to_string(),
            metadata: ServiceMetadata {
                name: "web".to_string(),
                ..Default::default()
            },
            spec: ServiceSpec::default(),
        };
        let raw = serde_json::json!({
            "ServiceID": "web.cluster1",
            "ServiceName": "web",
            "ClusterName": "cluster1",
            "Enabled": "TRUE",
            "CreatedAt": 1700000000,
            "ServiceSpec": serde_json::to_string(&doc).unwrap(),
        });
        let raw: RawServiceInfo = serde_json::from_value(raw).unwrap();
        let info = ServiceInfo::try_from(raw).unwrap();
        assert_eq!(info.id, "web.cluster1");
        assert!(info.enabled);
        assert_eq!(info.spec, doc);
    }

    #[test]
    fn http_connect_target_serializes_empty_name_and_port() {
        let backend = Backend {
            http_connect: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&backend).unwrap();
        assert_eq!(json["target"]["name"], "");
        assert_eq!(json["target"]["port"], "");
        assert_eq!(json["whitelist"], serde_json::json!([]));
        assert!(json.get("connector_name").is_none());
    }
}
