//! Security policies (web, tunnel, infra)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::rest::{RestClient, parse_embedded};

pub const POLICY_KIND: &str = "BanyanPolicy";
pub const API_VERSION: &str = "rbac.banyanops.com/v1";
pub const POLICY_TYPE: &str = "USER";
pub const POLICY_TEMPLATE: &str = "USER";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    pub metadata: PolicyMetadata,
    pub spec: PolicySpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: PolicyTags,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyTags {
    #[serde(default)]
    pub template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySpec {
    #[serde(default)]
    pub access: Vec<Access>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<Exception>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<PolicyOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Access {
    #[serde(default)]
    pub roles: Vec<String>,
    pub rules: Rules,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    pub conditions: Conditions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l7_access: Option<Vec<L7Access>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l4_access: Option<L4Access>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    #[serde(default)]
    pub trust_level: String,
}

/// Resources × actions; a `!` prefix denies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct L7Access {
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct L4Access {
    #[serde(default)]
    pub allow: Vec<L4Rule>,
    #[serde(default)]
    pub deny: Vec<L4Rule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct L4Rule {
    #[serde(default)]
    pub cidrs: Vec<String>,
    #[serde(default)]
    pub protocols: Vec<String>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fqdns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exception {
    #[serde(default)]
    pub src_addr: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyOptions {
    #[serde(default)]
    pub disable_tls_client_authentication: bool,
    #[serde(default)]
    pub l7_protocol: String,
}

/// Policy as stored by the server
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: i64,
    pub spec: PolicyDocument,
}

#[derive(Debug, Deserialize)]
struct RawPolicyInfo {
    #[serde(rename = "PolicyID")]
    policy_id: String,
    #[serde(rename = "PolicyName")]
    policy_name: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "CreatedAt", default)]
    created_at: i64,
    #[serde(rename = "PolicySpec")]
    policy_spec: String,
}

impl TryFrom<RawPolicyInfo> for PolicyInfo {
    type Error = ClientError;

    fn try_from(raw: RawPolicyInfo) -> ClientResult<Self> {
        Ok(Self {
            spec: parse_embedded(&raw.policy_spec)?,
            id: raw.policy_id,
            name: raw.policy_name,
            description: raw.description,
            created_at: raw.created_at,
        })
    }
}

#[async_trait]
pub trait PolicyApi: Send + Sync {
    async fn get(&self, id: &str) -> ClientResult<PolicyInfo>;
    async fn get_by_name(&self, name: &str) -> ClientResult<PolicyInfo>;
    async fn create(&self, doc: &PolicyDocument) -> ClientResult<PolicyInfo>;
    async fn update(&self, id: &str, doc: &PolicyDocument) -> ClientResult<PolicyInfo>;
    async fn delete(&self, id: &str) -> ClientResult<()>;
}

impl RestClient {
    async fn find_policy(&self, key: &str, value: &str) -> ClientResult<PolicyInfo> {
        let found: Vec<RawPolicyInfo> = self
            .get("api/v1/security_policies", &[(key, value)])
            .await?;
        found
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::not_found(format!("policy {}", value)))?
            .try_into()
    }
}

#[async_trait]
impl PolicyApi for RestClient {
    async fn get(&self, id: &str) -> ClientResult<PolicyInfo> {
        self.find_policy("PolicyID", id).await
    }

    async fn get_by_name(&self, name: &str) -> ClientResult<PolicyInfo> {
        self.find_policy("PolicyName", name).await
    }

    async fn create(&self, doc: &PolicyDocument) -> ClientResult<PolicyInfo> {
        let raw: RawPolicyInfo = self.post("api/v1/insert_security_policy", &[], doc).await?;
        raw.try_into()
    }

    async fn update(&self, _id: &str, doc: &PolicyDocument) -> ClientResult<PolicyInfo> {
        // insert is an upsert keyed on the policy name
        PolicyApi::create(self, doc).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        RestClient::delete(self, "api/v1/delete_security_policy", &[("PolicyID", id)]).await
    }
}
