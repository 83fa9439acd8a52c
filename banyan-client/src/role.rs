//! Roles

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::rest::{RestClient, parse_embedded};

pub const ROLE_KIND: &str = "BanyanRole";
pub const API_VERSION: &str = "rbac.banyanops.com/v1";
pub const ROLE_TYPE: &str = "origin";
pub const ROLE_TEMPLATE: &str = "USER";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(rename = "type")]
    pub role_type: String,
    pub metadata: RoleMetadata,
    pub spec: RoleSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: RoleTags,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleTags {
    #[serde(default)]
    pub template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    #[serde(default)]
    pub known_device_only: bool,
    #[serde(default)]
    pub platform: Vec<String>,
    #[serde(default)]
    pub group: Vec<String>,
    #[serde(default)]
    pub email: Vec<String>,
    #[serde(default)]
    pub device_ownership: Vec<String>,
    #[serde(default)]
    pub mdm_present: bool,
    #[serde(default)]
    pub container_fqdn: Vec<String>,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub repo_tag: Vec<String>,
    #[serde(default)]
    pub service_account: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub spec: RoleDocument,
}

#[derive(Debug, Deserialize)]
struct RawRoleInfo {
    #[serde(rename = "RoleID")]
    role_id: String,
    #[serde(rename = "RoleName")]
    role_name: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Enabled", default)]
    enabled: String,
    #[serde(rename = "RoleSpec")]
    role_spec: String,
}

impl TryFrom<RawRoleInfo> for RoleInfo {
    type Error = ClientError;

    fn try_from(raw: RawRoleInfo) -> ClientResult<Self> {
        Ok(Self {
            spec: parse_embedded(&raw.role_spec)?,
            id: raw.role_id,
            name: raw.role_name,
            description: raw.description,
            enabled: raw.enabled.eq_ignore_ascii_case("true"),
        })
    }
}

#[async_trait]
pub trait RoleApi: Send + Sync {
    async fn get(&self, id: &str) -> ClientResult<RoleInfo>;
    async fn get_by_name(&self, name: &str) -> ClientResult<RoleInfo>;
    async fn create(&self, doc: &RoleDocument) -> ClientResult<RoleInfo>;
    async fn update(&self, id: &str, doc: &RoleDocument) -> ClientResult<RoleInfo>;
    async fn delete(&self, id: &str) -> ClientResult<()>;
}

impl RestClient {
    async fn find_role(&self, key: &str, value: &str) -> ClientResult<RoleInfo> {
        let found: Vec<RawRoleInfo> = self.get("api/v1/security_roles", &[(key, value)]).await?;
        found
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::not_found(format!("role {}", value)))?
            .try_into()
    }
}

#[async_trait]
impl RoleApi for RestClient {
    async fn get(&self, id: &str) -> ClientResult<RoleInfo> {
        self.find_role("RoleID", id).await
    }

    async fn get_by_name(&self, name: &str) -> ClientResult<RoleInfo> {
        self.find_role("RoleName", name).await
    }

    async fn create(&self, doc: &RoleDocument) -> ClientResult<RoleInfo> {
        let raw: RawRoleInfo = self.post("api/v1/insert_security_role", &[], doc).await?;
        raw.try_into()
    }

    async fn update(&self, _id: &str, doc: &RoleDocument) -> ClientResult<RoleInfo> {
        RoleApi::create(self, doc).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        RestClient::delete(self, "api/v1/delete_security_role", &[("RoleID", id)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_with_embedded_spec() {
        let raw: RawRoleInfo = serde_json::from_str(
            r#"{"RoleID":"r1","RoleName":"admins","Enabled":"TRUE","RoleSpec":"{\"apiVersion\":\"rbac.banyanops.com/v1\",\"kind\":\"BanyanRole\",\"type\":\"origin\",\"metadata\":{\"name\":\"admins\",\"tags\":{\"template\":\"USER\"}},\"spec\":{\"group\":[\"Admins\"],\"known_device_only\":true}}"}"#,
        )
        .unwrap();
        let role = RoleInfo::try_from(raw).unwrap();
        assert!(role.enabled);
        assert_eq!(role.spec.spec.group, vec!["Admins"]);
        assert!(role.spec.spec.known_device_only);
        assert!(role.spec.spec.email.is_empty());
    }
}
