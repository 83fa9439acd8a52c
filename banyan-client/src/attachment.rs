//! Policy attachments
//!
//! An attachment binds one security policy to one target (a service, a SaaS
//! app or a service tunnel). The server keys attachments by the target, so a
//! target carries at most one policy at a time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::rest::RestClient;

/// Target kinds a policy can be attached to
pub const ATTACHED_TO_SERVICE: &str = "service";
pub const ATTACHED_TO_SAAS_APP: &str = "saasapp";
pub const ATTACHED_TO_SERVICE_TUNNEL: &str = "servicetunnel";

/// Body of an attach request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPost {
    pub attached_to_id: String,
    pub attached_to_type: String,
    pub is_enabled: bool,
    /// Uppercase `"TRUE"` / `"FALSE"` mirror of `is_enabled`
    pub enabled: String,
}

impl AttachmentPost {
    pub fn new(attached_to_type: &str, attached_to_id: &str, is_enabled: bool) -> Self {
        Self {
            attached_to_id: attached_to_id.to_string(),
            attached_to_type: attached_to_type.to_string(),
            is_enabled,
            enabled: if is_enabled { "TRUE" } else { "FALSE" }.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    #[serde(rename = "PolicyID")]
    pub policy_id: String,
    #[serde(rename = "AttachedToID")]
    pub attached_to_id: String,
    #[serde(rename = "AttachedToType")]
    pub attached_to_type: String,
    #[serde(rename = "Enabled", default)]
    pub enabled: String,
    #[serde(rename = "AttachedAt", default)]
    pub attached_at: i64,
}

impl AttachmentInfo {
    pub fn is_enabled(&self) -> bool {
        self.enabled.eq_ignore_ascii_case("true")
    }
}

#[async_trait]
pub trait AttachmentApi: Send + Sync {
    async fn create(&self, policy_id: &str, body: &AttachmentPost) -> ClientResult<AttachmentInfo>;

    /// The attachment on a given target
    async fn get(&self, attached_to_id: &str, attached_to_type: &str) -> ClientResult<AttachmentInfo>;

    /// Every target a policy is attached to
    async fn list_for_policy(&self, policy_id: &str) -> ClientResult<Vec<AttachmentInfo>>;

    async fn delete(&self, policy_id: &str, attached_to_type: &str, attached_to_id: &str) -> ClientResult<()>;
}

#[async_trait]
impl AttachmentApi for RestClient {
    async fn create(&self, policy_id: &str, body: &AttachmentPost) -> ClientResult<AttachmentInfo> {
        self.post(
            "api/v1/insert_security_attach_policy",
            &[("PolicyID", policy_id)],
            body,
        )
        .await
    }

    async fn get(&self, attached_to_id: &str, attached_to_type: &str) -> ClientResult<AttachmentInfo> {
        let found: Vec<AttachmentInfo> = self
            .get(
                "api/v1/security_attach_policies",
                &[
                    ("AttachedToID", attached_to_id),
                    ("AttachedToType", attached_to_type),
                ],
            )
            .await?;
        found.into_iter().next().ok_or_else(|| {
            ClientError::not_found(format!("attachment on {} {}", attached_to_type, attached_to_id))
        })
    }

    async fn list_for_policy(&self, policy_id: &str) -> ClientResult<Vec<AttachmentInfo>> {
        match self
            .get("api/v1/security_attach_policies", &[("PolicyID", policy_id)])
            .await
        {
            Ok(found) => Ok(found),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, policy_id: &str, attached_to_type: &str, attached_to_id: &str) -> ClientResult<()> {
        RestClient::delete(
            self,
            "api/v1/delete_security_attach_policy",
            &[
                ("PolicyID", policy_id),
                ("AttachedToID", attached_to_id),
                ("AttachedToType", attached_to_type),
            ],
        )
        .await
    }
}
