//! In-memory stand-in for every sub-client, used by adapter tests
//!
//! Objects live in ordered maps keyed by generated ids. Every call is logged
//! as `"<api>.<method> <arg>"` so tests can assert on ordering.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use banyan_client::access_tier::{AccessTierApi, AccessTierInfo, AccessTierPost, LocalConfig};
use banyan_client::access_tier_group::{
    AccessTierGroupApi, AccessTierGroupInfo, AccessTierGroupPost, AccessTierList,
};
use banyan_client::api_key::{ApiKeyApi, ApiKeyInfo, ApiKeyPost};
use banyan_client::app_config::{AppConfig, AppConfigApi};
use banyan_client::attachment::{AttachmentApi, AttachmentInfo, AttachmentPost};
use banyan_client::cluster::ClusterApi;
use banyan_client::oidc_settings::{OidcSettings, OidcSettingsApi};
use banyan_client::policy::{PolicyApi, PolicyDocument, PolicyInfo};
use banyan_client::registered_domain::{
    ChallengeInfo, RegisteredDomainApi, RegisteredDomainInfo, RegisteredDomainPost,
};
use banyan_client::role::{RoleApi, RoleDocument, RoleInfo};
use banyan_client::satellite::{ConnectorApi, ConnectorDocument, ConnectorInfo};
use banyan_client::scim::{ScimApi, ScimInfo, ScimToken, TokenInfo};
use banyan_client::service::{ServiceApi, ServiceDocument, ServiceInfo};
use banyan_client::service_tunnel::{ServiceTunnelApi, TunnelInfo, TunnelPolicy, TunnelRequest};
use banyan_client::{Client, ClientError, ClientResult};

#[derive(Default)]
pub struct MockState {
    next_id: u64,
    pub services: BTreeMap<String, ServiceDocument>,
    pub policies: BTreeMap<String, PolicyDocument>,
    pub attachments: Vec<AttachmentInfo>,
    pub tunnels: BTreeMap<String, TunnelRequest>,
    pub tunnel_policies: BTreeMap<String, TunnelPolicy>,
    pub access_tiers: BTreeMap<String, AccessTierPost>,
    pub local_configs: BTreeMap<String, LocalConfig>,
    pub groups: BTreeMap<String, AccessTierGroupPost>,
    pub group_members: BTreeMap<String, Vec<String>>,
    pub connectors: BTreeMap<String, ConnectorDocument>,
    pub api_keys: BTreeMap<String, ApiKeyPost>,
    pub roles: BTreeMap<String, RoleDocument>,
    pub domains: BTreeMap<String, RegisteredDomainPost>,
    pub challenges: Vec<String>,
    pub validated: Vec<String>,
    pub scim: ScimInfo,
    pub app_config: AppConfig,
    pub oidc: OidcSettings,
    pub clusters: Vec<String>,
    /// Connector deletes fail with a transient error this many times
    pub connector_delete_failures: u32,
    /// Tunnel policy attach fails while set
    pub fail_tunnel_attach: bool,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn id_by_name<T>(map: &BTreeMap<String, T>, name: &str, get: impl Fn(&T) -> &str) -> Option<String> {
        map.iter()
            .find(|(_, v)| get(v) == name)
            .map(|(k, _)| k.clone())
    }
}

#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
    calls: Mutex<Vec<String>>,
}

fn not_found(what: &str, id: &str) -> ClientError {
    ClientError::not_found(format!("{} {}", what, id))
}

fn conflict(message: &str) -> ClientError {
    ClientError::Api {
        status: 409,
        message: message.to_string(),
    }
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        let _ = env_logger::builder().is_test(true).try_init();
        let mock = Self::default();
        if let Ok(mut state) = mock.state.lock() {
            state.clusters = vec!["cluster1".to_string(), "global-edge".to_string()];
        }
        Arc::new(mock)
    }

    pub fn client(self: &Arc<Self>) -> Client {
        Client {
            access_tier: self.clone(),
            access_tier_group: self.clone(),
            api_key: self.clone(),
            app_config: self.clone(),
            attachment: self.clone(),
            cluster: self.clone(),
            connector: self.clone(),
            oidc_settings: self.clone(),
            policy: self.clone(),
            registered_domain: self.clone(),
            role: self.clone(),
            scim: self.clone(),
            service: self.clone(),
            service_tunnel: self.clone(),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Index of the first logged call starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }

    fn record(&self, call: impl Into<String>) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call.into());
    }
}

// =============================================================================
// Services and policies
// =============================================================================

#[async_trait]
impl ServiceApi for MockApi {
    async fn get(&self, id: &str) -> ClientResult<ServiceInfo> {
        self.record(format!("service.get {}", id));
        let state = self.state();
        let doc = state.services.get(id).ok_or_else(|| not_found("service", id))?;
        Ok(ServiceInfo {
            id: id.to_string(),
            name: doc.metadata.name.clone(),
            cluster: doc.metadata.cluster.clone(),
            enabled: true,
            created_at: 0,
            spec: doc.clone(),
        })
    }

    async fn create(&self, doc: &ServiceDocument) -> ClientResult<ServiceInfo> {
        self.record(format!("service.create {}", doc.metadata.name));
        let id = {
            let mut state = self.state();
            let id = MockState::id_by_name(&state.services, &doc.metadata.name, |d| d.metadata.name.as_str())
                .unwrap_or_else(|| state.next_id("svc"));
            state.services.insert(id.clone(), doc.clone());
            id
        };
        ServiceApi::get(self, &id).await
    }

    async fn update(&self, id: &str, doc: &ServiceDocument) -> ClientResult<ServiceInfo> {
        self.record(format!("service.update {}", id));
        self.state().services.insert(id.to_string(), doc.clone());
        ServiceApi::get(self, id).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.record(format!("service.delete {}", id));
        let mut state = self.state();
        if state.attachments.iter().any(|a| a.attached_to_id == id) {
            return Err(conflict("service has an attached policy"));
        }
        state.services.remove(id).map(|_| ()).ok_or_else(|| not_found("service", id))
    }
}

#[async_trait]
impl PolicyApi for MockApi {
    async fn get(&self, id: &str) -> ClientResult<PolicyInfo> {
        self.record(format!("policy.get {}", id));
        let state = self.state();
        let doc = state.policies.get(id).ok_or_else(|| not_found("policy", id))?;
        Ok(PolicyInfo {
            id: id.to_string(),
            name: doc.metadata.name.clone(),
            description: doc.metadata.description.clone(),
            created_at: 0,
            spec: doc.clone(),
        })
    }

    async fn get_by_name(&self, name: &str) -> ClientResult<PolicyInfo> {
        self.record(format!("policy.get_by_name {}", name));
        let id = MockState::id_by_name(&self.state().policies, name, |d| d.metadata.name.as_str())
            .ok_or_else(|| not_found("policy", name))?;
        PolicyApi::get(self, &id).await
    }

    async fn create(&self, doc: &PolicyDocument) -> ClientResult<PolicyInfo> {
        self.record(format!("policy.create {}", doc.metadata.name));
        let id = {
            let mut state = self.state();
            let id = MockState::id_by_name(&state.policies, &doc.metadata.name, |d| d.metadata.name.as_str())
                .unwrap_or_else(|| state.next_id("pol"));
            state.policies.insert(id.clone(), doc.clone());
            id
        };
        PolicyApi::get(self, &id).await
    }

    async fn update(&self, id: &str, doc: &PolicyDocument) -> ClientResult<PolicyInfo> {
        self.record(format!("policy.update {}", id));
        self.state().policies.insert(id.to_string(), doc.clone());
        PolicyApi::get(self, id).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.record(format!("policy.delete {}", id));
        let mut state = self.state();
        if state.attachments.iter().any(|a| a.policy_id == id) {
            return Err(conflict("policy is attached"));
        }
        state.policies.remove(id).map(|_| ()).ok_or_else(|| not_found("policy", id))
    }
}

#[async_trait]
impl AttachmentApi for MockApi {
    async fn create(&self, policy_id: &str, body: &AttachmentPost) -> ClientResult<AttachmentInfo> {
        self.record(format!(
            "attachment.create {} {} {}",
            policy_id, body.attached_to_type, body.attached_to_id
        ));
        let mut state = self.state();
        if !state.policies.contains_key(policy_id) {
            return Err(not_found("policy", policy_id));
        }
        state.attachments.retain(|a| a.attached_to_id != body.attached_to_id);
        let info = AttachmentInfo {
            policy_id: policy_id.to_string(),
            attached_to_id: body.attached_to_id.clone(),
            attached_to_type: body.attached_to_type.clone(),
            enabled: body.enabled.clone(),
            attached_at: 0,
        };
        state.attachments.push(info.clone());
        Ok(info)
    }

    async fn get(&self, attached_to_id: &str, attached_to_type: &str) -> ClientResult<AttachmentInfo> {
        self.record(format!("attachment.get {} {}", attached_to_type, attached_to_id));
        self.state()
            .attachments
            .iter()
            .find(|a| a.attached_to_id == attached_to_id && a.attached_to_type == attached_to_type)
            .cloned()
            .ok_or_else(|| not_found("attachment", attached_to_id))
    }

    async fn list_for_policy(&self, policy_id: &str) -> ClientResult<Vec<AttachmentInfo>> {
        self.record(format!("attachment.list {}", policy_id));
        Ok(self
            .state()
            .attachments
            .iter()
            .filter(|a| a.policy_id == policy_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, policy_id: &str, attached_to_type: &str, attached_to_id: &str) -> ClientResult<()> {
        self.record(format!(
            "attachment.delete {} {} {}",
            policy_id, attached_to_type, attached_to_id
        ));
        let mut state = self.state();
        let before = state.attachments.len();
        state.attachments.retain(|a| {
            !(a.policy_id == policy_id
                && a.attached_to_type == attached_to_type
                && a.attached_to_id == attached_to_id)
        });
        if state.attachments.len() == before {
            return Err(not_found("attachment", attached_to_id));
        }
        Ok(())
    }
}

// =============================================================================
// Service tunnels
// =============================================================================

#[async_trait]
impl ServiceTunnelApi for MockApi {
    async fn get(&self, id: &str) -> ClientResult<TunnelInfo> {
        self.record(format!("tunnel.get {}", id));
        let state = self.state();
        let request = state.tunnels.get(id).ok_or_else(|| not_found("service tunnel", id))?;
        Ok(TunnelInfo {
            id: id.to_string(),
            name: request.metadata.name.clone(),
            friendly_name: request.metadata.friendly_name.clone(),
            description: request.metadata.description.clone(),
            enabled: true,
            created_at: 0,
            updated_at: 0,
            spec: request.clone(),
        })
    }

    async fn create(&self, request: &TunnelRequest) -> ClientResult<TunnelInfo> {
        self.record(format!("tunnel.create {}", request.metadata.name));
        let id = {
            let mut state = self.state();
            let id = state.next_id("tun");
            state.tunnels.insert(id.clone(), request.clone());
            id
        };
        ServiceTunnelApi::get(self, &id).await
    }

    async fn update(&self, id: &str, request: &TunnelRequest) -> ClientResult<TunnelInfo> {
        self.record(format!("tunnel.update {}", id));
        self.state().tunnels.insert(id.to_string(), request.clone());
        ServiceTunnelApi::get(self, id).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.record(format!("tunnel.delete {}", id));
        let mut state = self.state();
        if state.tunnel_policies.contains_key(id) {
            return Err(conflict("service tunnel has an attached policy"));
        }
        state.tunnels.remove(id).map(|_| ()).ok_or_else(|| not_found("service tunnel", id))
    }

    async fn attach_policy(&self, id: &str, policy: &TunnelPolicy) -> ClientResult<TunnelPolicy> {
        self.record(format!("tunnel.attach_policy {} {}", id, policy.policy_id));
        let mut state = self.state();
        if state.fail_tunnel_attach {
            return Err(ClientError::Api {
                status: 400,
                message: "policy type not allowed for service tunnel".to_string(),
            });
        }
        state.tunnel_policies.insert(id.to_string(), policy.clone());
        Ok(policy.clone())
    }

    async fn get_policy(&self, id: &str) -> ClientResult<TunnelPolicy> {
        self.record(format!("tunnel.get_policy {}", id));
        self.state()
            .tunnel_policies
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("tunnel policy", id))
    }

    async fn detach_policy(&self, id: &str, policy_id: &str) -> ClientResult<()> {
        self.record(format!("tunnel.detach_policy {} {}", id, policy_id));
        let mut state = self.state();
        match state.tunnel_policies.get(id) {
            Some(p) if p.policy_id == policy_id => {
                state.tunnel_policies.remove(id);
                Ok(())
            }
            _ => Err(not_found("tunnel policy", policy_id)),
        }
    }
}

// =============================================================================
// Access tiers, groups and connectors
// =============================================================================

fn tier_info(id: &str, tier: &AccessTierPost) -> AccessTierInfo {
    AccessTierInfo {
        id: id.to_string(),
        name: tier.name.clone(),
        address: tier.address.clone(),
        domains: tier.domains.clone(),
        tunnel_enduser: tier.tunnel_enduser.clone(),
        tunnel_satellite: tier.tunnel_satellite.clone(),
        cluster_name: tier.cluster_name.clone(),
        disable_snat: tier.disable_snat,
        src_nat_cidr_range: tier.src_nat_cidr_range.clone(),
        api_key_id: tier.api_key_id.clone(),
        description: tier.description.clone(),
        status: "Pending".to_string(),
        access_tier_group_id: String::new(),
        created_at: 0,
    }
}

#[async_trait]
impl AccessTierApi for MockApi {
    async fn get(&self, id: &str) -> ClientResult<AccessTierInfo> {
        self.record(format!("access_tier.get {}", id));
        let state = self.state();
        let tier = state.access_tiers.get(id).ok_or_else(|| not_found("access tier", id))?;
        Ok(tier_info(id, tier))
    }

    async fn create(&self, tier: &AccessTierPost) -> ClientResult<AccessTierInfo> {
        self.record(format!("access_tier.create {}", tier.name));
        let mut state = self.state();
        let id = state.next_id("at");
        state.access_tiers.insert(id.clone(), tier.clone());
        Ok(tier_info(&id, tier))
    }

    async fn update(&self, id: &str, tier: &AccessTierPost) -> ClientResult<AccessTierInfo> {
        self.record(format!("access_tier.update {}", id));
        let mut state = self.state();
        if !state.access_tiers.contains_key(id) {
            return Err(not_found("access tier", id));
        }
        state.access_tiers.insert(id.to_string(), tier.clone());
        Ok(tier_info(id, tier))
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.record(format!("access_tier.delete {}", id));
        let mut state = self.state();
        state.local_configs.remove(id);
        state.access_tiers.remove(id).map(|_| ()).ok_or_else(|| not_found("access tier", id))
    }

    async fn get_local_config(&self, id: &str) -> ClientResult<LocalConfig> {
        self.record(format!("access_tier.get_local_config {}", id));
        Ok(self.state().local_configs.get(id).cloned().unwrap_or_default())
    }

    async fn update_local_config(&self, id: &str, config: &LocalConfig) -> ClientResult<LocalConfig> {
        self.record(format!("access_tier.update_local_config {}", id));
        let mut state = self.state();
        if !state.access_tiers.contains_key(id) {
            return Err(not_found("access tier", id));
        }
        state.local_configs.insert(id.to_string(), config.clone());
        Ok(config.clone())
    }
}

fn group_info(id: &str, group: &AccessTierGroupPost, members: &[String]) -> AccessTierGroupInfo {
    AccessTierGroupInfo {
        id: id.to_string(),
        name: group.name.clone(),
        description: group.description.clone(),
        cluster_name: group.cluster_name.clone(),
        tunnel_enduser: group.tunnel_enduser.clone(),
        access_tier_ids: members.to_vec(),
        created_at: 0,
    }
}

#[async_trait]
impl AccessTierGroupApi for MockApi {
    async fn get(&self, id: &str) -> ClientResult<AccessTierGroupInfo> {
        self.record(format!("access_tier_group.get {}", id));
        let state = self.state();
        let group = state.groups.get(id).ok_or_else(|| not_found("access tier group", id))?;
        let members = state.group_members.get(id).cloned().unwrap_or_default();
        Ok(group_info(id, group, &members))
    }

    async fn create(&self, group: &AccessTierGroupPost) -> ClientResult<AccessTierGroupInfo> {
        self.record(format!("access_tier_group.create {}", group.name));
        let mut state = self.state();
        let id = state.next_id("atg");
        state.groups.insert(id.clone(), group.clone());
        Ok(group_info(&id, group, &[]))
    }

    async fn update(&self, id: &str, group: &AccessTierGroupPost) -> ClientResult<AccessTierGroupInfo> {
        self.record(format!("access_tier_group.update {}", id));
        let mut state = self.state();
        state.groups.insert(id.to_string(), group.clone());
        let members = state.group_members.get(id).cloned().unwrap_or_default();
        Ok(group_info(id, group, &members))
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.record(format!("access_tier_group.delete {}", id));
        let mut state = self.state();
        state.group_members.remove(id);
        state.groups.remove(id).map(|_| ()).ok_or_else(|| not_found("access tier group", id))
    }

    async fn attach_access_tiers(&self, id: &str, tiers: &AccessTierList) -> ClientResult<()> {
        self.record(format!(
            "access_tier_group.attach {} {}",
            id,
            tiers.access_tier_ids.join(",")
        ));
        let mut state = self.state();
        let members = state.group_members.entry(id.to_string()).or_default();
        for tier in &tiers.access_tier_ids {
            if !members.contains(tier) {
                members.push(tier.clone());
            }
        }
        Ok(())
    }

    async fn detach_access_tiers(&self, id: &str, tiers: &AccessTierList) -> ClientResult<()> {
        self.record(format!(
            "access_tier_group.detach {} {}",
            id,
            tiers.access_tier_ids.join(",")
        ));
        if let Some(members) = self.state().group_members.get_mut(id) {
            members.retain(|m| !tiers.access_tier_ids.contains(m));
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectorApi for MockApi {
    async fn get(&self, id: &str) -> ClientResult<ConnectorInfo> {
        self.record(format!("connector.get {}", id));
        let state = self.state();
        let doc = state.connectors.get(id).ok_or_else(|| not_found("connector", id))?;
        Ok(ConnectorInfo {
            id: id.to_string(),
            name: doc.metadata.name.clone(),
            status: "Pending".to_string(),
            spec: doc.clone(),
        })
    }

    async fn create(&self, doc: &ConnectorDocument) -> ClientResult<ConnectorInfo> {
        self.record(format!("connector.create {}", doc.metadata.name));
        let id = {
            let mut state = self.state();
            let id = state.next_id("con");
            state.connectors.insert(id.clone(), doc.clone());
            id
        };
        ConnectorApi::get(self, &id).await
    }

    async fn update(&self, id: &str, doc: &ConnectorDocument) -> ClientResult<ConnectorInfo> {
        self.record(format!("connector.update {}", id));
        self.state().connectors.insert(id.to_string(), doc.clone());
        ConnectorApi::get(self, id).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.record(format!("connector.delete {}", id));
        let mut state = self.state();
        if state.connector_delete_failures > 0 {
            state.connector_delete_failures -= 1;
            return Err(ClientError::Api {
                status: 400,
                message: "connector still has active tunnels".to_string(),
            });
        }
        state.connectors.remove(id).map(|_| ()).ok_or_else(|| not_found("connector", id))
    }
}

// =============================================================================
// Keys, roles, domains and tenant singletons
// =============================================================================

fn key_info(id: &str, key: &ApiKeyPost, secret: &str) -> ApiKeyInfo {
    ApiKeyInfo {
        id: id.to_string(),
        name: key.name.clone(),
        description: key.description.clone(),
        scope: key.scope.clone(),
        secret: secret.to_string(),
        created_at: 0,
    }
}

#[async_trait]
impl ApiKeyApi for MockApi {
    async fn get(&self, id: &str) -> ClientResult<ApiKeyInfo> {
        self.record(format!("api_key.get {}", id));
        let state = self.state();
        let key = state.api_keys.get(id).ok_or_else(|| not_found("api key", id))?;
        Ok(key_info(id, key, ""))
    }

    async fn create(&self, key: &ApiKeyPost) -> ClientResult<ApiKeyInfo> {
        self.record(format!("api_key.create {}", key.name));
        let mut state = self.state();
        let id = state.next_id("key");
        state.api_keys.insert(id.clone(), key.clone());
        Ok(key_info(&id, key, &format!("secret-for-{}", id)))
    }

    async fn update(&self, id: &str, key: &ApiKeyPost) -> ClientResult<ApiKeyInfo> {
        self.record(format!("api_key.update {}", id));
        self.state().api_keys.insert(id.to_string(), key.clone());
        Ok(key_info(id, key, ""))
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.record(format!("api_key.delete {}", id));
        self.state().api_keys.remove(id).map(|_| ()).ok_or_else(|| not_found("api key", id))
    }
}

#[async_trait]
impl RoleApi for MockApi {
    async fn get(&self, id: &str) -> ClientResult<RoleInfo> {
        self.record(format!("role.get {}", id));
        let state = self.state();
        let doc = state.roles.get(id).ok_or_else(|| not_found("role", id))?;
        Ok(RoleInfo {
            id: id.to_string(),
            name: doc.metadata.name.clone(),
            description: doc.metadata.description.clone(),
            enabled: true,
            spec: doc.clone(),
        })
    }

    async fn get_by_name(&self, name: &str) -> ClientResult<RoleInfo> {
        self.record(format!("role.get_by_name {}", name));
        let id = MockState::id_by_name(&self.state().roles, name, |d| d.metadata.name.as_str())
            .ok_or_else(|| not_found("role", name))?;
        RoleApi::get(self, &id).await
    }

    async fn create(&self, doc: &RoleDocument) -> ClientResult<RoleInfo> {
        self.record(format!("role.create {}", doc.metadata.name));
        let id = {
            let mut state = self.state();
            let id = MockState::id_by_name(&state.roles, &doc.metadata.name, |d| d.metadata.name.as_str())
                .unwrap_or_else(|| state.next_id("role"));
            state.roles.insert(id.clone(), doc.clone());
            id
        };
        RoleApi::get(self, &id).await
    }

    async fn update(&self, id: &str, doc: &RoleDocument) -> ClientResult<RoleInfo> {
        self.record(format!("role.update {}", id));
        self.state().roles.insert(id.to_string(), doc.clone());
        RoleApi::get(self, id).await
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.record(format!("role.delete {}", id));
        self.state().roles.remove(id).map(|_| ()).ok_or_else(|| not_found("role", id))
    }
}

fn domain_info(id: &str, domain: &RegisteredDomainPost, validated: bool) -> RegisteredDomainInfo {
    RegisteredDomainInfo {
        id: id.to_string(),
        name: domain.name.clone(),
        cluster_name: domain.cluster_name.clone(),
        cname: if domain.cname.is_empty() {
            format!("{}.edge.banyanops.com", id)
        } else {
            domain.cname.clone()
        },
        description: domain.description.clone(),
        acme_cname: format!("_acme-challenge.{}", domain.name),
        domain_name: domain.name.clone(),
        status: if validated { "Verified" } else { "Pending" }.to_string(),
        created_at: 0,
    }
}

#[async_trait]
impl RegisteredDomainApi for MockApi {
    async fn create_challenge(&self, domain_name: &str) -> ClientResult<ChallengeInfo> {
        self.record(format!("registered_domain.create_challenge {}", domain_name));
        let mut state = self.state();
        let id = state.next_id("chal");
        state.challenges.push(id.clone());
        Ok(ChallengeInfo {
            id,
            label: format!("_banyan.{}", domain_name),
            value: "token".to_string(),
        })
    }

    async fn get(&self, id: &str) -> ClientResult<RegisteredDomainInfo> {
        self.record(format!("registered_domain.get {}", id));
        let state = self.state();
        let domain = state.domains.get(id).ok_or_else(|| not_found("registered domain", id))?;
        Ok(domain_info(id, domain, state.validated.iter().any(|v| v == id)))
    }

    async fn create(&self, domain: &RegisteredDomainPost) -> ClientResult<RegisteredDomainInfo> {
        self.record(format!(
            "registered_domain.create {} {}",
            domain.name, domain.registered_domain_challenge_id
        ));
        let mut state = self.state();
        if domain.cluster_name == "global-edge"
            && !state.challenges.contains(&domain.registered_domain_challenge_id)
        {
            return Err(ClientError::Api {
                status: 400,
                message: "challenge id required for global-edge".to_string(),
            });
        }
        let id = state.next_id("rd");
        state.domains.insert(id.clone(), domain.clone());
        Ok(domain_info(&id, domain, false))
    }

    async fn delete(&self, id: &str) -> ClientResult<()> {
        self.record(format!("registered_domain.delete {}", id));
        self.state()
            .domains
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("registered domain", id))
    }

    async fn validate(&self, id: &str) -> ClientResult<RegisteredDomainInfo> {
        self.record(format!("registered_domain.validate {}", id));
        let mut state = self.state();
        let domain = state
            .domains
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("registered domain", id))?;
        state.validated.push(id.to_string());
        Ok(domain_info(id, &domain, true))
    }
}

#[async_trait]
impl ScimApi for MockApi {
    async fn get(&self) -> ClientResult<ScimInfo> {
        self.record("scim.get");
        Ok(self.state().scim.clone())
    }

    async fn set_enabled(&self, enabled: bool) -> ClientResult<ScimInfo> {
        self.record(format!("scim.set_enabled {}", enabled));
        let mut state = self.state();
        state.scim.is_enabled = enabled;
        if enabled {
            state.scim.id = "scim-tenant".to_string();
            state.scim.base_url = "https://scim.example.com/v2".to_string();
        } else {
            state.scim = ScimInfo::default();
        }
        Ok(state.scim.clone())
    }

    async fn create_token(&self) -> ClientResult<ScimToken> {
        self.record("scim.create_token");
        let mut state = self.state();
        let uuid = state.next_id("tok");
        state.scim.token_infos.push(TokenInfo {
            uuid: uuid.clone(),
            created_at: 1_700_000_000,
        });
        Ok(ScimToken {
            token: format!("bearer-{}", uuid),
            uuid,
        })
    }

    async fn delete_token(&self, uuid: &str) -> ClientResult<()> {
        self.record(format!("scim.delete_token {}", uuid));
        self.state().scim.token_infos.retain(|t| t.uuid != uuid);
        Ok(())
    }
}

#[async_trait]
impl AppConfigApi for MockApi {
    async fn get(&self) -> ClientResult<AppConfig> {
        self.record("app_config.get");
        Ok(self.state().app_config.clone())
    }

    async fn update(&self, nrpt_config: bool) -> ClientResult<AppConfig> {
        self.record(format!("app_config.update {}", nrpt_config));
        let mut state = self.state();
        state.app_config = AppConfig {
            id: "app-config".to_string(),
            nrpt_config,
        };
        Ok(state.app_config.clone())
    }
}

#[async_trait]
impl OidcSettingsApi for MockApi {
    async fn get(&self) -> ClientResult<OidcSettings> {
        self.record("oidc_settings.get");
        Ok(self.state().oidc.clone())
    }
}

#[async_trait]
impl ClusterApi for MockApi {
    async fn list(&self) -> ClientResult<Vec<String>> {
        self.record("cluster.list");
        Ok(self.state().clusters.clone())
    }
}
