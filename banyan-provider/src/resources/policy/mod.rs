//! Security policies
//!
//! Web, tunnel and infra policies share one document shape and differ only
//! in what each access rule carries: web rules list L7 resource/action
//! pairs, tunnel rules carry an L4 allow/deny block, infra rules carry
//! neither. `banyan_policy` takes the spec as raw JSON instead.

mod infra;
mod raw;
mod tunnel;
mod web;

pub use raw::RawPolicyResource;

use std::collections::HashMap;

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::attachment::AttachmentInfo;
use banyan_client::policy::{
    API_VERSION, Access, Conditions, POLICY_KIND, POLICY_TEMPLATE, POLICY_TYPE, PolicyDocument,
    PolicyInfo, PolicyMetadata, PolicySpec, PolicyTags, Rules,
};
use banyan_core::provider::{ProviderResult, ResourceAdapter};
use banyan_core::resource::{BlockExt, ResourceData, Value};
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::{api_error, block, blocks_value, handle_not_found, prepare, require_id};
use crate::validators::trust_level;

/// Which access rules a policy carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Web,
    Tunnel,
    Infra,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [PolicyKind::Web, PolicyKind::Tunnel, PolicyKind::Infra];

    pub fn type_name(self) -> &'static str {
        match self {
            PolicyKind::Web => "banyan_policy_web",
            PolicyKind::Tunnel => "banyan_policy_tunnel",
            PolicyKind::Infra => "banyan_policy_infra",
        }
    }

    /// Extra members of each `access` block
    fn rule_attributes(self) -> Vec<AttributeSchema> {
        match self {
            PolicyKind::Web => web::rule_attributes(),
            PolicyKind::Tunnel => tunnel::rule_attributes(),
            PolicyKind::Infra => Vec::new(),
        }
    }

    fn expand_rules(self, access: &HashMap<String, Value>) -> ProviderResult<Rules> {
        let conditions = Conditions {
            trust_level: access.string("trust_level"),
        };
        match self {
            PolicyKind::Web => web::expand_rules(self.type_name(), conditions, access),
            PolicyKind::Tunnel => tunnel::expand_rules(self.type_name(), conditions, access),
            PolicyKind::Infra => Ok(infra::expand_rules(conditions)),
        }
    }
}

/// Wrap a policy spec in the common document
pub(crate) fn document(data: &ResourceData, spec: PolicySpec) -> PolicyDocument {
    PolicyDocument {
        api_version: API_VERSION.to_string(),
        kind: POLICY_KIND.to_string(),
        policy_type: POLICY_TYPE.to_string(),
        metadata: PolicyMetadata {
            name: data.get_string("name"),
            description: data.get_string("description"),
            tags: PolicyTags {
                template: POLICY_TEMPLATE.to_string(),
            },
        },
        spec,
    }
}

pub(crate) fn schema(kind: PolicyKind) -> ResourceSchema {
    let mut access = vec![
        AttributeSchema::new("roles", AttributeType::string_set())
            .required()
            .with_description("Roles granted access by this rule"),
        AttributeSchema::new("trust_level", trust_level())
            .required()
            .with_description("Minimum device trust level"),
    ];
    access.extend(kind.rule_attributes());

    let mut schema = ResourceSchema::new(kind.type_name())
        .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(AttributeSchema::new("access", AttributeType::block(access)).required());
    if kind == PolicyKind::Web {
        schema = schema.attribute(
            AttributeSchema::new("tls_client_authentication", AttributeType::Bool)
                .with_default(false)
                .with_description("Require a client certificate from the device"),
        );
    }
    schema
}

pub fn expand(kind: PolicyKind, data: &ResourceData) -> ProviderResult<PolicyDocument> {
    let access = data
        .get_blocks("access")
        .into_iter()
        .map(|rule| {
            Ok(Access {
                roles: rule.string_set("roles"),
                rules: kind.expand_rules(rule)?,
            })
        })
        .collect::<ProviderResult<Vec<_>>>()?;

    let spec = match kind {
        PolicyKind::Web => web::expand_spec(access, data.get_bool_or("tls_client_authentication", false)),
        PolicyKind::Tunnel => PolicySpec {
            access,
            ..Default::default()
        },
        PolicyKind::Infra => infra::expand_spec(access),
    };
    Ok(document(data, spec))
}

pub fn flatten(kind: PolicyKind, policy: &PolicyInfo, data: &mut ResourceData) {
    data.set("name", policy.name.clone());
    data.set("description", policy.description.clone());

    let access = policy.spec.spec.access.iter().map(|access| {
        let mut members = block([
            ("roles", Value::string_set(access.roles.clone())),
            ("trust_level", access.rules.conditions.trust_level.clone().into()),
        ]);
        match kind {
            PolicyKind::Web => web::flatten_rules(&access.rules, &mut members),
            PolicyKind::Tunnel => tunnel::flatten_rules(&access.rules, &mut members),
            PolicyKind::Infra => {}
        }
        members
    });
    data.set("access", blocks_value(access));

    if kind == PolicyKind::Web {
        web::flatten_options(&policy.spec.spec, data);
    }
}

/// Detach a policy from everything it is attached to, then delete it
pub(crate) async fn detach_and_delete(client: &Client, resource_type: &str, id: &str) -> ProviderResult<()> {
    match client.policy.get(id).await {
        Ok(_) => {}
        Err(err) if err.is_not_found() => {
            log::debug!("{} {} already gone", resource_type, id);
            return Ok(());
        }
        Err(err) => return Err(api_error(resource_type, "read policy", err)),
    }

    let attachments: Vec<AttachmentInfo> = client
        .attachment
        .list_for_policy(id)
        .await
        .map_err(|e| api_error(resource_type, "list policy attachments", e))?;
    for attachment in &attachments {
        log::info!(
            "detaching {} {} from {} {}",
            resource_type,
            id,
            attachment.attached_to_type,
            attachment.attached_to_id
        );
        match client
            .attachment
            .delete(id, &attachment.attached_to_type, &attachment.attached_to_id)
            .await
        {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(api_error(resource_type, "detach policy", err)),
        }
    }

    match client.policy.delete(id).await {
        Ok(()) => log::info!("deleted {} {}", resource_type, id),
        Err(err) if err.is_not_found() => log::debug!("{} {} already gone", resource_type, id),
        Err(err) => return Err(api_error(resource_type, "delete policy", err)),
    }
    Ok(())
}

pub struct PolicyResource {
    kind: PolicyKind,
}

impl PolicyResource {
    pub fn new(kind: PolicyKind) -> Self {
        Self { kind }
    }

    async fn write(&self, client: &Client, data: &mut ResourceData, existing: Option<String>) -> ProviderResult<()> {
        let type_name = self.kind.type_name();
        prepare(&self.schema(), data)?;
        let doc = expand(self.kind, data)?;
        let policy = match &existing {
            Some(id) => client.policy.update(id, &doc).await,
            None => client.policy.create(&doc).await,
        }
        .map_err(|e| api_error(type_name, "write policy", e))?;
        log::info!("wrote {} {} ({})", type_name, policy.name, policy.id);
        data.set_id(policy.id.clone());
        self.read(client, data).await
    }
}

#[async_trait]
impl ResourceAdapter<Client> for PolicyResource {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn schema(&self) -> ResourceSchema {
        schema(self.kind)
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.write(client, data, None).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(self.type_name(), data)?;
        match client.policy.get(&id).await {
            Ok(policy) => {
                flatten(self.kind, &policy, data);
                Ok(())
            }
            Err(err) => handle_not_found(self.type_name(), data, err),
        }
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(self.type_name(), data)?;
        self.write(client, data, Some(id)).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(self.type_name(), data)?;
        detach_and_delete(client, self.type_name(), &id).await?;
        data.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use banyan_client::attachment::AttachmentPost;
    use banyan_core::differ::{Diff, diff};

    fn access(roles: &[&str], trust: &str) -> HashMap<String, Value> {
        block([
            ("roles", Value::string_set(roles.iter().copied())),
            ("trust_level", trust.into()),
        ])
    }

    #[tokio::test]
    async fn infra_policy_document() {
        let mock = MockApi::new();
        let mut data = ResourceData::new()
            .with_attribute("name", "infra")
            .with_attribute("access", blocks_value([access(&["ANY"], "High")]));
        PolicyResource::new(PolicyKind::Infra)
            .create(&mock.client(), &mut data)
            .await
            .unwrap();

        let doc = mock.state().policies["pol-1"].clone();
        let options = doc.spec.options.unwrap();
        assert!(!options.disable_tls_client_authentication);
        assert_eq!(options.l7_protocol, "");
        assert_eq!(doc.spec.exception.unwrap().src_addr, Vec::<String>::new());
        assert_eq!(doc.spec.access[0].rules.l7_access, Some(vec![]));
        assert_eq!(doc.spec.access[0].rules.conditions.trust_level, "High");
        assert_eq!(doc.metadata.tags.template, "USER");
    }

    #[tokio::test]
    async fn reconcile_after_create_is_a_fixed_point() {
        let mock = MockApi::new();
        let client = mock.client();
        for kind in PolicyKind::ALL {
            let desired = ResourceData::new()
                .with_attribute("name", format!("p-{:?}", kind))
                .with_attribute("access", blocks_value([access(&["Everyone"], "Low")]));
            let mut data = desired.clone();
            let resource = PolicyResource::new(kind);
            resource.create(&client, &mut data).await.unwrap();
            assert_eq!(
                diff(&resource.schema(), desired.attributes(), Some(&data)),
                Diff::NoChange,
                "{:?}",
                kind
            );
        }
    }

    #[tokio::test]
    async fn delete_detaches_before_deleting() {
        let mock = MockApi::new();
        let client = mock.client();
        let mut data = ResourceData::new()
            .with_attribute("name", "web")
            .with_attribute("access", blocks_value([access(&["Everyone"], "High")]));
        let resource = PolicyResource::new(PolicyKind::Web);
        resource.create(&client, &mut data).await.unwrap();
        client
            .attachment
            .create("pol-1", &AttachmentPost::new("service", "svc-9", true))
            .await
            .unwrap();
        client
            .attachment
            .create("pol-1", &AttachmentPost::new("saasapp", "app-3", false))
            .await
            .unwrap();

        mock.clear_calls();
        resource.delete(&client, &mut data).await.unwrap();
        assert_eq!(data.id(), None);
        assert_eq!(
            mock.calls(),
            vec![
                "policy.get pol-1",
                "attachment.list pol-1",
                "attachment.delete pol-1 service svc-9",
                "attachment.delete pol-1 saasapp app-3",
                "policy.delete pol-1",
            ]
        );
    }

    #[tokio::test]
    async fn deleting_a_missing_policy_succeeds() {
        let mock = MockApi::new();
        let mut data = ResourceData::with_id("pol-42");
        PolicyResource::new(PolicyKind::Tunnel)
            .delete(&mock.client(), &mut data)
            .await
            .unwrap();
        assert_eq!(data.id(), None);
        assert!(mock.position("policy.delete").is_none());
    }

    #[tokio::test]
    async fn trust_level_is_validated() {
        let mock = MockApi::new();
        let mut data = ResourceData::new()
            .with_attribute("name", "p")
            .with_attribute("access", blocks_value([access(&["Everyone"], "Extreme")]));
        assert!(
            PolicyResource::new(PolicyKind::Infra)
                .create(&mock.client(), &mut data)
                .await
                .is_err()
        );
    }

    #[test]
    fn renaming_forces_replacement() {
        let current = ResourceData::with_id("pol-1")
            .with_attribute("name", "old")
            .with_attribute("access", blocks_value([access(&["Everyone"], "Low")]));
        let desired = ResourceData::new()
            .with_attribute("name", "new")
            .with_attribute("access", blocks_value([access(&["Everyone"], "Low")]));
        assert!(matches!(
            diff(&schema(PolicyKind::Infra), desired.attributes(), Some(&current)),
            Diff::Replace { .. }
        ));
    }
}
