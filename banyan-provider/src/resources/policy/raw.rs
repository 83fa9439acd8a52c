//! Policies given as a raw JSON spec

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::policy::PolicySpec;
use banyan_core::provider::{ProviderError, ProviderResult, ResourceAdapter};
use banyan_core::resource::ResourceData;
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::{detach_and_delete, document};
use crate::helpers::{api_error, handle_not_found, prepare, require_id};

const TYPE_NAME: &str = "banyan_policy";

fn parse_spec(raw: &str) -> ProviderResult<PolicySpec> {
    serde_json::from_str(raw).map_err(|e| {
        ProviderError::new("invalid spec_json")
            .for_resource(TYPE_NAME)
            .with_cause(e)
    })
}

/// Refresh `spec_json` only when the server's spec means something different
///
/// Whitespace and key order in the user's JSON are kept as written.
fn flatten_spec(server: &PolicySpec, data: &mut ResourceData) -> ProviderResult<()> {
    let unchanged = data
        .get_str("spec_json")
        .and_then(|raw| serde_json::from_str::<PolicySpec>(raw).ok())
        .is_some_and(|current| current == *server);
    if !unchanged {
        let rendered = serde_json::to_string_pretty(server).map_err(|e| {
            ProviderError::new("failed to render policy spec")
                .for_resource(TYPE_NAME)
                .with_cause(e)
        })?;
        data.set("spec_json", rendered);
    }
    Ok(())
}

pub struct RawPolicyResource;

impl RawPolicyResource {
    async fn write(&self, client: &Client, data: &mut ResourceData, existing: Option<String>) -> ProviderResult<()> {
        prepare(&self.schema(), data)?;
        let doc = document(data, parse_spec(&data.get_string("spec_json"))?);
        let policy = match &existing {
            Some(id) => client.policy.update(id, &doc).await,
            None => client.policy.create(&doc).await,
        }
        .map_err(|e| api_error(TYPE_NAME, "write policy", e))?;
        data.set_id(policy.id.clone());
        self.read(client, data).await
    }
}

#[async_trait]
impl ResourceAdapter<Client> for RawPolicyResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description("Security policy with a hand-written spec")
            .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
            .attribute(AttributeSchema::new("description", AttributeType::String))
            .attribute(
                AttributeSchema::new("spec_json", AttributeType::String)
                    .required()
                    .with_description("JSON policy spec: access, exception and options"),
            )
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.write(client, data, None).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.policy.get(&id).await {
            Ok(policy) => {
                data.set("name", policy.name.clone());
                data.set("description", policy.description.clone());
                flatten_spec(&policy.spec.spec, data)
            }
            Err(err) => handle_not_found(TYPE_NAME, data, err),
        }
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        self.write(client, data, Some(id)).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        detach_and_delete(client, TYPE_NAME, &id).await?;
        data.clear_id();
        Ok(())
    }
}
