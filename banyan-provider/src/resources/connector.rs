//! Connectors (satellites)

use std::time::Duration;

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::satellite::{
    API_VERSION, CONNECTOR_KIND, ConnectorDocument, ConnectorInfo, ConnectorMetadata, ConnectorPeer, ConnectorSpec,
};
use banyan_core::provider::{ProviderResult, ResourceAdapter};
use banyan_core::resource::{ResourceData, Value};
use banyan_core::retry::{Backoff, RetryError, retry};
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::{api_error, check_exclusive, handle_not_found, prepare, require_id};
use crate::resources::access_tier::set_access_tier_cluster;
use crate::validators::{access_tier_set, cidr_set, domain_set};

const TYPE_NAME: &str = "banyan_connector";

/// Connectors keep tunnels open for a while after they are told to go away
const DELETE_TIMEOUT: Duration = Duration::from_secs(180);
const DELETE_INTERVAL: Duration = Duration::from_secs(5);

pub struct ConnectorResource;

impl ConnectorResource {
    fn expand(data: &ResourceData) -> ConnectorDocument {
        let name = data.get_string("name");
        let group = data.get_string("access_tier_group");
        let mut access_tiers = data.get_string_set("access_tiers");
        if access_tiers.is_empty() && group.is_empty() {
            access_tiers = vec!["*".to_string()];
        }

        ConnectorDocument {
            api_version: API_VERSION.to_string(),
            kind: CONNECTOR_KIND.to_string(),
            connector_type: "attribute-based".to_string(),
            metadata: ConnectorMetadata {
                display_name: name.clone(),
                name,
                description: data.get_string("description"),
            },
            spec: ConnectorSpec {
                api_key_id: data.get_string("api_key_id"),
                keepalive: data.get_int("keepalive").unwrap_or(20),
                cidrs: data.get_string_set("cidrs"),
                domains: data.get_string_set("domains"),
                peer_access_tiers: vec![ConnectorPeer {
                    cluster: data.get_string("cluster"),
                    access_tiers,
                    access_tier_group: group,
                }],
                disable_snat: data.get_bool_or("disable_snat", false),
                dns_search_domains: data.get_string_set("dns_search_domains"),
            },
        }
    }

    fn flatten(info: &ConnectorInfo, data: &mut ResourceData) {
        let doc = &info.spec;
        data.set("name", doc.metadata.name.clone());
        data.set("description", doc.metadata.description.clone());
        data.set("api_key_id", doc.spec.api_key_id.clone());
        data.set("keepalive", doc.spec.keepalive);
        data.set("cidrs", Value::string_set(doc.spec.cidrs.clone()));
        data.set("domains", Value::string_set(doc.spec.domains.clone()));
        data.set("dns_search_domains", Value::string_set(doc.spec.dns_search_domains.clone()));
        data.set("disable_snat", doc.spec.disable_snat);
        data.set("status", info.status.clone());

        let peer = doc.spec.peer_access_tiers.first().cloned().unwrap_or_default();
        data.set("cluster", peer.cluster);
        data.set("access_tiers", Value::string_set(peer.access_tiers));
        data.set("access_tier_group", peer.access_tier_group);
    }

    async fn write(&self, client: &Client, data: &mut ResourceData, existing: Option<String>) -> ProviderResult<()> {
        prepare(&self.schema(), data)?;
        check_exclusive(TYPE_NAME, data, "access_tiers", "access_tier_group")?;
        set_access_tier_cluster(client, TYPE_NAME, data).await?;

        let doc = Self::expand(data);
        let info = match &existing {
            Some(id) => client.connector.update(id, &doc).await,
            None => client.connector.create(&doc).await,
        }
        .map_err(|e| api_error(TYPE_NAME, "write connector", e))?;
        data.set_id(info.id.clone());
        self.read(client, data).await
    }
}

#[async_trait]
impl ResourceAdapter<Client> for ConnectorResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description("Dial-out connector registering with access tiers")
            .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
            .attribute(AttributeSchema::new("description", AttributeType::String))
            .attribute(AttributeSchema::new("api_key_id", AttributeType::String).required())
            .attribute(
                AttributeSchema::new("cluster", AttributeType::String)
                    .optional_computed()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("access_tiers", access_tier_set())
                    .optional_computed()
                    .conflicts_with(&["access_tier_group"])
                    .with_description("Access tiers the connector peers with; every tier when unset"),
            )
            .attribute(
                AttributeSchema::new("access_tier_group", AttributeType::String).conflicts_with(&["access_tiers"]),
            )
            .attribute(AttributeSchema::new("cidrs", cidr_set()))
            .attribute(AttributeSchema::new("domains", domain_set()))
            .attribute(AttributeSchema::new("dns_search_domains", AttributeType::string_set()))
            .attribute(AttributeSchema::new("keepalive", AttributeType::Int).with_default(20i64))
            .attribute(AttributeSchema::new("disable_snat", AttributeType::Bool).with_default(false))
            .attribute(AttributeSchema::new("status", AttributeType::String).computed())
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.write(client, data, None).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.connector.get(&id).await {
            Ok(info) => {
                Self::flatten(&info, data);
                Ok(())
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
        let id_ref = id.as_str();
        retry(DELETE_TIMEOUT, Backoff::Fixed(DELETE_INTERVAL), move || async move {
            match client.connector.delete(id_ref).await {
                Ok(()) => Ok(()),
                Err(err) if err.is_not_found() => {
                    log::debug!("{} {} already gone", TYPE_NAME, id_ref);
                    Ok(())
                }
                Err(err) => {
                    log::warn!("{} {}: delete failed, retrying: {}", TYPE_NAME, id_ref, err);
                    Err(RetryError::Retryable(err))
                }
            }
        })
        .await
        .map_err(|e| api_error(TYPE_NAME, "delete connector", e))?;

        log::info!("deleted {} {}", TYPE_NAME, id);
        data.clear_id();
        Ok(())
    }
}
