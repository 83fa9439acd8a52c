//! Service tunnels
//!
//! A tunnel is written first and its policy attached afterwards; on delete
//! the policy is detached before the tunnel goes. A failed attach leaves the
//! tunnel in state so the next apply retries it.

mod peers;

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::service_tunnel::{
    API_VERSION, NameResolution, TUNNEL_KIND, TUNNEL_TYPE, TunnelInfo, TunnelMetadata, TunnelPolicy,
    TunnelRequest, TunnelSpec, TunnelTags,
};
use banyan_core::provider::{ProviderResult, ResourceAdapter};
use banyan_core::resource::{BlockExt, ResourceData, Value};
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::{api_error, block, handle_not_found, prepare, require_id};
use crate::resources::access_tier::set_access_tier_cluster;
use crate::validators::{access_tier_set, cidr_set};

const TYPE_NAME: &str = "banyan_service_tunnel";

const LEGACY_NOTICE: &str = "use peer_access_tiers instead";

fn include_exclude() -> AttributeType {
    AttributeType::block(vec![
        AttributeSchema::new("include", AttributeType::string_set()),
        AttributeSchema::new("exclude", AttributeType::string_set()),
    ])
}

fn legacy(name: &str, attr_type: AttributeType) -> AttributeSchema {
    AttributeSchema::new(name, attr_type)
        .optional_computed()
        .deprecated(LEGACY_NOTICE)
}

fn expand(data: &ResourceData) -> TunnelRequest {
    let name_resolution = data.get_block("name_resolution").map(|b| NameResolution {
        name_servers: b.string_set("name_servers"),
        dns_search_domains: b.string_set("dns_search_domains"),
    });
    TunnelRequest {
        kind: TUNNEL_KIND.to_string(),
        api_version: API_VERSION.to_string(),
        tunnel_type: TUNNEL_TYPE.to_string(),
        metadata: TunnelMetadata {
            name: data.get_string("name"),
            friendly_name: data.get_string("friendly_name"),
            description: data.get_string("description"),
            tags: TunnelTags {
                icon: data.get_string("icon"),
                description_link: data.get_string("description_link"),
            },
            autorun: data.get_bool_or("autorun", false),
            lock_autorun: data.get_bool_or("lock_autorun", false),
        },
        spec: TunnelSpec {
            peer_access_tiers: peers::expand(data),
            name_resolution,
        },
    }
}

fn flatten(info: &TunnelInfo, data: &mut ResourceData) {
    let request = &info.spec;
    data.set("name", request.metadata.name.clone());
    data.set("friendly_name", request.metadata.friendly_name.clone());
    data.set("description", request.metadata.description.clone());
    data.set("icon", request.metadata.tags.icon.clone());
    data.set("description_link", request.metadata.tags.description_link.clone());
    data.set("autorun", request.metadata.autorun);
    data.set("lock_autorun", request.metadata.lock_autorun);
    if let Some(cluster) = request.spec.peer_access_tiers.first().map(|p| p.cluster.clone()) {
        data.set("cluster", cluster);
    }
    peers::flatten(&request.spec.peer_access_tiers, data);

    match &request.spec.name_resolution {
        Some(resolution) => data.set(
            "name_resolution",
            Value::block(block([
                ("name_servers", Value::string_set(resolution.name_servers.clone())),
                ("dns_search_domains", Value::string_set(resolution.dns_search_domains.clone())),
            ])),
        ),
        None => {
            data.remove("name_resolution");
        }
    }
}

pub struct ServiceTunnelResource;

impl ServiceTunnelResource {
    async fn write(&self, client: &Client, data: &mut ResourceData, existing: Option<String>) -> ProviderResult<()> {
        if peers::strip_mirrored(data) {
            log::debug!("{}: flat peer fields are a read-back copy, sending peer_access_tiers only", TYPE_NAME);
        }
        prepare(&self.schema(), data)?;
        set_access_tier_cluster(client, TYPE_NAME, data).await?;

        let request = expand(data);
        let info = match &existing {
            Some(id) => client.service_tunnel.update(id, &request).await,
            None => client.service_tunnel.create(&request).await,
        }
        .map_err(|e| api_error(TYPE_NAME, "write service tunnel", e))?;
        log::info!("wrote {} {} ({})", TYPE_NAME, info.name, info.id);
        data.set_id(info.id.clone());

        self.attach_policy(client, &info.id, data).await?;
        self.read(client, data).await
    }

    /// Make the tunnel carry exactly the configured policy
    async fn attach_policy(&self, client: &Client, id: &str, data: &ResourceData) -> ProviderResult<()> {
        let wanted = TunnelPolicy {
            policy_id: data.get_string("policy"),
            policy_enforcing: data.get_bool_or("policy_enforcing", true),
        };
        let current = match client.service_tunnel.get_policy(id).await {
            Ok(policy) => Some(policy),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(api_error(TYPE_NAME, "read tunnel policy", err)),
        };
        if current.as_ref() == Some(&wanted) {
            return Ok(());
        }
        if let Some(current) = current.filter(|c| c.policy_id != wanted.policy_id) {
            client
                .service_tunnel
                .detach_policy(id, &current.policy_id)
                .await
                .map_err(|e| api_error(TYPE_NAME, "detach policy", e))?;
        }
        client
            .service_tunnel
            .attach_policy(id, &wanted)
            .await
            .map_err(|e| api_error(TYPE_NAME, "attach policy", e))?;
        log::info!("attached policy {} to {} {}", wanted.policy_id, TYPE_NAME, id);
        Ok(())
    }
}

#[async_trait]
impl ResourceAdapter<Client> for ServiceTunnelResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        let peer = AttributeType::block(vec![
            AttributeSchema::new("access_tiers", access_tier_set()),
            AttributeSchema::new("access_tier_group", AttributeType::String),
            AttributeSchema::new("connectors", AttributeType::string_set()),
            AttributeSchema::new("public_cidrs", include_exclude()).max_items(1),
            AttributeSchema::new("public_domains", include_exclude()).max_items(1),
            AttributeSchema::new("applications", include_exclude()).max_items(1),
        ]);

        ResourceSchema::new(TYPE_NAME)
            .with_description("Network-level tunnel into private networks")
            .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
            .attribute(AttributeSchema::new("description", AttributeType::String))
            .attribute(AttributeSchema::new("friendly_name", AttributeType::String))
            .attribute(AttributeSchema::new("autorun", AttributeType::Bool).with_default(false))
            .attribute(AttributeSchema::new("lock_autorun", AttributeType::Bool).with_default(false))
            .attribute(
                AttributeSchema::new("cluster", AttributeType::String)
                    .optional_computed()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("policy", AttributeType::String)
                    .required()
                    .with_description("Id of the tunnel policy attached to the tunnel"),
            )
            .attribute(AttributeSchema::new("policy_enforcing", AttributeType::Bool).with_default(true))
            .attribute(AttributeSchema::new("icon", AttributeType::String))
            .attribute(AttributeSchema::new("description_link", AttributeType::String))
            .attribute(AttributeSchema::new("peer_access_tiers", peer))
            .attribute(
                AttributeSchema::new(
                    "name_resolution",
                    AttributeType::block(vec![
                        AttributeSchema::new("name_servers", AttributeType::string_set()),
                        AttributeSchema::new("dns_search_domains", AttributeType::string_set()),
                    ]),
                )
                .max_items(1),
            )
            .attribute(legacy("access_tiers", access_tier_set()))
            .attribute(legacy("connectors", AttributeType::string_set()))
            .attribute(legacy("access_tier_group", AttributeType::String))
            .attribute(legacy("public_cidrs_include", cidr_set()))
            .attribute(legacy("public_cidrs_exclude", cidr_set()))
            .attribute(legacy("public_domains_include", AttributeType::string_set()))
            .attribute(legacy("public_domains_exclude", AttributeType::string_set()))
            .attribute(legacy("applications_include", AttributeType::string_set()))
            .attribute(legacy("applications_exclude", AttributeType::string_set()))
            .attribute(legacy("public_traffic_tunnel_via_access_tier", AttributeType::String))
            .attribute(AttributeSchema::new(peers::MIRROR_MARKER, AttributeType::String).computed())
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.write(client, data, None).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        let info = match client.service_tunnel.get(&id).await {
            Ok(info) => info,
            Err(err) => return handle_not_found(TYPE_NAME, data, err),
        };
        flatten(&info, data);

        match client.service_tunnel.get_policy(&id).await {
            Ok(policy) => {
                data.set("policy", policy.policy_id);
                data.set("policy_enforcing", policy.policy_enforcing);
            }
            Err(err) if err.is_not_found() => {
                data.remove("policy");
            }
            Err(err) => return Err(api_error(TYPE_NAME, "read tunnel policy", err)),
        }
        Ok(())
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        self.write(client, data, Some(id)).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.service_tunnel.get_policy(&id).await {
            Ok(policy) => client
                .service_tunnel
                .detach_policy(&id, &policy.policy_id)
                .await
                .map_err(|e| api_error(TYPE_NAME, "detach policy", e))?,
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(api_error(TYPE_NAME, "read tunnel policy", err)),
        }

        match client.service_tunnel.delete(&id).await {
            Ok(()) => log::info!("deleted {} {}", TYPE_NAME, id),
            Err(err) if err.is_not_found() => log::debug!("{} {} already gone", TYPE_NAME, id),
            Err(err) => return Err(api_error(TYPE_NAME, "delete service tunnel", err)),
        }
        data.clear_id();
        Ok(())
    }
}
