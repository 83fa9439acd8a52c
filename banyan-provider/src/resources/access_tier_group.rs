//! Access tier groups
//!
//! Membership is driven by `attach_access_tier_ids` and
//! `detach_access_tier_ids`, applied after the group itself is written.

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::access_tier::TunnelInfo;
use banyan_client::access_tier_group::{AccessTierGroupInfo, AccessTierGroupPost, AccessTierList};
use banyan_core::provider::{ProviderResult, ResourceAdapter};
use banyan_core::resource::{ResourceData, Value};
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::{api_error, handle_not_found, prepare, require_id};
use crate::resources::access_tier::set_access_tier_cluster;
use crate::validators::{cidr_set, domain_set, port};

const TYPE_NAME: &str = "banyan_accesstier_group";

pub struct AccessTierGroupResource;

impl AccessTierGroupResource {
    fn expand(data: &ResourceData) -> AccessTierGroupPost {
        let tunnel_enduser = data.get_int("udp_port_number").map(|udp_port_number| TunnelInfo {
            udp_port_number,
            dns_enabled: data.get_bool_or("dns_enabled", true),
            cidrs: data.get_string_set("cidrs"),
            domains: data.get_string_set("domains"),
            dns_search_domains: data.get_string("dns_search_domains"),
            keepalive: data.get_int("keepalive").unwrap_or(20),
            shared_fqdn: data.get_string("shared_fqdn"),
        });
        AccessTierGroupPost {
            name: data.get_string("name"),
            description: data.get_string("description"),
            cluster_name: data.get_string("cluster"),
            tunnel_enduser,
            advanced_settings: String::new(),
        }
    }

    fn flatten(group: &AccessTierGroupInfo, data: &mut ResourceData) {
        data.set("name", group.name.clone());
        data.set("description", group.description.clone());
        data.set("cluster", group.cluster_name.clone());
        data.set("access_tier_ids", Value::string_set(group.access_tier_ids.clone()));
        if let Some(tunnel) = &group.tunnel_enduser {
            data.set("udp_port_number", tunnel.udp_port_number);
            data.set("dns_enabled", tunnel.dns_enabled);
            data.set("cidrs", Value::string_set(tunnel.cidrs.clone()));
            data.set("domains", Value::string_set(tunnel.domains.clone()));
            data.set("dns_search_domains", tunnel.dns_search_domains.clone());
            data.set("keepalive", tunnel.keepalive);
            data.set("shared_fqdn", tunnel.shared_fqdn.clone());
        } else {
            data.remove("udp_port_number");
        }
    }

    async fn write(&self, client: &Client, data: &mut ResourceData, existing: Option<String>) -> ProviderResult<()> {
        prepare(&self.schema(), data)?;
        set_access_tier_cluster(client, TYPE_NAME, data).await?;

        let group = Self::expand(data);
        let info = match &existing {
            Some(id) => client.access_tier_group.update(id, &group).await,
            None => client.access_tier_group.create(&group).await,
        }
        .map_err(|e| api_error(TYPE_NAME, "write access tier group", e))?;
        data.set_id(info.id.clone());

        let attach = data.get_string_set("attach_access_tier_ids");
        if !attach.is_empty() {
            client
                .access_tier_group
                .attach_access_tiers(&info.id, &AccessTierList { access_tier_ids: attach })
                .await
                .map_err(|e| api_error(TYPE_NAME, "attach access tiers", e))?;
        }
        let detach = data.get_string_set("detach_access_tier_ids");
        if !detach.is_empty() {
            client
                .access_tier_group
                .detach_access_tiers(&info.id, &AccessTierList { access_tier_ids: detach })
                .await
                .map_err(|e| api_error(TYPE_NAME, "detach access tiers", e))?;
        }

        self.read(client, data).await
    }
}

#[async_trait]
impl ResourceAdapter<Client> for AccessTierGroupResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description("Group of access tiers sharing tunnel settings")
            .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
            .attribute(AttributeSchema::new("description", AttributeType::String))
            .attribute(
                AttributeSchema::new("cluster", AttributeType::String)
                    .optional_computed()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("udp_port_number", port()))
            .attribute(AttributeSchema::new("dns_enabled", AttributeType::Bool).with_default(true))
            .attribute(AttributeSchema::new("cidrs", cidr_set()))
            .attribute(AttributeSchema::new("domains", domain_set()))
            .attribute(AttributeSchema::new("dns_search_domains", AttributeType::String))
            .attribute(AttributeSchema::new("keepalive", AttributeType::Int).with_default(20i64))
            .attribute(
                AttributeSchema::new("shared_fqdn", AttributeType::String)
                    .with_description("FQDN shared by every tier in the group"),
            )
            .attribute(AttributeSchema::new("attach_access_tier_ids", AttributeType::string_set()))
            .attribute(AttributeSchema::new("detach_access_tier_ids", AttributeType::string_set()))
            .attribute(AttributeSchema::new("access_tier_ids", AttributeType::string_set()).computed())
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.write(client, data, None).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.access_tier_group.get(&id).await {
            Ok(group) => {
                Self::flatten(&group, data);
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
        match client.access_tier_group.delete(&id).await {
            Ok(()) => log::info!("deleted {} {}", TYPE_NAME, id),
            Err(err) if err.is_not_found() => log::debug!("{} {} already gone", TYPE_NAME, id),
            Err(err) => return Err(api_error(TYPE_NAME, "delete access tier group", err)),
        }
        data.clear_id();
        Ok(())
    }
}
