//! Access tiers
//!
//! A tier is written with two calls: the tier object, then its local config.
//! Both go out on every create and update.

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::access_tier::{
    AccessTierInfo, AccessTierPost, Debugging, Events, HostedWebServices, LocalConfig, Logging, TunnelInfo,
};
use banyan_core::provider::{ProviderError, ProviderResult, ResourceAdapter};
use banyan_core::resource::{ResourceData, Value};
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::{api_error, handle_not_found, prepare, require_id};
use crate::validators::{cidr_set, domain_set, port};

const TYPE_NAME: &str = "banyan_accesstier";
const LOG_LEVELS: &[&str] = &["ERR", "WARN", "INFO", "DEBUG"];

/// Fill `cluster` with the tenant's first cluster when the user left it out
pub(crate) async fn set_access_tier_cluster(
    client: &Client,
    resource_type: &str,
    data: &mut ResourceData,
) -> ProviderResult<()> {
    if data.contains("cluster") {
        return Ok(());
    }
    let clusters = client
        .cluster
        .list()
        .await
        .map_err(|e| api_error(resource_type, "list clusters", e))?;
    let first = clusters
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::new("no clusters available in this tenant").for_resource(resource_type))?;
    log::debug!("{}: using cluster {}", resource_type, first);
    data.set("cluster", first);
    Ok(())
}

pub struct AccessTierResource;

impl AccessTierResource {
    fn expand_tier(data: &ResourceData) -> AccessTierPost {
        let keepalive = data.get_int("keepalive").unwrap_or(20);
        let tunnel_satellite = data.get_int("tunnel_connector_port").map(|udp_port_number| TunnelInfo {
            udp_port_number,
            keepalive,
            ..Default::default()
        });
        let tunnel_enduser = data.get_int("tunnel_enduser_port").map(|udp_port_number| TunnelInfo {
            udp_port_number,
            keepalive,
            dns_enabled: data.get_bool_or("tunnel_enduser_dns_enabled", true),
            cidrs: data.get_string_set("tunnel_cidrs"),
            domains: data.get_string_set("tunnel_private_domains"),
            dns_search_domains: data.get_string("tunnel_enduser_dns_search_domains"),
            shared_fqdn: String::new(),
        });

        AccessTierPost {
            name: data.get_string("name"),
            address: data.get_string("address"),
            domains: data.get_string_set("domains"),
            tunnel_enduser,
            tunnel_satellite,
            cluster_name: data.get_string("cluster"),
            disable_snat: data.get_bool_or("disable_snat", false),
            src_nat_cidr_range: data.get_string("src_nat_cidr_range"),
            api_key_id: data.get_string("api_key_id"),
            description: data.get_string("description"),
        }
    }

    fn expand_local_config(data: &ResourceData) -> LocalConfig {
        let statsd_address = data.get_string("statsd_address");
        LocalConfig {
            logging: Logging {
                console_log_level: data.get_string("console_log_level"),
                file_log_level: data.get_string("file_log_level"),
                file_log: data.get_bool_or("file_log", true),
                log_num: data.get_int("log_num").unwrap_or(10),
                log_size: data.get_int("log_size").unwrap_or(50),
                statsd: !statsd_address.is_empty(),
                statsd_address,
            },
            events: Events {
                access_event_credits_limiting: data.get_bool_or("events_rate_limiting", false),
                access_event_key_limiting: data.get_bool_or("event_key_rate_limiting", false),
                ..Default::default()
            },
            hosted_web_services: HostedWebServices {
                forward_trust_cookie: data.get_bool_or("forward_trust_cookie", false),
                enable_hsts: data.get_bool_or("enable_hsts", false),
                enable_http_backend_log: data.get_bool_or("http_backend_log", false),
            },
            debugging: Debugging {
                enable_dev_mode: false,
                enable_debug_logging: data.get_bool_or("debug_logging", false),
            },
        }
    }

    fn flatten_tier(tier: &AccessTierInfo, data: &mut ResourceData) {
        data.set("name", tier.name.clone());
        data.set("address", tier.address.clone());
        data.set("description", tier.description.clone());
        data.set("domains", Value::string_set(tier.domains.clone()));
        data.set("cluster", tier.cluster_name.clone());
        data.set("disable_snat", tier.disable_snat);
        data.set("src_nat_cidr_range", tier.src_nat_cidr_range.clone());
        data.set("api_key_id", tier.api_key_id.clone());
        data.set("status", tier.status.clone());

        match &tier.tunnel_satellite {
            Some(tunnel) => {
                data.set("tunnel_connector_port", tunnel.udp_port_number);
                data.set("keepalive", tunnel.keepalive);
            }
            None => {
                data.remove("tunnel_connector_port");
            }
        }
        match &tier.tunnel_enduser {
            Some(tunnel) => {
                data.set("tunnel_enduser_port", tunnel.udp_port_number);
                data.set("keepalive", tunnel.keepalive);
                data.set("tunnel_enduser_dns_enabled", tunnel.dns_enabled);
                data.set("tunnel_cidrs", Value::string_set(tunnel.cidrs.clone()));
                data.set("tunnel_private_domains", Value::string_set(tunnel.domains.clone()));
                data.set("tunnel_enduser_dns_search_domains", tunnel.dns_search_domains.clone());
            }
            None => {
                for key in [
                    "tunnel_enduser_port",
                    "tunnel_cidrs",
                    "tunnel_private_domains",
                    "tunnel_enduser_dns_search_domains",
                ] {
                    data.remove(key);
                }
            }
        }
    }

    fn flatten_local_config(config: &LocalConfig, data: &mut ResourceData) {
        let logging = &config.logging;
        data.set("console_log_level", logging.console_log_level.clone());
        data.set("file_log_level", logging.file_log_level.clone());
        data.set("file_log", logging.file_log);
        data.set("log_num", logging.log_num);
        data.set("log_size", logging.log_size);
        data.set("statsd_address", logging.statsd_address.clone());
        data.set("events_rate_limiting", config.events.access_event_credits_limiting);
        data.set("event_key_rate_limiting", config.events.access_event_key_limiting);
        data.set("forward_trust_cookie", config.hosted_web_services.forward_trust_cookie);
        data.set("enable_hsts", config.hosted_web_services.enable_hsts);
        data.set("http_backend_log", config.hosted_web_services.enable_http_backend_log);
        data.set("debug_logging", config.debugging.enable_debug_logging);
    }

    async fn write(&self, client: &Client, data: &mut ResourceData, existing: Option<String>) -> ProviderResult<()> {
        prepare(&self.schema(), data)?;
        set_access_tier_cluster(client, TYPE_NAME, data).await?;

        let tier = Self::expand_tier(data);
        let info = match &existing {
            Some(id) => client.access_tier.update(id, &tier).await,
            None => client.access_tier.create(&tier).await,
        }
        .map_err(|e| api_error(TYPE_NAME, "write access tier", e))?;
        data.set_id(info.id.clone());

        // the tier must exist before its local config can be written
        client
            .access_tier
            .update_local_config(&info.id, &Self::expand_local_config(data))
            .await
            .map_err(|e| api_error(TYPE_NAME, "write access tier local config", e))?;
        log::info!("wrote {} {} ({})", TYPE_NAME, info.name, info.id);

        self.read(client, data).await
    }
}

fn string(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String)
}

fn boolean(name: &str, default: bool) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::Bool).with_default(default)
}

#[async_trait]
impl ResourceAdapter<Client> for AccessTierResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description("Access tier and its local config")
            .attribute(string("name").required().force_new())
            .attribute(string("address").required().with_description("Public address of the tier"))
            .attribute(string("description"))
            .attribute(AttributeSchema::new("domains", domain_set()))
            .attribute(string("cluster").optional_computed().force_new())
            .attribute(string("api_key_id"))
            .attribute(boolean("disable_snat", false))
            .attribute(string("src_nat_cidr_range"))
            .attribute(AttributeSchema::new("tunnel_connector_port", port()))
            .attribute(AttributeSchema::new("tunnel_enduser_port", port()))
            .attribute(AttributeSchema::new("keepalive", AttributeType::Int).with_default(20i64))
            .attribute(boolean("tunnel_enduser_dns_enabled", true))
            .attribute(AttributeSchema::new("tunnel_cidrs", cidr_set()))
            .attribute(AttributeSchema::new("tunnel_private_domains", domain_set()))
            .attribute(string("tunnel_enduser_dns_search_domains"))
            .attribute(
                AttributeSchema::new("console_log_level", AttributeType::enumeration(LOG_LEVELS))
                    .with_default("ERR"),
            )
            .attribute(
                AttributeSchema::new("file_log_level", AttributeType::enumeration(LOG_LEVELS)).with_default("ERR"),
            )
            .attribute(boolean("file_log", true))
            .attribute(AttributeSchema::new("log_num", AttributeType::Int).with_default(10i64))
            .attribute(AttributeSchema::new("log_size", AttributeType::Int).with_default(50i64))
            .attribute(string("statsd_address"))
            .attribute(boolean("events_rate_limiting", false))
            .attribute(boolean("event_key_rate_limiting", false))
            .attribute(boolean("forward_trust_cookie", false))
            .attribute(boolean("enable_hsts", false))
            .attribute(boolean("http_backend_log", false))
            .attribute(boolean("debug_logging", false))
            .attribute(string("status").computed())
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.write(client, data, None).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        let tier = match client.access_tier.get(&id).await {
            Ok(tier) => tier,
            Err(err) => return handle_not_found(TYPE_NAME, data, err),
        };
        Self::flatten_tier(&tier, data);

        let config = client
            .access_tier
            .get_local_config(&id)
            .await
            .map_err(|e| api_error(TYPE_NAME, "read access tier local config", e))?;
        Self::flatten_local_config(&config, data);
        Ok(())
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        self.write(client, data, Some(id)).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.access_tier.delete(&id).await {
            Ok(()) => log::info!("deleted {} {}", TYPE_NAME, id),
            Err(err) if err.is_not_found() => log::debug!("{} {} already gone", TYPE_NAME, id),
            Err(err) => return Err(api_error(TYPE_NAME, "delete access tier", err)),
        }
        data.clear_id();
        Ok(())
    }
}
