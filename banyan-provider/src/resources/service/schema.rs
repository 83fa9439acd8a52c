use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::ServiceKind;
use crate::validators::{cidr_set, domain, domain_set, port};

fn string(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String)
}

fn boolean(name: &str, default: bool) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::Bool).with_default(default)
}

fn string_set(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::string_set())
}

pub fn schema(kind: ServiceKind) -> ResourceSchema {
    let mut schema = ResourceSchema::new(kind.type_name())
        .with_description(format!("Banyan {} service", kind.app_type()))
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .force_new()
                .with_description("Name of the service"),
        )
        .attribute(string("description"))
        .attribute(string("description_link").with_description("Link shown next to the service in the app"))
        .attribute(
            string("cluster")
                .optional_computed()
                .force_new()
                .with_description("Cluster the service belongs to; defaults to the first cluster"),
        )
        .attribute(
            string("access_tier")
                .conflicts_with(&["connector"])
                .with_description("Access tier the service is exposed through"),
        )
        .attribute(
            string("connector")
                .conflicts_with(&["access_tier"])
                .with_description("Connector the service is reached through"),
        )
        .attribute(
            AttributeSchema::new("domain", domain())
                .required()
                .with_description("Public FQDN clients use to reach the service"),
        )
        .attribute(
            AttributeSchema::new("port", port())
                .with_default(kind.default_port())
                .with_description("Public port clients use to reach the service"),
        )
        .attribute(string("backend_domain").with_description("Backend hostname or IP address"))
        .attribute(AttributeSchema::new("backend_port", port()))
        .attribute(boolean("backend_tls", false))
        .attribute(boolean("backend_tls_insecure", false))
        .attribute(boolean("client_certificate", false))
        .attribute(boolean("available_in_app", true))
        .attribute(string("icon"))
        .attribute(boolean("disable_private_dns", false))
        .attribute(string("policy").with_description("Id of the policy attached to the service"))
        .attribute(boolean("policy_enforcing", true))
        .attribute(boolean("letsencrypt", false))
        .attribute(
            AttributeSchema::new(
                "custom_tls_cert",
                AttributeType::block(vec![
                    string("cert_file").required(),
                    string("key_file").required().sensitive(),
                ]),
            )
            .max_items(1),
        );

    if kind.is_web() {
        schema = schema
            .attribute(string("post_auth_redirect_path"))
            .attribute(string("api_path"))
            .attribute(boolean("suppress_device_trust_verification", false))
            .attribute(AttributeSchema::new(
                "exemptions",
                AttributeType::block(vec![
                    AttributeSchema::new("source_cidrs", cidr_set()),
                    string_set("hosts"),
                    string_set("origin_header"),
                    string_set("methods"),
                    string_set("paths"),
                    string_set("mandatory_headers"),
                ]),
            ))
            .attribute(
                AttributeSchema::new(
                    "custom_trust_cookie",
                    AttributeType::block(vec![
                        AttributeSchema::new("same_site_policy", AttributeType::enumeration(&["lax", "strict", "none"]))
                            .required(),
                        string("trust_cookie_path"),
                    ]),
                )
                .max_items(1),
            );
        return schema;
    }

    schema = schema
        .attribute(
            AttributeSchema::new("client_banyanproxy_listen_port", port())
                .with_description("Local port the client listens on"),
        )
        .attribute(boolean("allow_user_override", true))
        .attribute(
            boolean("http_connect", kind == ServiceKind::K8s)
                .with_description("Let clients pick the backend through HTTP CONNECT"),
        );

    if kind.takes_allow_patterns() {
        schema = schema.attribute(AttributeSchema::new(
            "allow_patterns",
            AttributeType::block(vec![
                AttributeSchema::new("cidrs", cidr_set()),
                AttributeSchema::new("hostnames", domain_set()),
                AttributeSchema::new(
                    "ports",
                    AttributeType::block(vec![
                        AttributeSchema::new("port_list", AttributeType::set(port())),
                        AttributeSchema::new(
                            "port_range",
                            AttributeType::block(vec![
                                AttributeSchema::new("min", port()).required(),
                                AttributeSchema::new("max", port()).required(),
                            ]),
                        ),
                    ]),
                )
                .max_items(1),
            ]),
        ));
    }

    if kind.takes_include_domains() {
        schema = schema.attribute(AttributeSchema::new("include_domains", domain_set()));
    }

    match kind {
        ServiceKind::Ssh => schema
            .attribute(
                AttributeSchema::new(
                    "ssh_service_type",
                    AttributeType::enumeration(&["TRUSTCERT", "SSHCERT", "BOTH"]),
                )
                .with_default("TRUSTCERT"),
            )
            .attribute(boolean("write_ssh_config", true))
            .attribute(boolean("ssh_chain_mode", false))
            .attribute(string("ssh_host_directive")),
        ServiceKind::K8s => schema
            .attribute(string("client_kube_cluster_name"))
            .attribute(string("client_kube_ca_key"))
            .attribute(
                string("backend_dns_override_for_domain")
                    .with_description("Address the service domain resolves to at the access tier"),
            ),
        _ => schema,
    }
}
