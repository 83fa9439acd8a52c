//! Attribute bag to service document

use std::collections::HashMap;

use banyan_client::service::{
    API_VERSION, AllowPattern, Backend, CertSettings, CustomTlsCert, CustomTrustCookie, ExemptedPaths,
    FrontendAddress, Host, HttpSettings, OidcSettings, Pattern, PatternPorts, PortRange, SERVICE_KIND,
    SITE_NAME_SELECTOR, ServiceAttributes, ServiceDocument, ServiceMetadata, ServiceSpec, ServiceTags, Target,
};
use banyan_core::provider::{ProviderError, ProviderResult};
use banyan_core::resource::{BlockExt, ResourceData, Value};

use super::ServiceKind;

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn invalid(kind: ServiceKind, message: impl Into<String>) -> ProviderError {
    ProviderError::new(message).for_resource(kind.type_name())
}

fn http_connect(kind: ServiceKind, data: &ResourceData) -> bool {
    kind == ServiceKind::K8s || data.get_bool_or("http_connect", false)
}

/// Checks that span several attributes
pub fn check(kind: ServiceKind, data: &ResourceData) -> ProviderResult<()> {
    crate::helpers::check_exclusive(kind.type_name(), data, "access_tier", "connector")?;
    if !data.contains("access_tier") && !data.contains("connector") {
        return Err(invalid(kind, "one of access_tier or connector must be set"));
    }

    if kind == ServiceKind::K8s && data.get_bool("http_connect") == Some(false) {
        return Err(invalid(kind, "http_connect cannot be disabled for kubernetes services"));
    }

    let http_connect = http_connect(kind, data);
    if !http_connect {
        for required in ["backend_domain", "backend_port"] {
            if !data.contains(required) {
                return Err(invalid(kind, format!("{} is required unless http_connect is set", required)));
            }
        }
        if data.contains("allow_patterns") {
            return Err(invalid(kind, "allow_patterns requires http_connect"));
        }
    }

    for pattern in data.get_blocks("allow_patterns") {
        for ports in pattern.nested("ports") {
            for range in ports.nested("port_range") {
                if range.int("min") > range.int("max") {
                    return Err(invalid(
                        kind,
                        format!(
                            "invalid port_range {}-{}: min is greater than max",
                            range.int("min").unwrap_or_default(),
                            range.int("max").unwrap_or_default()
                        ),
                    ));
                }
            }
        }
    }
    Ok(())
}

pub fn expand(kind: ServiceKind, data: &ResourceData) -> ProviderResult<ServiceDocument> {
    let domain = data.get_string("domain");
    let port = data.get_int("port").unwrap_or(kind.default_port());
    let http_connect = http_connect(kind, data);

    let connector = data.get_string("connector");
    let site = if connector.is_empty() {
        data.get_string("access_tier")
    } else {
        "*".to_string()
    };

    Ok(ServiceDocument {
        kind: SERVICE_KIND.to_string(),
        api_version: API_VERSION.to_string(),
        service_type: "origin".to_string(),
        metadata: ServiceMetadata {
            name: data.get_string("name"),
            description: data.get_string("description"),
            cluster: data.get_string("cluster"),
            tags: expand_tags(kind, data, &domain, port, http_connect),
        },
        spec: ServiceSpec {
            attributes: ServiceAttributes {
                tls_sni: vec![domain.clone()],
                frontend_addresses: vec![FrontendAddress {
                    cidr: String::new(),
                    port: port.to_string(),
                }],
                host_tag_selector: vec![HashMap::from([(SITE_NAME_SELECTOR.to_string(), site)])],
                disable_private_dns: data.get_bool_or("disable_private_dns", false),
            },
            backend: expand_backend(kind, data, &domain, connector, http_connect),
            cert_settings: expand_cert_settings(data, &domain),
            http_settings: if kind.is_web() {
                expand_http_settings(data, &domain)
            } else {
                HttpSettings::default()
            },
            client_cidrs: Vec::new(),
        },
    })
}

fn expand_tags(kind: ServiceKind, data: &ResourceData, domain: &str, port: i64, http_connect: bool) -> ServiceTags {
    let mut tags = ServiceTags {
        template: Some(kind.template().to_string()),
        user_facing: Some(data.get_bool_or("available_in_app", true).to_string()),
        protocol: Some(kind.protocol().to_string()),
        domain: Some(domain.to_string()),
        port: Some(port.to_string()),
        icon: non_empty(data.get_string("icon")),
        service_app_type: Some(kind.app_type().to_string()),
        description_link: non_empty(data.get_string("description_link")),
        banyanproxy_mode: kind.banyanproxy_mode(http_connect).map(str::to_string),
        ..Default::default()
    };
    if kind.is_web() {
        return tags;
    }

    tags.app_listen_port = data
        .get_int("client_banyanproxy_listen_port")
        .map(|p| p.to_string());
    tags.allow_user_override = Some(data.get_bool_or("allow_user_override", true));
    if kind.takes_include_domains() {
        let include = data.get_string_set("include_domains");
        tags.include_domains = (!include.is_empty()).then_some(include);
    }

    match kind {
        ServiceKind::Ssh => {
            tags.ssh_service_type = Some(
                data.get_str("ssh_service_type")
                    .filter(|s| !s.is_empty())
                    .unwrap_or("TRUSTCERT")
                    .to_string(),
            );
            tags.write_ssh_config = Some(data.get_bool_or("write_ssh_config", true));
            tags.ssh_chain_mode = Some(data.get_bool_or("ssh_chain_mode", false));
            tags.ssh_host_directive = non_empty(data.get_string("ssh_host_directive"));
        }
        ServiceKind::K8s => {
            tags.kube_cluster_name = non_empty(data.get_string("client_kube_cluster_name"));
            tags.kube_ca_key = non_empty(data.get_string("client_kube_ca_key"));
        }
        _ => {}
    }
    tags
}

fn expand_backend(
    kind: ServiceKind,
    data: &ResourceData,
    domain: &str,
    connector_name: String,
    http_connect: bool,
) -> Backend {
    let mut target = Target {
        tls: data.get_bool_or("backend_tls", false),
        tls_insecure: data.get_bool_or("backend_tls_insecure", false),
        client_certificate: data.get_bool_or("client_certificate", false),
        ..Default::default()
    };
    if !http_connect {
        target.name = data.get_string("backend_domain");
        target.port = data
            .get_int("backend_port")
            .map(|p| p.to_string())
            .unwrap_or_default();
    }

    let mut backend = Backend {
        target,
        connector_name,
        http_connect,
        ..Default::default()
    };

    if kind == ServiceKind::K8s {
        let resolved = non_empty(data.get_string("backend_dns_override_for_domain")).unwrap_or_else(|| domain.to_string());
        backend.dns_overrides = HashMap::from([(domain.to_string(), resolved)]);
        backend.allow_patterns = vec![AllowPattern {
            hostnames: vec![domain.to_string()],
            ..Default::default()
        }];
    } else if kind.takes_allow_patterns() && http_connect {
        backend.allow_patterns = data
            .get_blocks("allow_patterns")
            .into_iter()
            .map(expand_allow_pattern)
            .collect();
    }
    backend
}

fn expand_allow_pattern(block: &HashMap<String, Value>) -> AllowPattern {
    AllowPattern {
        cidrs: block.string_set("cidrs"),
        hostnames: block.string_set("hostnames"),
        ports: block.nested("ports").first().map(|ports| PatternPorts {
            port_list: ports.int_set("port_list"),
            port_range: ports
                .nested("port_range")
                .into_iter()
                .map(|range| PortRange {
                    min: range.int("min").unwrap_or_default(),
                    max: range.int("max").unwrap_or_default(),
                })
                .collect(),
        }),
    }
}

fn expand_cert_settings(data: &ResourceData, domain: &str) -> CertSettings {
    let custom_tls_cert = data
        .get_block("custom_tls_cert")
        .map(|cert| CustomTlsCert {
            enabled: true,
            cert_file: cert.string("cert_file"),
            key_file: cert.string("key_file"),
        })
        .unwrap_or_default();
    CertSettings {
        dns_names: vec![domain.to_string()],
        custom_tls_cert,
        letsencrypt: data.get_bool_or("letsencrypt", false),
    }
}

fn expand_http_settings(data: &ResourceData, domain: &str) -> HttpSettings {
    let patterns: Vec<Pattern> = data
        .get_blocks("exemptions")
        .into_iter()
        .map(|exemption| {
            let origin_header = exemption.string_set("origin_header");
            let target = exemption.string_set("hosts");
            let hosts = if origin_header.is_empty() && target.is_empty() {
                Vec::new()
            } else {
                vec![Host { origin_header, target }]
            };
            Pattern {
                source_cidrs: exemption.string_set("source_cidrs"),
                hosts,
                methods: exemption.string_set("methods"),
                paths: exemption.string_set("paths"),
                mandatory_headers: exemption.string_set("mandatory_headers"),
            }
        })
        .collect();

    HttpSettings {
        enabled: true,
        oidc_settings: OidcSettings {
            enabled: true,
            service_domain_name: format!("https://{}", domain),
            post_auth_redirect_path: data.get_string("post_auth_redirect_path"),
            api_path: data.get_string("api_path"),
            suppress_device_trust_verification: data.get_bool_or("suppress_device_trust_verification", false),
        },
        exempted_paths: ExemptedPaths {
            enabled: !patterns.is_empty(),
            paths: Vec::new(),
            patterns,
        },
        headers: HashMap::new(),
        custom_trust_cookie: data.get_block("custom_trust_cookie").map(|cookie| CustomTrustCookie {
            same_site_policy: cookie.string("same_site_policy"),
            trust_cookie_path: cookie.string("trust_cookie_path"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::{block, blocks_value};

    #[test]
    fn basic_web_service() {
        let data = ResourceData::new()
            .with_attribute("name", "w")
            .with_attribute("domain", "w.corp.com")
            .with_attribute("access_tier", "us-west1")
            .with_attribute("backend_domain", "w.internal")
            .with_attribute("backend_port", 8443i64)
            .with_attribute("port", 443i64);
        check(ServiceKind::Web, &data).unwrap();
        let doc = expand(ServiceKind::Web, &data).unwrap();

        let tags = &doc.metadata.tags;
        assert_eq!(tags.template.as_deref(), Some("WEB_USER"));
        assert_eq!(tags.service_app_type.as_deref(), Some("WEB"));
        assert_eq!(tags.protocol.as_deref(), Some("https"));
        assert_eq!(tags.port.as_deref(), Some("443"));
        assert_eq!(tags.user_facing.as_deref(), Some("true"));
        assert_eq!(tags.banyanproxy_mode, None);

        let target = &doc.spec.backend.target;
        assert_eq!(target.name, "w.internal");
        assert_eq!(target.port, "8443");
        assert!(!target.tls);

        assert!(doc.spec.http_settings.enabled);
        assert_eq!(doc.spec.http_settings.oidc_settings.service_domain_name, "https://w.corp.com");
        assert_eq!(doc.spec.attributes.tls_sni, vec!["w.corp.com"]);
        assert_eq!(doc.spec.attributes.frontend_addresses[0].port, "443");
        assert_eq!(doc.spec.attributes.host_tag_selector[0][SITE_NAME_SELECTOR], "us-west1");
        assert_eq!(doc.spec.cert_settings.dns_names, vec!["w.corp.com"]);
        assert!(doc.spec.client_cidrs.is_empty());
        assert_eq!(doc.service_type, "origin");
    }

    #[test]
    fn kubernetes_service() {
        let data = ResourceData::new()
            .with_attribute("name", "k")
            .with_attribute("domain", "k.corp.com")
            .with_attribute("access_tier", "us-west1")
            .with_attribute("http_connect", true);
        check(ServiceKind::K8s, &data).unwrap();
        let doc = expand(ServiceKind::K8s, &data).unwrap();

        let backend = &doc.spec.backend;
        assert_eq!(backend.target.name, "");
        assert_eq!(backend.target.port, "");
        assert!(backend.http_connect);
        assert_eq!(doc.metadata.tags.banyanproxy_mode.as_deref(), Some("CHAIN"));
        assert_eq!(backend.allow_patterns[0].hostnames, vec!["k.corp.com"]);
        assert!(backend.dns_overrides.contains_key("k.corp.com"));
        assert!(!doc.spec.http_settings.enabled);
    }

    #[test]
    fn kubernetes_dns_override() {
        let data = ResourceData::new()
            .with_attribute("name", "k")
            .with_attribute("domain", "k.corp.com")
            .with_attribute("access_tier", "us-west1")
            .with_attribute("backend_dns_override_for_domain", "10.0.0.10");
        let doc = expand(ServiceKind::K8s, &data).unwrap();
        assert_eq!(doc.spec.backend.dns_overrides["k.corp.com"], "10.0.0.10");
        assert!(doc.spec.backend.http_connect);

        let disabled = data.with_attribute("http_connect", false);
        assert!(check(ServiceKind::K8s, &disabled).is_err());
    }

    #[test]
    fn rdp_http_connect_with_allow_patterns() {
        let ports = block([
            ("port_list", Value::List(vec![Value::Int(3389)])),
            (
                "port_range",
                blocks_value([block([("min", Value::Int(5000)), ("max", Value::Int(5010))])]),
            ),
        ]);
        let pattern = block([
            ("cidrs", Value::string_set(["10.1.0.0/16"])),
            ("ports", blocks_value([ports])),
        ]);
        let data = ResourceData::new()
            .with_attribute("name", "r")
            .with_attribute("domain", "r.corp.com")
            .with_attribute("access_tier", "us-west1")
            .with_attribute("http_connect", true)
            .with_attribute("allow_patterns", blocks_value([pattern]));
        check(ServiceKind::Rdp, &data).unwrap();
        let doc = expand(ServiceKind::Rdp, &data).unwrap();

        assert_eq!(doc.metadata.tags.banyanproxy_mode.as_deref(), Some("RDPGATEWAY"));
        let pattern = &doc.spec.backend.allow_patterns[0];
        assert_eq!(pattern.cidrs, vec!["10.1.0.0/16"]);
        let ports = pattern.ports.as_ref().unwrap();
        assert_eq!(ports.port_list, vec![3389]);
        assert_eq!(ports.port_range, vec![PortRange { min: 5000, max: 5010 }]);
    }

    #[test]
    fn allow_patterns_need_http_connect() {
        let data = ResourceData::new()
            .with_attribute("name", "t")
            .with_attribute("domain", "t.corp.com")
            .with_attribute("access_tier", "us-west1")
            .with_attribute("backend_domain", "10.0.0.1")
            .with_attribute("backend_port", 22i64)
            .with_attribute(
                "allow_patterns",
                blocks_value([block([("hostnames", Value::string_set(["h.corp.com"]))])]),
            );
        let err = check(ServiceKind::Tcp, &data).unwrap_err();
        assert!(err.to_string().contains("allow_patterns requires http_connect"));
    }

    #[test]
    fn inverted_port_range_is_rejected() {
        let range = blocks_value([block([("min", Value::Int(9000)), ("max", Value::Int(8000))])]);
        let data = ResourceData::new()
            .with_attribute("name", "g")
            .with_attribute("domain", "g.corp.com")
            .with_attribute("connector", "edge")
            .with_attribute("http_connect", true)
            .with_attribute(
                "allow_patterns",
                blocks_value([block([("ports", blocks_value([block([("port_range", range)])]))])]),
            );
        assert!(check(ServiceKind::Generic, &data).is_err());
    }

    #[test]
    fn ssh_tags() {
        let data = ResourceData::new()
            .with_attribute("name", "s")
            .with_attribute("domain", "s.corp.com")
            .with_attribute("access_tier", "us-west1")
            .with_attribute("backend_domain", "10.0.0.2")
            .with_attribute("backend_port", 22i64)
            .with_attribute("ssh_host_directive", "s.corp.com")
            .with_attribute("client_banyanproxy_listen_port", 9119i64);
        let tags = expand(ServiceKind::Ssh, &data).unwrap().metadata.tags;
        assert_eq!(tags.ssh_service_type.as_deref(), Some("TRUSTCERT"));
        assert_eq!(tags.write_ssh_config, Some(true));
        assert_eq!(tags.ssh_host_directive.as_deref(), Some("s.corp.com"));
        assert_eq!(tags.app_listen_port.as_deref(), Some("9119"));
        assert_eq!(tags.banyanproxy_mode.as_deref(), Some("TCP"));
    }

    #[test]
    fn web_exemptions_and_trust_cookie() {
        let data = ResourceData::new()
            .with_attribute("name", "w")
            .with_attribute("domain", "w.corp.com")
            .with_attribute("access_tier", "us-west1")
            .with_attribute(
                "exemptions",
                blocks_value([block([
                    ("source_cidrs", Value::string_set(["10.0.0.0/8"])),
                    ("paths", Value::string_set(["/health"])),
                    ("hosts", Value::string_set(["w.corp.com"])),
                ])]),
            )
            .with_attribute(
                "custom_trust_cookie",
                blocks_value([block([("same_site_policy", Value::from("strict"))])]),
            );
        let settings = expand(ServiceKind::Web, &data).unwrap().spec.http_settings;
        assert!(settings.exempted_paths.enabled);
        let pattern = &settings.exempted_paths.patterns[0];
        assert_eq!(pattern.paths, vec!["/health"]);
        assert_eq!(pattern.hosts[0].target, vec!["w.corp.com"]);
        assert_eq!(
            settings.custom_trust_cookie.unwrap().same_site_policy,
            "strict"
        );
    }
}
