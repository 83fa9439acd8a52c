//! Service document to attribute bag

use std::collections::HashMap;

use banyan_client::service::{AllowPattern, Pattern, SITE_NAME_SELECTOR, ServiceInfo};
use banyan_core::resource::{ResourceData, Value};

use super::ServiceKind;
use crate::helpers::{block, blocks_value};

fn parse_port(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|p| p.trim().parse().ok())
}

fn set_or_remove(data: &mut ResourceData, key: &str, value: Option<Value>) {
    match value {
        Some(value) => data.set(key, value),
        None => {
            data.remove(key);
        }
    }
}

pub fn flatten(kind: ServiceKind, info: &ServiceInfo, data: &mut ResourceData) {
    let doc = &info.spec;
    let tags = &doc.metadata.tags;
    let attributes = &doc.spec.attributes;
    let backend = &doc.spec.backend;

    data.set("name", doc.metadata.name.clone());
    data.set("description", doc.metadata.description.clone());
    let cluster = if doc.metadata.cluster.is_empty() {
        &info.cluster
    } else {
        &doc.metadata.cluster
    };
    data.set("cluster", cluster.clone());
    data.set("description_link", tags.description_link.clone().unwrap_or_default());
    data.set("icon", tags.icon.clone().unwrap_or_default());
    data.set(
        "available_in_app",
        tags.user_facing
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("true")),
    );

    let domain = tags
        .domain
        .clone()
        .or_else(|| attributes.tls_sni.first().cloned())
        .unwrap_or_default();
    data.set("domain", domain.clone());
    let port = parse_port(tags.port.as_deref())
        .or_else(|| parse_port(attributes.frontend_addresses.first().map(|f| f.port.as_str())));
    set_or_remove(data, "port", port.map(Value::Int));
    data.set("disable_private_dns", attributes.disable_private_dns);

    if backend.connector_name.is_empty() {
        let site = attributes
            .host_tag_selector
            .first()
            .and_then(|selector| selector.get(SITE_NAME_SELECTOR))
            .cloned()
            .unwrap_or_default();
        data.set("access_tier", site);
        data.remove("connector");
    } else {
        data.set("connector", backend.connector_name.clone());
        data.remove("access_tier");
    }

    let target = &backend.target;
    set_or_remove(
        data,
        "backend_domain",
        (!target.name.is_empty()).then(|| Value::from(target.name.clone())),
    );
    set_or_remove(data, "backend_port", parse_port(Some(target.port.as_str())).map(Value::Int));
    data.set("backend_tls", target.tls);
    data.set("backend_tls_insecure", target.tls_insecure);
    data.set("client_certificate", target.client_certificate);

    let cert = &doc.spec.cert_settings;
    data.set("letsencrypt", cert.letsencrypt);
    let custom_cert = cert.custom_tls_cert.enabled.then(|| {
        block([
            ("cert_file", Value::from(cert.custom_tls_cert.cert_file.clone())),
            ("key_file", Value::from(cert.custom_tls_cert.key_file.clone())),
        ])
    });
    data.set("custom_tls_cert", blocks_value(custom_cert));

    if kind.is_web() {
        flatten_http_settings(info, data);
        return;
    }

    set_or_remove(
        data,
        "client_banyanproxy_listen_port",
        parse_port(tags.app_listen_port.as_deref()).map(Value::Int),
    );
    data.set("allow_user_override", tags.allow_user_override.unwrap_or(true));
    data.set("http_connect", backend.http_connect);

    if kind.takes_allow_patterns() {
        let patterns: Vec<_> = if backend.http_connect {
            backend.allow_patterns.iter().map(flatten_allow_pattern).collect()
        } else {
            Vec::new()
        };
        data.set("allow_patterns", blocks_value(patterns));
    }
    if kind.takes_include_domains() {
        data.set(
            "include_domains",
            Value::string_set(tags.include_domains.clone().unwrap_or_default()),
        );
    }

    match kind {
        ServiceKind::Ssh => {
            data.set(
                "ssh_service_type",
                tags.ssh_service_type.clone().unwrap_or_else(|| "TRUSTCERT".to_string()),
            );
            data.set("write_ssh_config", tags.write_ssh_config.unwrap_or(true));
            data.set("ssh_chain_mode", tags.ssh_chain_mode.unwrap_or(false));
            data.set("ssh_host_directive", tags.ssh_host_directive.clone().unwrap_or_default());
        }
        ServiceKind::K8s => {
            data.set("client_kube_cluster_name", tags.kube_cluster_name.clone().unwrap_or_default());
            data.set("client_kube_ca_key", tags.kube_ca_key.clone().unwrap_or_default());
            // an override equal to the domain is what an unset override expands to
            let dns_override = backend
                .dns_overrides
                .get(&domain)
                .filter(|resolved| **resolved != domain)
                .cloned()
                .unwrap_or_default();
            data.set("backend_dns_override_for_domain", dns_override);
        }
        _ => {}
    }
}

fn flatten_allow_pattern(pattern: &AllowPattern) -> HashMap<String, Value> {
    let ports = pattern.ports.as_ref().map(|ports| {
        let mut port_list = ports.port_list.clone();
        port_list.sort_unstable();
        port_list.dedup();
        block([
            ("port_list", Value::List(port_list.into_iter().map(Value::Int).collect())),
            (
                "port_range",
                blocks_value(
                    ports
                        .port_range
                        .iter()
                        .map(|r| block([("min", Value::Int(r.min)), ("max", Value::Int(r.max))])),
                ),
            ),
        ])
    });
    block([
        ("cidrs", Value::string_set(pattern.cidrs.clone())),
        ("hostnames", Value::string_set(pattern.hostnames.clone())),
        ("ports", blocks_value(ports)),
    ])
}

fn flatten_exemption(pattern: &Pattern) -> HashMap<String, Value> {
    let (origin_header, hosts) = pattern
        .hosts
        .first()
        .map(|h| (h.origin_header.clone(), h.target.clone()))
        .unwrap_or_default();
    block([
        ("source_cidrs", Value::string_set(pattern.source_cidrs.clone())),
        ("hosts", Value::string_set(hosts)),
        ("origin_header", Value::string_set(origin_header)),
        ("methods", Value::string_set(pattern.methods.clone())),
        ("paths", Value::string_set(pattern.paths.clone())),
        ("mandatory_headers", Value::string_set(pattern.mandatory_headers.clone())),
    ])
}

fn flatten_http_settings(info: &ServiceInfo, data: &mut ResourceData) {
    let http = &info.spec.spec.http_settings;
    let oidc = &http.oidc_settings;
    data.set("post_auth_redirect_path", oidc.post_auth_redirect_path.clone());
    data.set("api_path", oidc.api_path.clone());
    data.set(
        "suppress_device_trust_verification",
        oidc.suppress_device_trust_verification,
    );

    // the server answers with an empty pattern when nothing is exempted
    let exemptions = http
        .exempted_paths
        .patterns
        .iter()
        .map(flatten_exemption)
        .filter(|b| !b.is_empty());
    data.set("exemptions", blocks_value(exemptions));

    let cookie = http.custom_trust_cookie.as_ref().map(|cookie| {
        block([
            ("same_site_policy", Value::from(cookie.same_site_policy.clone())),
            ("trust_cookie_path", Value::from(cookie.trust_cookie_path.clone())),
        ])
    });
    data.set("custom_trust_cookie", blocks_value(cookie));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::service::expand::expand;
    use banyan_client::service::{Pattern, ServiceDocument};

    fn info(doc: ServiceDocument) -> ServiceInfo {
        ServiceInfo {
            id: "svc-1".to_string(),
            name: doc.metadata.name.clone(),
            cluster: "cluster1".to_string(),
            enabled: true,
            created_at: 0,
            spec: doc,
        }
    }

    #[test]
    fn web_round_trip() {
        let bag = ResourceData::new()
            .with_attribute("name", "w")
            .with_attribute("description", "wiki")
            .with_attribute("cluster", "cluster1")
            .with_attribute("domain", "w.corp.com")
            .with_attribute("access_tier", "us-west1")
            .with_attribute("backend_domain", "w.internal")
            .with_attribute("backend_port", 8443i64)
            .with_attribute("backend_tls", true)
            .with_attribute("port", 443i64)
            .with_attribute("icon", "book")
            .with_attribute("api_path", "/api");
        let doc = expand(ServiceKind::Web, &bag).unwrap();
        let mut out = ResourceData::with_id("svc-1");
        flatten(ServiceKind::Web, &info(doc), &mut out);

        for (key, value) in bag.attributes() {
            assert_eq!(out.get(key), Some(value), "{}", key);
        }
        assert_eq!(out.get_bool("available_in_app"), Some(true));
        assert!(!out.contains("connector"));
        assert!(!out.contains("exemptions"));
    }

    #[test]
    fn k8s_flatten_hides_implied_values() {
        let bag = ResourceData::new()
            .with_attribute("name", "k")
            .with_attribute("domain", "k.corp.com")
            .with_attribute("access_tier", "us-west1")
            .with_attribute("http_connect", true);
        let doc = expand(ServiceKind::K8s, &bag).unwrap();
        let mut out = ResourceData::with_id("svc-1");
        flatten(ServiceKind::K8s, &info(doc), &mut out);

        assert_eq!(out.get_bool("http_connect"), Some(true));
        assert!(!out.contains("backend_domain"));
        assert!(!out.contains("backend_port"));
        assert!(!out.contains("backend_dns_override_for_domain"));
        assert!(!out.contains("allow_patterns"));
    }

    #[test]
    fn allow_patterns_only_read_back_in_http_connect_mode() {
        let mut doc = ServiceDocument::default();
        doc.metadata.tags.port = Some("8443".to_string());
        doc.spec.backend.allow_patterns = vec![AllowPattern {
            hostnames: vec!["db.corp.com".to_string()],
            ..Default::default()
        }];
        let mut out = ResourceData::new();
        flatten(ServiceKind::Db, &info(doc.clone()), &mut out);
        assert!(!out.contains("allow_patterns"));

        doc.spec.backend.http_connect = true;
        flatten(ServiceKind::Db, &info(doc), &mut out);
        let patterns = out.get_blocks("allow_patterns");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0]["hostnames"], Value::string_set(["db.corp.com"]));
    }

    #[test]
    fn empty_server_exemption_is_suppressed() {
        let mut doc = ServiceDocument::default();
        doc.spec.http_settings.exempted_paths.patterns = vec![Pattern::default()];
        let mut out = ResourceData::new();
        flatten(ServiceKind::Web, &info(doc), &mut out);
        assert!(!out.contains("exemptions"));
    }

    #[test]
    fn connector_clears_access_tier() {
        let mut doc = ServiceDocument::default();
        doc.spec.backend.connector_name = "edge".to_string();
        let mut out = ResourceData::new().with_attribute("access_tier", "stale");
        flatten(ServiceKind::Tcp, &info(doc), &mut out);
        assert_eq!(out.get_string("connector"), "edge");
        assert_eq!(out.get("access_tier"), None);
    }
}
