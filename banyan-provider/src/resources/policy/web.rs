//! Web policy rules
//!
//! Every web rule carries `l7_access` entries. Leaving them out means
//! "every resource, every action", which is also what the server stores, so
//! that entry is filled in on expand and hidden again on flatten.

use std::collections::HashMap;

use banyan_client::policy::{Access, Conditions, Exception, L7Access, PolicyOptions, PolicySpec, Rules};
use banyan_core::provider::{ProviderError, ProviderResult};
use banyan_core::resource::{BlockExt, ResourceData, Value};
use banyan_core::schema::{AttributeSchema, AttributeType};

use crate::helpers::{block, blocks_value};

const L7_PROTOCOL: &str = "http";

fn allow_everything() -> Vec<L7Access> {
    vec![L7Access {
        resources: vec!["*".to_string()],
        actions: vec!["*".to_string()],
    }]
}

pub(super) fn rule_attributes() -> Vec<AttributeSchema> {
    vec![AttributeSchema::new(
        "l7_access",
        AttributeType::block(vec![
            AttributeSchema::new("resources", AttributeType::string_set())
                .required()
                .with_description("Paths; a leading ! denies"),
            AttributeSchema::new("actions", AttributeType::string_set())
                .required()
                .with_description("HTTP verbs, or * for all"),
        ]),
    )
    .with_description("Resource/action pairs; every resource and action when unset")]
}

pub(super) fn expand_rules(
    resource_type: &str,
    conditions: Conditions,
    access: &HashMap<String, Value>,
) -> ProviderResult<Rules> {
    let l7: Vec<L7Access> = access
        .nested("l7_access")
        .into_iter()
        .map(|entry| L7Access {
            resources: entry.string_set("resources"),
            actions: entry.string_set("actions"),
        })
        .collect();

    let l7_access = if l7.is_empty() {
        allow_everything()
    } else if l7 == allow_everything() {
        return Err(ProviderError::new("invalid l7_access block: redundant").for_resource(resource_type));
    } else {
        l7
    };

    Ok(Rules {
        conditions,
        l7_access: Some(l7_access),
        l4_access: None,
    })
}

pub(super) fn expand_spec(access: Vec<Access>, tls_client_authentication: bool) -> PolicySpec {
    PolicySpec {
        access,
        exception: Some(Exception::default()),
        options: Some(PolicyOptions {
            disable_tls_client_authentication: !tls_client_authentication,
            l7_protocol: L7_PROTOCOL.to_string(),
        }),
    }
}

pub(super) fn flatten_rules(rules: &Rules, members: &mut HashMap<String, Value>) {
    let l7 = rules.l7_access.clone().unwrap_or_default();
    if l7.is_empty() || l7 == allow_everything() {
        return;
    }
    let entries = l7.into_iter().map(|entry| {
        block([
            ("resources", Value::string_set(entry.resources)),
            ("actions", Value::string_set(entry.actions)),
        ])
    });
    members.insert("l7_access".to_string(), blocks_value(entries));
}

pub(super) fn flatten_options(spec: &PolicySpec, data: &mut ResourceData) {
    let tls = spec
        .options
        .as_ref()
        .is_some_and(|options| !options.disable_tls_client_authentication);
    data.set("tls_client_authentication", tls);
}
