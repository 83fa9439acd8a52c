//! Tunnel policy rules
//!
//! A tunnel rule's `l4_access` block holds allow and deny lists. With no
//! block the server allows all traffic, which it stores as a single
//! wildcard allow rule. That rule is the canonical form on both sides: it is
//! written when the block is absent, hidden again on flatten, and rejected
//! when spelled out by hand.

use std::collections::HashMap;

use banyan_client::policy::{Conditions, L4Access, L4Rule, Rules};
use banyan_core::provider::{ProviderError, ProviderResult};
use banyan_core::resource::{BlockExt, Value};
use banyan_core::schema::{AttributeSchema, AttributeType};

use crate::helpers::{block, blocks_value};
use crate::validators::{cidr_or_wildcard_set, domain_set, l4_port_set, l4_protocol_set};

fn allow_all() -> L4Access {
    L4Access {
        allow: vec![L4Rule {
            cidrs: vec!["*".to_string()],
            protocols: vec!["ALL".to_string()],
            ports: vec!["*".to_string()],
            fqdns: Vec::new(),
        }],
        deny: Vec::new(),
    }
}

fn rule_schema() -> AttributeType {
    AttributeType::block(vec![
        AttributeSchema::new("cidrs", cidr_or_wildcard_set()),
        AttributeSchema::new("protocols", l4_protocol_set()),
        AttributeSchema::new("ports", l4_port_set()).with_description("Ports or ranges such as 8000-8080"),
        AttributeSchema::new("fqdns", domain_set()),
    ])
}

pub(super) fn rule_attributes() -> Vec<AttributeSchema> {
    vec![
        AttributeSchema::new(
            "l4_access",
            AttributeType::block(vec![
                AttributeSchema::new("allow", rule_schema()),
                AttributeSchema::new("deny", rule_schema()),
            ]),
        )
        .max_items(1)
        .with_description("Network rules; all traffic is allowed when unset"),
    ]
}

fn expand_rule(rule: &HashMap<String, Value>) -> L4Rule {
    L4Rule {
        cidrs: rule.string_set("cidrs"),
        protocols: rule.string_set("protocols"),
        ports: rule.string_set("ports"),
        fqdns: rule.string_set("fqdns"),
    }
}

pub(super) fn expand_rules(
    resource_type: &str,
    conditions: Conditions,
    access: &HashMap<String, Value>,
) -> ProviderResult<Rules> {
    let l4_access = match access.nested("l4_access").first() {
        None => allow_all(),
        Some(l4) => {
            let given = L4Access {
                allow: l4.nested("allow").into_iter().map(expand_rule).collect(),
                deny: l4.nested("deny").into_iter().map(expand_rule).collect(),
            };
            if given == allow_all() {
                return Err(ProviderError::new("invalid l4_access block: redundant").for_resource(resource_type));
            }
            given
        }
    };

    Ok(Rules {
        conditions,
        l7_access: None,
        l4_access: Some(l4_access),
    })
}

fn flatten_rule(rule: &L4Rule) -> HashMap<String, Value> {
    block([
        ("cidrs", Value::string_set(rule.cidrs.clone())),
        ("protocols", Value::string_set(rule.protocols.clone())),
        ("ports", Value::string_set(rule.ports.clone())),
        ("fqdns", Value::string_set(rule.fqdns.clone())),
    ])
}

pub(super) fn flatten_rules(rules: &Rules, members: &mut HashMap<String, Value>) {
    let Some(l4) = rules.l4_access.as_ref().filter(|l4| **l4 != allow_all()) else {
        return;
    };
    let l4_block = block([
        ("allow", blocks_value(l4.allow.iter().map(flatten_rule))),
        ("deny", blocks_value(l4.deny.iter().map(flatten_rule))),
    ]);
    members.insert("l4_access".to_string(), blocks_value([l4_block]));
}
