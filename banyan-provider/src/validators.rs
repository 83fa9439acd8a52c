//! Attribute validators and the custom types built on them
//!
//! Validators receive one bag value at a time. A list value is checked item
//! by item so the same validator serves scalars and sets.

use std::net::IpAddr;
use std::sync::LazyLock;

use banyan_core::resource::Value;
use banyan_core::schema::{AttributeType, Diagnostics};
use regex::Regex;

pub const TRUST_LEVELS: &[&str] = &["High", "Medium", "Low", ""];
pub const L4_PROTOCOLS: &[&str] = &["TCP", "UDP", "ICMP", "ALL"];

const DOMAIN_PATTERN: &str =
    r"^(\*\.)?([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)*[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.?$";

static DOMAIN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(DOMAIN_PATTERN).ok());

fn each_string(value: &Value, check: &dyn Fn(&str) -> Option<String>) -> Diagnostics {
    let mut diags = Diagnostics::ok();
    match value {
        Value::String(s) => {
            if let Some(message) = check(s) {
                diags.errors.push(message);
            }
        }
        Value::List(items) => {
            for item in items {
                diags.merge(each_string(item, check));
            }
        }
        _ => {}
    }
    diags
}

pub fn validate_port(value: &Value) -> Diagnostics {
    match value {
        Value::Int(port) if !(0..=65535).contains(port) => {
            Diagnostics::error(format!("port {} out of range 0-65535", port))
        }
        Value::List(items) => {
            let mut diags = Diagnostics::ok();
            for item in items {
                diags.merge(validate_port(item));
            }
            diags
        }
        _ => Diagnostics::ok(),
    }
}

fn check_cidr(s: &str) -> Option<String> {
    let Some((addr, prefix)) = s.split_once('/') else {
        return Some(format!("'{}' is not a CIDR (expected address/prefix)", s));
    };
    let Ok(addr) = addr.parse::<IpAddr>() else {
        return Some(format!("'{}' has an invalid IP address", s));
    };
    let max = if addr.is_ipv4() { 32 } else { 128 };
    match prefix.parse::<u8>() {
        Ok(p) if p <= max => None,
        _ => Some(format!("'{}' has an invalid prefix length", s)),
    }
}

pub fn validate_cidr(value: &Value) -> Diagnostics {
    each_string(value, &check_cidr)
}

/// CIDR, or `*` where allow-all is meaningful
pub fn validate_cidr_or_wildcard(value: &Value) -> Diagnostics {
    each_string(value, &|s| if s == "*" { None } else { check_cidr(s) })
}

pub fn validate_trust_level(value: &Value) -> Diagnostics {
    each_string(value, &|s| {
        (!TRUST_LEVELS.contains(&s)).then(|| {
            format!("invalid trust level '{}', expected one of High, Medium, Low or empty", s)
        })
    })
}

pub fn validate_l4_protocol(value: &Value) -> Diagnostics {
    each_string(value, &|s| {
        (!L4_PROTOCOLS.contains(&s))
            .then(|| format!("invalid protocol '{}', expected one of {}", s, L4_PROTOCOLS.join(", ")))
    })
}

/// `*`, a single port, or an inclusive `lo-hi` range
pub fn validate_l4_port(value: &Value) -> Diagnostics {
    each_string(value, &|s| {
        if s == "*" {
            return None;
        }
        let parse = |p: &str| p.trim().parse::<u16>().ok();
        match s.split_once('-') {
            Some((lo, hi)) => match (parse(lo), parse(hi)) {
                (Some(lo), Some(hi)) if lo <= hi => None,
                _ => Some(format!("invalid port range '{}'", s)),
            },
            None if parse(s).is_some() => None,
            None => Some(format!("invalid port '{}'", s)),
        }
    })
}

pub fn validate_not_empty(value: &Value) -> Diagnostics {
    each_string(value, &|s| s.trim().is_empty().then(|| "value must not be empty".to_string()))
}

pub fn validate_domain(value: &Value) -> Diagnostics {
    each_string(value, &|s| {
        (!DOMAIN_RE.as_ref().is_some_and(|re| re.is_match(s))).then(|| format!("'{}' is not a valid domain name", s))
    })
}

/// Access tier name, or `*` meaning every tier
pub fn validate_access_tier_or_wildcard(value: &Value) -> Diagnostics {
    each_string(value, &|s| {
        if s == "*" || (!s.trim().is_empty() && !s.contains(' ')) {
            None
        } else {
            Some(format!("'{}' is not an access tier name or '*'", s))
        }
    })
}

// =============================================================================
// Custom types
// =============================================================================

fn custom(name: &str, base: AttributeType, validate: fn(&Value) -> Diagnostics) -> AttributeType {
    AttributeType::Custom {
        name: name.to_string(),
        base: Box::new(base),
        validate,
    }
}

pub fn port() -> AttributeType {
    custom("Port", AttributeType::Int, validate_port)
}

pub fn cidr_set() -> AttributeType {
    custom("CidrSet", AttributeType::string_set(), validate_cidr)
}

pub fn cidr_or_wildcard_set() -> AttributeType {
    custom("CidrOrWildcardSet", AttributeType::string_set(), validate_cidr_or_wildcard)
}

pub fn trust_level() -> AttributeType {
    custom("TrustLevel", AttributeType::String, validate_trust_level)
}

pub fn l4_protocol_set() -> AttributeType {
    custom("L4ProtocolSet", AttributeType::string_set(), validate_l4_protocol)
}

pub fn l4_port_set() -> AttributeType {
    custom("L4PortSet", AttributeType::string_set(), validate_l4_port)
}

pub fn non_empty_string() -> AttributeType {
    custom("NonEmptyString", AttributeType::String, validate_not_empty)
}

pub fn domain() -> AttributeType {
    custom("Domain", AttributeType::String, validate_domain)
}

pub fn domain_set() -> AttributeType {
    custom("DomainSet", AttributeType::string_set(), validate_domain)
}

pub fn access_tier_set() -> AttributeType {
    custom("AccessTierSet", AttributeType::string_set(), validate_access_tier_or_wildcard)
}
