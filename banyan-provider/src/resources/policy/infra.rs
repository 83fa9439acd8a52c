//! Infrastructure policy rules: roles and trust level only

use banyan_client::policy::{Access, Conditions, Exception, PolicyOptions, PolicySpec, Rules};

pub(super) fn expand_rules(conditions: Conditions) -> Rules {
    Rules {
        conditions,
        l7_access: Some(Vec::new()),
        l4_access: None,
    }
}

pub(super) fn expand_spec(access: Vec<Access>) -> PolicySpec {
    PolicySpec {
        access,
        exception: Some(Exception::default()),
        options: Some(PolicyOptions {
            disable_tls_client_authentication: false,
            l7_protocol: String::new(),
        }),
    }
}
