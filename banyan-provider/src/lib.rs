//! Banyan ZTNA provider
//!
//! Declarative management of a Banyan tenant: services, policies, roles,
//! access tiers, connectors, tunnels and tenant settings.
//!
//! ## Module Structure
//!
//! - `resources` - Managed resource adapters
//! - `data_sources` - Read-only lookups
//! - `config` - Provider block and environment resolution
//! - `helpers` - Error mapping and bag-level checks shared by adapters
//! - `validators` - Attribute validators and custom types
//! - `ids` - Composite state identifiers

pub mod config;
pub mod data_sources;
pub mod helpers;
pub mod ids;
pub mod resources;
pub mod validators;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;

use banyan_client::Client;
use banyan_core::provider::{ProviderDescriptor, ProviderError, ProviderResult};
use banyan_core::resource::Value;

pub use config::{ProviderConfig, config_schema};

use data_sources::{OidcSettingsDataSource, PolicyDataSource, RoleDataSource};
use resources::{
    AccessTierGroupResource, AccessTierResource, ApiKeyResource, AppConfigResource, ConnectorResource,
    PolicyAttachmentResource, PolicyKind, PolicyResource, RawPolicyResource, RegisteredDomainResource,
    RoleResource, ScimResource, ServiceKind, ServiceResource, ServiceTunnelResource,
    ValidateRegisteredDomainResource,
};

pub const PROVIDER_NAME: &str = "banyan";

/// Every resource and data source this provider exposes
pub fn provider() -> ProviderDescriptor<Client> {
    let mut descriptor = ProviderDescriptor::new(PROVIDER_NAME, config_schema());
    for kind in ServiceKind::ALL {
        descriptor = descriptor.with_resource(ServiceResource::new(kind));
    }
    for kind in PolicyKind::ALL {
        descriptor = descriptor
            .with_resource(PolicyResource::new(kind))
            .with_data_source(PolicyDataSource::new(kind));
    }
    descriptor
        .with_resource(RawPolicyResource)
        .with_resource(PolicyAttachmentResource)
        .with_resource(RoleResource)
        .with_resource(AccessTierResource)
        .with_resource(AccessTierGroupResource)
        .with_resource(ConnectorResource)
        .with_resource(ApiKeyResource)
        .with_resource(RegisteredDomainResource)
        .with_resource(ValidateRegisteredDomainResource)
        .with_resource(ScimResource)
        .with_resource(AppConfigResource)
        .with_resource(ServiceTunnelResource)
        .with_data_source(RoleDataSource)
        .with_data_source(OidcSettingsDataSource)
}

/// Resolve the provider block and log in
pub async fn configure(attributes: &HashMap<String, Value>) -> ProviderResult<Client> {
    let config = ProviderConfig::from_attributes(attributes)
        .map_err(|e| ProviderError::new("invalid provider configuration").with_cause(e))?;
    log::debug!("configuring provider for {}", config.host);
    Client::new(&config.host, &config.refresh_token)
        .await
        .map_err(|e| ProviderError::new(format!("failed to connect to {}", config.host)).with_cause(e))
}
