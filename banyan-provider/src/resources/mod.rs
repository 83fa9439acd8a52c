//! Managed resource adapters
//!
//! Each adapter translates between the flat attribute bag and the control
//! plane's documents, then reconciles through the matching sub-client.

pub mod access_tier;
pub mod access_tier_group;
pub mod api_key;
pub mod app_config;
pub mod connector;
pub mod policy;
pub mod policy_attachment;
pub mod registered_domain;
pub mod role;
pub mod scim;
pub mod service;
pub mod service_tunnel;
pub mod validate_registered_domain;

pub use access_tier::AccessTierResource;
pub use access_tier_group::AccessTierGroupResource;
pub use api_key::ApiKeyResource;
pub use app_config::AppConfigResource;
pub use connector::ConnectorResource;
pub use policy::{PolicyKind, PolicyResource, RawPolicyResource};
pub use policy_attachment::PolicyAttachmentResource;
pub use registered_domain::RegisteredDomainResource;
pub use role::RoleResource;
pub use scim::ScimResource;
pub use service::{ServiceKind, ServiceResource};
pub use service_tunnel::ServiceTunnelResource;
pub use validate_registered_domain::ValidateRegisteredDomainResource;
