//! Banyan API client
//!
//! One async trait per remote sub-API, a REST implementation of all of them,
//! and the [`Client`] root handle that resource adapters receive.

pub mod access_tier;
pub mod access_tier_group;
pub mod api_key;
pub mod app_config;
pub mod attachment;
pub mod cluster;
pub mod error;
pub mod oidc_settings;
pub mod policy;
pub mod registered_domain;
pub mod rest;
pub mod role;
pub mod satellite;
pub mod scim;
pub mod service;
pub mod service_tunnel;

use std::sync::Arc;

pub use error::{ClientError, ClientResult};
pub use rest::{DEFAULT_HOST, RestClient};

use access_tier::AccessTierApi;
use access_tier_group::AccessTierGroupApi;
use api_key::ApiKeyApi;
use app_config::AppConfigApi;
use attachment::AttachmentApi;
use cluster::ClusterApi;
use oidc_settings::OidcSettingsApi;
use policy::PolicyApi;
use registered_domain::RegisteredDomainApi;
use role::RoleApi;
use satellite::ConnectorApi;
use scim::ScimApi;
use service::ServiceApi;
use service_tunnel::ServiceTunnelApi;

/// Root handle bundling every sub-client
#[derive(Clone)]
pub struct Client {
    pub access_tier: Arc<dyn AccessTierApi>,
    pub access_tier_group: Arc<dyn AccessTierGroupApi>,
    pub api_key: Arc<dyn ApiKeyApi>,
    pub app_config: Arc<dyn AppConfigApi>,
    pub attachment: Arc<dyn AttachmentApi>,
    pub cluster: Arc<dyn ClusterApi>,
    pub connector: Arc<dyn ConnectorApi>,
    pub oidc_settings: Arc<dyn OidcSettingsApi>,
    pub policy: Arc<dyn PolicyApi>,
    pub registered_domain: Arc<dyn RegisteredDomainApi>,
    pub role: Arc<dyn RoleApi>,
    pub scim: Arc<dyn ScimApi>,
    pub service: Arc<dyn ServiceApi>,
    pub service_tunnel: Arc<dyn ServiceTunnelApi>,
}

impl Client {
    /// Connect to `host` and exchange the refresh token for an access token
    pub async fn new(host: &str, refresh_token: &str) -> ClientResult<Self> {
        let rest = RestClient::new(host, refresh_token)?;
        rest.login().await?;
        log::info!("connected to {}", rest.host());
        Ok(Self::from_rest(Arc::new(rest)))
    }

    /// Wire every sub-client to one shared REST transport
    pub fn from_rest(rest: Arc<RestClient>) -> Self {
        Self {
            access_tier: rest.clone(),
            access_tier_group: rest.clone(),
            api_key: rest.clone(),
            app_config: rest.clone(),
            attachment: rest.clone(),
            cluster: rest.clone(),
            connector: rest.clone(),
            oidc_settings: rest.clone(),
            policy: rest.clone(),
            registered_domain: rest.clone(),
            role: rest.clone(),
            scim: rest.clone(),
            service: rest.clone(),
            service_tunnel: rest,
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}
