//! Registered services
//!
//! One adapter type serves every service kind. The kind picks the schema,
//! the template tags and the backend rules; everything else (lifecycle,
//! policy attachment) is shared.

mod expand;
mod flatten;
mod schema;

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::attachment::{ATTACHED_TO_SERVICE, AttachmentPost};
use banyan_core::provider::{ProviderResult, ResourceAdapter};
use banyan_core::resource::ResourceData;
use banyan_core::schema::ResourceSchema;

use crate::helpers::{api_error, handle_not_found, prepare, require_id};
use crate::resources::access_tier::set_access_tier_cluster;

pub use expand::expand;
pub use flatten::flatten;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Web,
    Tcp,
    Ssh,
    Rdp,
    K8s,
    Db,
    /// Generic infrastructure service, registered as `banyan_service`
    Generic,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 7] = [
        ServiceKind::Generic,
        ServiceKind::Web,
        ServiceKind::Tcp,
        ServiceKind::Ssh,
        ServiceKind::Rdp,
        ServiceKind::K8s,
        ServiceKind::Db,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            ServiceKind::Web => "banyan_service_web",
            ServiceKind::Tcp => "banyan_service_tcp",
            ServiceKind::Ssh => "banyan_service_ssh",
            ServiceKind::Rdp => "banyan_service_rdp",
            ServiceKind::K8s => "banyan_service_k8s",
            ServiceKind::Db => "banyan_service_db",
            ServiceKind::Generic => "banyan_service",
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            ServiceKind::Web => "WEB_USER",
            _ => "TCP_USER",
        }
    }

    pub fn app_type(self) -> &'static str {
        match self {
            ServiceKind::Web => "WEB",
            ServiceKind::Tcp => "TCP",
            ServiceKind::Ssh => "SSH",
            ServiceKind::Rdp => "RDP",
            ServiceKind::K8s => "K8S",
            ServiceKind::Db => "DATABASE",
            ServiceKind::Generic => "GENERIC",
        }
    }

    pub fn protocol(self) -> &'static str {
        match self {
            ServiceKind::Web => "https",
            _ => "tcp",
        }
    }

    pub fn default_port(self) -> i64 {
        match self {
            ServiceKind::Web => 443,
            _ => 8443,
        }
    }

    pub fn is_web(self) -> bool {
        self == ServiceKind::Web
    }

    /// Kinds whose http-connect mode takes `allow_patterns`
    pub fn takes_allow_patterns(self) -> bool {
        matches!(
            self,
            ServiceKind::Tcp | ServiceKind::Rdp | ServiceKind::Db | ServiceKind::Generic
        )
    }

    pub fn takes_include_domains(self) -> bool {
        matches!(self, ServiceKind::Tcp | ServiceKind::Generic)
    }

    /// `banyanproxy_mode` tag; web services have none
    pub fn banyanproxy_mode(self, http_connect: bool) -> Option<&'static str> {
        match self {
            ServiceKind::Web => None,
            _ if !http_connect => Some("TCP"),
            ServiceKind::Rdp => Some("RDPGATEWAY"),
            _ => Some("CHAIN"),
        }
    }
}

/// Adapter for one service kind
pub struct ServiceResource {
    kind: ServiceKind,
}

impl ServiceResource {
    pub fn new(kind: ServiceKind) -> Self {
        Self { kind }
    }

    async fn write(&self, client: &Client, data: &mut ResourceData, existing: Option<String>) -> ProviderResult<()> {
        let type_name = self.type_name();
        prepare(&self.schema(), data)?;
        expand::check(self.kind, data)?;
        set_access_tier_cluster(client, type_name, data).await?;
        let doc = expand(self.kind, data)?;

        let info = match &existing {
            Some(id) => {
                log::info!("updating {} {}", type_name, id);
                client.service.update(id, &doc).await
            }
            None => {
                log::info!("creating {} {}", type_name, doc.metadata.name);
                client.service.create(&doc).await
            }
        }
        .map_err(|e| api_error(type_name, "write service", e))?;
        data.set_id(info.id.clone());

        sync_policy(client, type_name, &info.id, data).await?;
        self.read(client, data).await
    }
}

#[async_trait]
impl ResourceAdapter<Client> for ServiceResource {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn schema(&self) -> ResourceSchema {
        schema::schema(self.kind)
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.write(client, data, None).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let type_name = self.type_name();
        let id = require_id(type_name, data)?;
        let info = match client.service.get(&id).await {
            Ok(info) => info,
            Err(err) => return handle_not_found(type_name, data, err),
        };
        if info.spec.metadata.tags.service_app_type.as_deref() != Some(self.kind.app_type()) {
            log::warn!(
                "{} {} has service_app_type {:?}",
                type_name,
                id,
                info.spec.metadata.tags.service_app_type
            );
        }
        flatten(self.kind, &info, data);

        match client.attachment.get(&id, ATTACHED_TO_SERVICE).await {
            Ok(attachment) => {
                data.set("policy", attachment.policy_id.clone());
                data.set("policy_enforcing", attachment.is_enabled());
            }
            Err(err) if err.is_not_found() => {
                data.remove("policy");
            }
            Err(err) => return Err(api_error(type_name, "read policy attachment", err)),
        }
        Ok(())
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(self.type_name(), data)?;
        self.write(client, data, Some(id)).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let type_name = self.type_name();
        let id = require_id(type_name, data)?;

        // the API refuses to delete a service with a policy attached
        match client.attachment.get(&id, ATTACHED_TO_SERVICE).await {
            Ok(attachment) => client
                .attachment
                .delete(&attachment.policy_id, ATTACHED_TO_SERVICE, &id)
                .await
                .map_err(|e| api_error(type_name, "detach policy", e))?,
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(api_error(type_name, "read policy attachment", err)),
        }

        match client.service.delete(&id).await {
            Ok(()) => log::info!("deleted {} {}", type_name, id),
            Err(err) if err.is_not_found() => log::debug!("{} {} already gone", type_name, id),
            Err(err) => return Err(api_error(type_name, "delete service", err)),
        }
        data.clear_id();
        Ok(())
    }
}

/// Bring the service's policy attachment in line with `policy`/`policy_enforcing`
async fn sync_policy(client: &Client, type_name: &str, service_id: &str, data: &ResourceData) -> ProviderResult<()> {
    let wanted = data.get_string("policy");
    let enforcing = data.get_bool_or("policy_enforcing", true);

    let current = match client.attachment.get(service_id, ATTACHED_TO_SERVICE).await {
        Ok(attachment) => Some(attachment),
        Err(err) if err.is_not_found() => None,
        Err(err) => return Err(api_error(type_name, "read policy attachment", err)),
    };

    if let Some(current) = &current {
        if current.policy_id == wanted && current.is_enabled() == enforcing {
            return Ok(());
        }
        client
            .attachment
            .delete(&current.policy_id, ATTACHED_TO_SERVICE, service_id)
            .await
            .map_err(|e| api_error(type_name, "detach policy", e))?;
    }

    if !wanted.is_empty() {
        let body = AttachmentPost::new(ATTACHED_TO_SERVICE, service_id, enforcing);
        client
            .attachment
            .create(&wanted, &body)
            .await
            .map_err(|e| api_error(type_name, "attach policy", e))?;
    }
    Ok(())
}
