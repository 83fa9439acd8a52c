//! Registered domains
//!
//! Domains on the global-edge cluster must prove ownership: a challenge is
//! created for the name first and its id travels with the create request.
//! There is no update API, so every user-set attribute forces replacement.

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::registered_domain::{GLOBAL_EDGE_CLUSTER, RegisteredDomainInfo, RegisteredDomainPost};
use banyan_core::provider::{ProviderResult, ResourceAdapter};
use banyan_core::resource::ResourceData;
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::{api_error, handle_not_found, prepare, require_id};
use crate::resources::access_tier::set_access_tier_cluster;
use crate::validators::domain;

const TYPE_NAME: &str = "banyan_registered_domain";

fn flatten(info: &RegisteredDomainInfo, data: &mut ResourceData) {
    data.set("name", info.name.clone());
    data.set("cluster", info.cluster_name.clone());
    data.set("cname", info.cname.clone());
    data.set("description", info.description.clone());
    data.set("acme_cname", info.acme_cname.clone());
    data.set("domain_name", info.domain_name.clone());
    data.set("status", info.status.clone());
}

pub struct RegisteredDomainResource;

#[async_trait]
impl ResourceAdapter<Client> for RegisteredDomainResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description("DNS name owned by the tenant")
            .attribute(AttributeSchema::new("name", domain()).required().force_new())
            .attribute(
                AttributeSchema::new("cluster", AttributeType::String)
                    .optional_computed()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("cname", AttributeType::String)
                    .optional_computed()
                    .force_new()
                    .with_description("CNAME target; assigned by the server when unset"),
            )
            .attribute(AttributeSchema::new("description", AttributeType::String).force_new())
            .attribute(AttributeSchema::new("acme_cname", AttributeType::String).computed())
            .attribute(AttributeSchema::new("domain_name", AttributeType::String).computed())
            .attribute(AttributeSchema::new("status", AttributeType::String).computed())
            .attribute(AttributeSchema::new("challenge_id", AttributeType::String).computed())
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        prepare(&self.schema(), data)?;
        set_access_tier_cluster(client, TYPE_NAME, data).await?;
        let name = data.get_string("name");
        let cluster = data.get_string("cluster");

        let mut challenge_id = String::new();
        if cluster == GLOBAL_EDGE_CLUSTER {
            let challenge = client
                .registered_domain
                .create_challenge(&name)
                .await
                .map_err(|e| api_error(TYPE_NAME, "create domain challenge", e))?;
            log::info!(
                "{}: publish TXT {} = {} to prove ownership of {}",
                TYPE_NAME,
                challenge.label,
                challenge.value,
                name
            );
            challenge_id = challenge.id;
        }

        let post = RegisteredDomainPost {
            name,
            cluster_name: cluster,
            cname: data.get_string("cname"),
            description: data.get_string("description"),
            registered_domain_challenge_id: challenge_id.clone(),
        };
        let info = client
            .registered_domain
            .create(&post)
            .await
            .map_err(|e| api_error(TYPE_NAME, "create registered domain", e))?;
        data.set_id(info.id.clone());
        data.set("challenge_id", challenge_id);
        self.read(client, data).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.registered_domain.get(&id).await {
            Ok(info) => {
                flatten(&info, data);
                Ok(())
            }
            Err(err) => handle_not_found(TYPE_NAME, data, err),
        }
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.read(client, data).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.registered_domain.delete(&id).await {
            Ok(()) => log::info!("deleted {} {}", TYPE_NAME, id),
            Err(err) if err.is_not_found() => log::debug!("{} {} already gone", TYPE_NAME, id),
            Err(err) => return Err(api_error(TYPE_NAME, "delete registered domain", err)),
        }
        data.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;

    #[tokio::test]
    async fn global_edge_creates_challenge_first() {
        let mock = MockApi::new();
        let mut data = ResourceData::new()
            .with_attribute("name", "apps.corp.com")
            .with_attribute("cluster", "global-edge");
        RegisteredDomainResource.create(&mock.client(), &mut data).await.unwrap();

        assert_eq!(
            mock.calls()[..2],
            [
                "registered_domain.create_challenge apps.corp.com".to_string(),
                "registered_domain.create apps.corp.com chal-1".to_string(),
            ]
        );
        assert_eq!(data.id(), Some("rd-2"));
        assert_eq!(data.get_string("challenge_id"), "chal-1");
        assert_eq!(data.get_string("acme_cname"), "_acme-challenge.apps.corp.com");
        assert_eq!(data.get_string("status"), "Pending");
    }

    #[tokio::test]
    async fn private_cluster_skips_the_challenge() {
        let mock = MockApi::new();
        let mut data = ResourceData::new().with_attribute("name", "apps.corp.com");
        RegisteredDomainResource.create(&mock.client(), &mut data).await.unwrap();

        assert_eq!(data.get_string("cluster"), "cluster1");
        assert!(mock.position("registered_domain.create_challenge").is_none());
        assert!(!data.get_string("cname").is_empty());
    }

    #[tokio::test]
    async fn invalid_name_is_rejected() {
        let mock = MockApi::new();
        let mut data = ResourceData::new().with_attribute("name", "not a domain");
        assert!(RegisteredDomainResource.create(&mock.client(), &mut data).await.is_err());
        assert!(mock.state().domains.is_empty());
    }
}
