//! Verification of a registered domain
//!
//! Creating this resource asks the server to check the domain's DNS records.
//! It shares the domain's id and owns nothing remote, so delete only forgets it.

use async_trait::async_trait;
use banyan_client::Client;
use banyan_core::provider::{ProviderResult, ResourceAdapter};
use banyan_core::resource::ResourceData;
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::{api_error, handle_not_found, prepare, require_id};

const TYPE_NAME: &str = "banyan_validate_registered_domain";

pub struct ValidateRegisteredDomainResource;

#[async_trait]
impl ResourceAdapter<Client> for ValidateRegisteredDomainResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .attribute(
                AttributeSchema::new("registered_domain_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("status", AttributeType::String).computed())
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        prepare(&self.schema(), data)?;
        let domain_id = data.get_string("registered_domain_id");
        let info = client
            .registered_domain
            .validate(&domain_id)
            .await
            .map_err(|e| api_error(TYPE_NAME, "validate registered domain", e))?;
        log::info!("{} {}: {}", TYPE_NAME, info.name, info.status);
        data.set_id(domain_id);
        self.read(client, data).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.registered_domain.get(&id).await {
            Ok(info) => {
                data.set("registered_domain_id", info.id);
                data.set("status", info.status);
                Ok(())
            }
            Err(err) => handle_not_found(TYPE_NAME, data, err),
        }
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.read(client, data).await
    }

    async fn delete(&self, _client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        data.clear_id();
        Ok(())
    }
}
