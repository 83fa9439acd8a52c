//! API keys
//!
//! Keyed by the server id. The secret only comes back from create, so reads
//! keep whatever the bag already holds.

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::api_key::{ApiKeyInfo, ApiKeyPost, SCOPES};
use banyan_core::provider::{ProviderResult, ResourceAdapter};
use banyan_core::resource::ResourceData;
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::{api_error, handle_not_found, prepare, require_id};

const TYPE_NAME: &str = "banyan_api_key";

pub struct ApiKeyResource;

fn expand(data: &ResourceData) -> ApiKeyPost {
    ApiKeyPost {
        name: data.get_string("name"),
        description: data.get_string("description"),
        scope: data.get_string("scope"),
    }
}

fn flatten(key: &ApiKeyInfo, data: &mut ResourceData) {
    data.set("name", key.name.clone());
    data.set("description", key.description.clone());
    data.set("scope", key.scope.clone());
    if !key.secret.is_empty() {
        data.set("secret", key.secret.clone());
    }
}

#[async_trait]
impl ResourceAdapter<Client> for ApiKeyResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("description", AttributeType::String).required())
            .attribute(AttributeSchema::new("scope", AttributeType::enumeration(SCOPES)).required())
            .attribute(
                AttributeSchema::new("secret", AttributeType::String)
                    .computed()
                    .sensitive()
                    .with_description("Key material; only available after create"),
            )
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        prepare(&self.schema(), data)?;
        let key = client
            .api_key
            .create(&expand(data))
            .await
            .map_err(|e| api_error(TYPE_NAME, "create api key", e))?;
        data.set_id(key.id.clone());
        flatten(&key, data);
        self.read(client, data).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.api_key.get(&id).await {
            Ok(key) => {
                flatten(&key, data);
                Ok(())
            }
            Err(err) => handle_not_found(TYPE_NAME, data, err),
        }
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        prepare(&self.schema(), data)?;
        client
            .api_key
            .update(&id, &expand(data))
            .await
            .map_err(|e| api_error(TYPE_NAME, "update api key", e))?;
        self.read(client, data).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.api_key.delete(&id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => log::debug!("{} {} already gone", TYPE_NAME, id),
            Err(err) => return Err(api_error(TYPE_NAME, "delete api key", err)),
        }
        data.clear_id();
        Ok(())
    }
}
