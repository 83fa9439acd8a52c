//! Tenant-wide desktop app settings (singleton)

use async_trait::async_trait;
use banyan_client::Client;
use banyan_core::provider::{ProviderResult, ResourceAdapter};
use banyan_core::resource::ResourceData;
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::{api_error, prepare, require_id};

const TYPE_NAME: &str = "banyan_app_config";

/// Id used when the server does not name its settings object
const FALLBACK_ID: &str = "app_config";

pub struct AppConfigResource;

impl AppConfigResource {
    async fn write(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        prepare(&self.schema(), data)?;
        let config = client
            .app_config
            .update(data.get_bool_or("nrpt_config", false))
            .await
            .map_err(|e| api_error(TYPE_NAME, "update app config", e))?;
        if config.id.is_empty() {
            data.set_id(FALLBACK_ID);
        } else {
            data.set_id(config.id);
        }
        self.read(client, data).await
    }
}

#[async_trait]
impl ResourceAdapter<Client> for AppConfigResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME).attribute(
            AttributeSchema::new("nrpt_config", AttributeType::Bool)
                .with_default(false)
                .with_description("Push Name Resolution Policy Table entries to Windows clients"),
        )
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.write(client, data).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        require_id(TYPE_NAME, data)?;
        let config = client
            .app_config
            .get()
            .await
            .map_err(|e| api_error(TYPE_NAME, "read app config", e))?;
        data.set("nrpt_config", config.nrpt_config);
        Ok(())
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.write(client, data).await
    }

    /// Settings cannot be removed; they go back to their defaults
    async fn delete(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        client
            .app_config
            .update(false)
            .await
            .map_err(|e| api_error(TYPE_NAME, "reset app config", e))?;
        data.clear_id();
        Ok(())
    }
}
