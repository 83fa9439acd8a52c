use async_trait::async_trait;
use banyan_client::Client;
use banyan_core::provider::{DataSourceAdapter, ProviderResult, ResourceAdapter};
use banyan_core::resource::ResourceData;
use banyan_core::schema::ResourceSchema;

use super::{lookup_name, lookup_schema};
use crate::helpers::api_error;
use crate::resources::role::{RoleResource, flatten};

const TYPE_NAME: &str = "banyan_role";

/// Role looked up by name
pub struct RoleDataSource;

#[async_trait]
impl DataSourceAdapter<Client> for RoleDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        lookup_schema(RoleResource.schema())
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let name = lookup_name(TYPE_NAME, data)?;
        let role = client
            .role
            .get_by_name(&name)
            .await
            .map_err(|e| api_error(TYPE_NAME, "look up role", e))?;
        data.set_id(role.id.clone());
        flatten(&role, data);
        Ok(())
    }
}
