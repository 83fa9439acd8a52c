use async_trait::async_trait;
use banyan_client::Client;
use banyan_core::provider::{DataSourceAdapter, ProviderResult};
use banyan_core::resource::ResourceData;
use banyan_core::schema::ResourceSchema;

use super::{lookup_name, lookup_schema};
use crate::helpers::api_error;
use crate::resources::policy::{PolicyKind, flatten, schema};

/// Web, tunnel or infra policy looked up by name
pub struct PolicyDataSource {
    kind: PolicyKind,
}

impl PolicyDataSource {
    pub fn new(kind: PolicyKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl DataSourceAdapter<Client> for PolicyDataSource {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn schema(&self) -> ResourceSchema {
        lookup_schema(schema(self.kind))
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let name = lookup_name(self.type_name(), data)?;
        let policy = client
            .policy
            .get_by_name(&name)
            .await
            .map_err(|e| api_error(self.type_name(), "look up policy", e))?;
        data.set_id(policy.id.clone());
        flatten(self.kind, &policy, data);
        Ok(())
    }
}
