//! Tenant OIDC endpoints

use async_trait::async_trait;
use banyan_client::Client;
use banyan_core::provider::{DataSourceAdapter, ProviderResult};
use banyan_core::resource::ResourceData;
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::api_error;

const TYPE_NAME: &str = "banyan_oidc_settings";

/// The settings object has no id of its own
const SINGLETON_ID: &str = "singleton";

const FIELDS: &[&str] = &[
    "issuer_url",
    "authorization_endpoint",
    "token_endpoint",
    "jwks_endpoint",
    "redirect_url",
    "scope",
    "userinfo_endpoint",
    "openid_configuration_endpoint",
];

pub struct OidcSettingsDataSource;

#[async_trait]
impl DataSourceAdapter<Client> for OidcSettingsDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        FIELDS.iter().fold(ResourceSchema::new(TYPE_NAME), |schema, field| {
            schema.attribute(AttributeSchema::new(*field, AttributeType::String).computed())
        })
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let settings = client
            .oidc_settings
            .get()
            .await
            .map_err(|e| api_error(TYPE_NAME, "read oidc settings", e))?;
        data.set_id(SINGLETON_ID);
        for (field, value) in FIELDS.iter().zip([
            settings.issuer_url,
            settings.authorization_endpoint,
            settings.token_endpoint,
            settings.jwks_endpoint,
            settings.redirect_url,
            settings.scope,
            settings.userinfo_endpoint,
            settings.openid_configuration_endpoint,
        ]) {
            data.set(*field, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;

    #[tokio::test]
    async fn reads_endpoints_under_fixed_id() {
        let mock = MockApi::new();
        mock.state().oidc.issuer_url = "https://corp.login.banyanops.com".to_string();
        mock.state().oidc.userinfo_endpoint = "https://corp.login.banyanops.com/userinfo".to_string();

        let mut data = ResourceData::new();
        OidcSettingsDataSource.read(&mock.client(), &mut data).await.unwrap();
        assert_eq!(data.id(), Some("singleton"));
        assert_eq!(data.get_string("issuer_url"), "https://corp.login.banyanops.com");
        assert_eq!(data.get_string("userinfo_endpoint"), "https://corp.login.banyanops.com/userinfo");
        assert_eq!(OidcSettingsDataSource.schema().attributes.len(), FIELDS.len());
    }
}
