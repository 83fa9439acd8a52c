//! SCIM provisioning switch
//!
//! A tenant singleton. While enabled the server owns the id and a bearer
//! token is minted once; the token is only returned at creation. A disabled
//! SCIM has no server object, so it is tracked under a random id until it is
//! switched on. Tokens are revoked one by one before SCIM is switched off.

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::scim::ScimInfo;
use banyan_core::provider::{ProviderResult, ResourceAdapter};
use banyan_core::resource::{BlockExt, ResourceData, Value};
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use uuid::Uuid;

use crate::helpers::{api_error, block, blocks_value, prepare, require_id};

const TYPE_NAME: &str = "banyan_scim";

/// Revoke every token recorded in `token_infos`
async fn revoke_tokens(client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
    let uuids: Vec<String> = data
        .get_blocks("token_infos")
        .into_iter()
        .map(|t| t.string("uuid"))
        .filter(|uuid| !uuid.is_empty())
        .collect();
    for uuid in uuids {
        client
            .scim
            .delete_token(&uuid)
            .await
            .map_err(|e| api_error(TYPE_NAME, "revoke scim token", e))?;
        log::info!("{}: revoked token {}", TYPE_NAME, uuid);
    }
    data.remove("token_infos");
    data.remove("token");
    Ok(())
}

fn flatten(info: &ScimInfo, data: &mut ResourceData) {
    data.set("is_enabled", info.is_enabled);
    data.set("base_url", info.base_url.clone());
    let tokens = info.token_infos.iter().map(|t| {
        block([
            ("uuid", t.uuid.clone().into()),
            ("created_at", Value::Int(t.created_at)),
        ])
    });
    data.set("token_infos", blocks_value(tokens));
}

pub struct ScimResource;

impl ScimResource {
    async fn write(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        prepare(&self.schema(), data)?;
        let enabled = data.get_bool_or("is_enabled", false);
        if !enabled {
            revoke_tokens(client, data).await?;
        }
        let info = client
            .scim
            .set_enabled(enabled)
            .await
            .map_err(|e| api_error(TYPE_NAME, "set scim state", e))?;

        if enabled && !info.id.is_empty() {
            data.set_id(info.id.clone());
        } else if data.id().is_none() {
            data.set_id(Uuid::new_v4().to_string());
        }

        if enabled && data.get_string("token").is_empty() {
            let token = client
                .scim
                .create_token()
                .await
                .map_err(|e| api_error(TYPE_NAME, "create scim token", e))?;
            log::info!("{}: created token {}", TYPE_NAME, token.uuid);
            data.set("token", token.token);
        }

        self.read(client, data).await
    }
}

#[async_trait]
impl ResourceAdapter<Client> for ScimResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description("SCIM user provisioning for the tenant")
            .attribute(AttributeSchema::new("is_enabled", AttributeType::Bool).required())
            .attribute(AttributeSchema::new("base_url", AttributeType::String).computed())
            .attribute(AttributeSchema::new("token", AttributeType::String).computed().sensitive())
            .attribute(
                AttributeSchema::new(
                    "token_infos",
                    AttributeType::block(vec![
                        AttributeSchema::new("uuid", AttributeType::String),
                        AttributeSchema::new("created_at", AttributeType::Int),
                    ]),
                )
                .computed(),
            )
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        self.write(client, data).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        require_id(TYPE_NAME, data)?;
        let info = client
            .scim
            .get()
            .await
            .map_err(|e| api_error(TYPE_NAME, "read scim", e))?;
        flatten(&info, data);
        Ok(())
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        require_id(TYPE_NAME, data)?;
        self.write(client, data).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        revoke_tokens(client, data).await?;
        client
            .scim
            .set_enabled(false)
            .await
            .map_err(|e| api_error(TYPE_NAME, "disable scim", e))?;
        data.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;

    fn scim_calls(mock: &MockApi) -> Vec<String> {
        mock.calls().into_iter().filter(|c| c.starts_with("scim.")).collect()
    }

    #[tokio::test]
    async fn disabled_scim_gets_a_random_id() {
        let mock = MockApi::new();
        let mut data = ResourceData::new().with_attribute("is_enabled", false);
        ScimResource.create(&mock.client(), &mut data).await.unwrap();

        let id = data.id().unwrap();
        assert!(Uuid::parse_str(id).is_ok(), "{}", id);
        assert!(mock.position("scim.create_token").is_none());
        assert!(!data.contains("token"));
    }

    #[tokio::test]
    async fn enabled_scim_uses_server_id_and_mints_one_token() {
        let mock = MockApi::new();
        let client = mock.client();
        let mut data = ResourceData::new().with_attribute("is_enabled", true);
        ScimResource.create(&client, &mut data).await.unwrap();

        assert_eq!(data.id(), Some("scim-tenant"));
        assert_eq!(data.get_string("token"), "bearer-tok-1");
        assert_eq!(data.get_string("base_url"), "https://scim.example.com/v2");
        assert_eq!(data.get_blocks("token_infos").len(), 1);

        ScimResource.update(&client, &mut data).await.unwrap();
        assert_eq!(mock.calls().iter().filter(|c| *c == "scim.create_token").count(), 1);
        assert_eq!(data.get_string("token"), "bearer-tok-1");
    }

    #[tokio::test]
    async fn delete_disables() {
        let mock = MockApi::new();
        let client = mock.client();
        let mut data = ResourceData::new().with_attribute("is_enabled", true);
        ScimResource.create(&client, &mut data).await.unwrap();
        ScimResource.delete(&client, &mut data).await.unwrap();
        assert_eq!(data.id(), None);
        assert!(!mock.state().scim.is_enabled);
    }

    #[tokio::test]
    async fn enabling_later_switches_to_the_server_id() {
        let mock = MockApi::new();
        let client = mock.client();
        let mut data = ResourceData::new().with_attribute("is_enabled", false);
        ScimResource.create(&client, &mut data).await.unwrap();
        assert!(Uuid::parse_str(data.id().unwrap()).is_ok());

        data.set("is_enabled", true);
        ScimResource.update(&client, &mut data).await.unwrap();
        assert_eq!(data.id(), Some("scim-tenant"));
        assert_eq!(data.get_string("token"), "bearer-tok-1");
    }

    #[tokio::test]
    async fn tokens_are_revoked_before_switching_off() {
        let mock = MockApi::new();
        let client = mock.client();
        let mut data = ResourceData::new().with_attribute("is_enabled", true);
        ScimResource.create(&client, &mut data).await.unwrap();

        mock.clear_calls();
        data.set("is_enabled", false);
        ScimResource.update(&client, &mut data).await.unwrap();
        assert_eq!(
            scim_calls(&mock),
            vec!["scim.delete_token tok-1", "scim.set_enabled false", "scim.get"]
        );
        assert!(!data.contains("token"));
        assert_eq!(data.id(), Some("scim-tenant"));

        data.set("is_enabled", true);
        ScimResource.update(&client, &mut data).await.unwrap();
        assert_eq!(data.get_string("token"), "bearer-tok-2");

        mock.clear_calls();
        ScimResource.delete(&client, &mut data).await.unwrap();
        assert_eq!(
            scim_calls(&mock),
            vec!["scim.delete_token tok-2", "scim.set_enabled false"]
        );
        assert_eq!(data.id(), None);
    }
}
