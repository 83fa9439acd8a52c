//! Policy attachments
//!
//! State id is `<policy_id>..<attached_to_type>..<attached_to_id>`. Every
//! attribute forces replacement, so update has nothing to send.

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::attachment::{
    ATTACHED_TO_SAAS_APP, ATTACHED_TO_SERVICE, ATTACHED_TO_SERVICE_TUNNEL, AttachmentPost,
};
use banyan_core::provider::{ProviderError, ProviderResult, ResourceAdapter};
use banyan_core::resource::ResourceData;
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::{api_error, handle_not_found, prepare, require_id};
use crate::ids::PolicyAttachmentId;

const TYPE_NAME: &str = "banyan_policy_attachment";

fn parse_id(raw: &str) -> ProviderResult<PolicyAttachmentId> {
    raw.parse()
        .map_err(|message: String| ProviderError::new(message).for_resource(TYPE_NAME))
}

pub struct PolicyAttachmentResource;

#[async_trait]
impl ResourceAdapter<Client> for PolicyAttachmentResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description("Binds a policy to a service, SaaS app or service tunnel")
            .attribute(AttributeSchema::new("policy_id", AttributeType::String).required().force_new())
            .attribute(
                AttributeSchema::new(
                    "attached_to_type",
                    AttributeType::enumeration(&[
                        ATTACHED_TO_SERVICE,
                        ATTACHED_TO_SAAS_APP,
                        ATTACHED_TO_SERVICE_TUNNEL,
                    ]),
                )
                .required()
                .force_new(),
            )
            .attribute(AttributeSchema::new("attached_to_id", AttributeType::String).required().force_new())
            .attribute(
                AttributeSchema::new("is_enforcing", AttributeType::Bool)
                    .with_default(true)
                    .force_new()
                    .with_description("Enforce the policy; false only reports"),
            )
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        prepare(&self.schema(), data)?;
        let id = PolicyAttachmentId::new(
            data.get_string("policy_id"),
            data.get_string("attached_to_type"),
            data.get_string("attached_to_id"),
        );
        let body = AttachmentPost::new(
            &id.attached_to_type,
            &id.attached_to_id,
            data.get_bool_or("is_enforcing", true),
        );
        client
            .attachment
            .create(&id.policy_id, &body)
            .await
            .map_err(|e| api_error(TYPE_NAME, "attach policy", e))?;
        log::info!("attached policy {} to {} {}", id.policy_id, id.attached_to_type, id.attached_to_id);
        data.set_id(id.to_string());
        self.read(client, data).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = parse_id(&require_id(TYPE_NAME, data)?)?;
        let info = match client.attachment.get(&id.attached_to_id, &id.attached_to_type).await {
            Ok(info) => info,
            Err(err) => return handle_not_found(TYPE_NAME, data, err),
        };
        if info.policy_id != id.policy_id {
            log::warn!(
                "{} {} {} now carries policy {}, removing {} from state",
                TYPE_NAME,
                id.attached_to_type,
                id.attached_to_id,
                info.policy_id,
                id
            );
            data.clear_id();
            return Ok(());
        }

        data.set("policy_id", info.policy_id.clone());
        data.set("attached_to_type", info.attached_to_type.clone());
        data.set("attached_to_id", info.attached_to_id.clone());
        data.set("is_enforcing", info.is_enabled());
        Ok(())
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        log::debug!("{}: nothing to update in place", TYPE_NAME);
        self.read(client, data).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = parse_id(&require_id(TYPE_NAME, data)?)?;
        match client
            .attachment
            .delete(&id.policy_id, &id.attached_to_type, &id.attached_to_id)
            .await
        {
            Ok(()) => log::info!("detached {}", id),
            Err(err) if err.is_not_found() => log::debug!("{} {} already gone", TYPE_NAME, id),
            Err(err) => return Err(api_error(TYPE_NAME, "detach policy", err)),
        }
        data.clear_id();
        Ok(())
    }

    async fn import(&self, client: &Client, id: &str) -> ProviderResult<ResourceData> {
        let parsed = parse_id(id)?;
        let mut data = ResourceData::with_id(id)
            .with_attribute("policy_id", parsed.policy_id)
            .with_attribute("attached_to_type", parsed.attached_to_type)
            .with_attribute("attached_to_id", parsed.attached_to_id);
        self.read(client, &mut data).await?;
        if data.id().is_none() {
            return Err(ProviderError::new(format!("cannot import non-existent object {}", id))
                .for_resource(TYPE_NAME));
        }
        Ok(data)
    }
}
