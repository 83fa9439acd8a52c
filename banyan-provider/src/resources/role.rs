//! Roles

use async_trait::async_trait;
use banyan_client::Client;
use banyan_client::role::{
    API_VERSION, ROLE_KIND, ROLE_TEMPLATE, ROLE_TYPE, RoleDocument, RoleInfo, RoleMetadata, RoleSpec, RoleTags,
};
use banyan_core::provider::{ProviderResult, ResourceAdapter};
use banyan_core::resource::{ResourceData, Value};
use banyan_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::helpers::{api_error, handle_not_found, prepare, require_id};

const TYPE_NAME: &str = "banyan_role";

const DEVICE_OWNERSHIP: &[&str] = &["Corporate Dedicated", "Corporate Shared", "Employee Owned", "Other"];
const PLATFORMS: &[&str] = &["Windows", "macOS", "Linux", "iOS", "Android", "Unregistered"];

/// Selector attributes shared by the resource and the data source
pub(crate) const SELECTORS: &[&str] = &[
    "user_group",
    "email",
    "device_ownership",
    "platform",
    "container_fqdn",
    "image",
    "repo_tag",
    "service_account",
];

pub(crate) fn expand(data: &ResourceData) -> RoleDocument {
    RoleDocument {
        api_version: API_VERSION.to_string(),
        kind: ROLE_KIND.to_string(),
        role_type: ROLE_TYPE.to_string(),
        metadata: RoleMetadata {
            name: data.get_string("name"),
            description: data.get_string("description"),
            tags: RoleTags {
                template: ROLE_TEMPLATE.to_string(),
            },
        },
        spec: RoleSpec {
            known_device_only: data.get_bool_or("known_device_only", false),
            platform: data.get_string_set("platform"),
            group: data.get_string_set("user_group"),
            email: data.get_string_set("email"),
            device_ownership: data.get_string_set("device_ownership"),
            mdm_present: data.get_bool_or("mdm_present", false),
            container_fqdn: data.get_string_set("container_fqdn"),
            image: data.get_string_set("image"),
            repo_tag: data.get_string_set("repo_tag"),
            service_account: data.get_string_set("service_account"),
        },
    }
}

pub(crate) fn flatten(role: &RoleInfo, data: &mut ResourceData) {
    let spec = &role.spec.spec;
    data.set("name", role.name.clone());
    data.set("description", role.description.clone());
    data.set("known_device_only", spec.known_device_only);
    data.set("mdm_present", spec.mdm_present);
    for (key, values) in [
        ("user_group", &spec.group),
        ("email", &spec.email),
        ("device_ownership", &spec.device_ownership),
        ("platform", &spec.platform),
        ("container_fqdn", &spec.container_fqdn),
        ("image", &spec.image),
        ("repo_tag", &spec.repo_tag),
        ("service_account", &spec.service_account),
    ] {
        data.set(key, Value::string_set(values.clone()));
    }
}

pub struct RoleResource;

#[async_trait]
impl ResourceAdapter<Client> for RoleResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        let mut schema = ResourceSchema::new(TYPE_NAME)
            .with_description("Set of users, devices or workloads a policy applies to")
            .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
            .attribute(AttributeSchema::new("description", AttributeType::String))
            .attribute(AttributeSchema::new("known_device_only", AttributeType::Bool).with_default(false))
            .attribute(AttributeSchema::new("mdm_present", AttributeType::Bool).with_default(false));
        for selector in SELECTORS {
            let attr_type = match *selector {
                "device_ownership" => AttributeType::set(AttributeType::enumeration(DEVICE_OWNERSHIP)),
                "platform" => AttributeType::set(AttributeType::enumeration(PLATFORMS)),
                _ => AttributeType::string_set(),
            };
            schema = schema.attribute(AttributeSchema::new(*selector, attr_type));
        }
        schema
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        prepare(&self.schema(), data)?;
        let role = client
            .role
            .create(&expand(data))
            .await
            .map_err(|e| api_error(TYPE_NAME, "create role", e))?;
        data.set_id(role.id.clone());
        self.read(client, data).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.role.get(&id).await {
            Ok(role) => {
                flatten(&role, data);
                Ok(())
            }
            Err(err) => handle_not_found(TYPE_NAME, data, err),
        }
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        prepare(&self.schema(), data)?;
        client
            .role
            .update(&id, &expand(data))
            .await
            .map_err(|e| api_error(TYPE_NAME, "update role", e))?;
        self.read(client, data).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> ProviderResult<()> {
        let id = require_id(TYPE_NAME, data)?;
        match client.role.delete(&id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => log::debug!("{} {} already gone", TYPE_NAME, id),
            Err(err) => return Err(api_error(TYPE_NAME, "delete role", err)),
        }
        data.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use banyan_core::differ::{Diff, diff};

    #[tokio::test]
    async fn selectors_round_trip() {
        let mock = MockApi::new();
        let client = mock.client();
        let desired = ResourceData::new()
            .with_attribute("name", "engineers")
            .with_attribute("user_group", Value::string_list(["eng", "admins"]))
            .with_attribute("platform", Value::string_set(["macOS", "Linux"]))
            .with_attribute("known_device_only", true);
        let mut data = desired.clone();
        RoleResource.create(&client, &mut data).await.unwrap();

        let doc = mock.state().roles["role-1"].clone();
        assert_eq!(doc.spec.group, vec!["admins", "eng"]);
        assert_eq!(doc.metadata.tags.template, "USER");
        assert_eq!(diff(&RoleResource.schema(), desired.attributes(), Some(&data)), Diff::NoChange);
    }

    #[tokio::test]
    async fn platform_must_be_known() {
        let mock = MockApi::new();
        let mut data = ResourceData::new()
            .with_attribute("name", "r")
            .with_attribute("platform", Value::string_set(["BeOS"]));
        assert!(RoleResource.create(&mock.client(), &mut data).await.is_err());
    }

    #[test]
    fn renaming_forces_replacement() {
        let current = ResourceData::with_id("role-1").with_attribute("name", "old");
        let desired = ResourceData::new().with_attribute("name", "new");
        assert!(matches!(
            diff(&RoleResource.schema(), desired.attributes(), Some(&current)),
            Diff::Replace { .. }
        ));
    }
}
