//! Read-only lookups
//!
//! Role and policy lookups reuse the matching resource's flatten and expose
//! its attributes as computed values keyed by `name`.

mod oidc_settings;
mod policy;
mod role;

pub use oidc_settings::OidcSettingsDataSource;
pub use policy::PolicyDataSource;
pub use role::RoleDataSource;

use banyan_core::provider::{ProviderError, ProviderResult};
use banyan_core::resource::ResourceData;
use banyan_core::schema::ResourceSchema;

/// Resource schema turned into a lookup: `name` in, everything else out
fn lookup_schema(mut schema: ResourceSchema) -> ResourceSchema {
    for attr in schema.attributes.values_mut() {
        let is_key = attr.name == "name";
        attr.required = is_key;
        attr.computed = !is_key;
        attr.optional = false;
        attr.default = None;
        attr.force_new = false;
        attr.conflicts_with.clear();
        attr.deprecated = None;
    }
    schema
}

/// The lookup key every named data source needs
fn lookup_name(resource_type: &str, data: &ResourceData) -> ProviderResult<String> {
    data.get_str("name")
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::new("name is required").for_resource(resource_type))
}
