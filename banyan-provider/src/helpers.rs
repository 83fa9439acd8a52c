//! Glue shared by every adapter: error mapping, not-found handling and
//! bag-level checks

use std::collections::HashMap;

use banyan_client::ClientError;
use banyan_core::provider::{ProviderError, ProviderResult};
use banyan_core::resource::{ResourceData, Value};
use banyan_core::schema::ResourceSchema;

/// Wrap a client failure with the resource type and what was being done
pub fn api_error(resource_type: &str, action: &str, err: ClientError) -> ProviderError {
    ProviderError::new(format!("failed to {}", action))
        .for_resource(resource_type)
        .with_cause(err)
}

/// Treat "resource gone" as a signal to recreate: clear the id and succeed
///
/// Any other error is surfaced.
pub fn handle_not_found(
    resource_type: &str,
    data: &mut ResourceData,
    err: ClientError,
) -> ProviderResult<()> {
    if err.is_not_found() {
        log::warn!(
            "{} {} no longer exists, removing from state",
            resource_type,
            data.id().unwrap_or_default()
        );
        data.clear_id();
        Ok(())
    } else {
        Err(api_error(resource_type, "read", err))
    }
}

/// Identifier a lifecycle handler needs before it can talk to the API
pub fn require_id(resource_type: &str, data: &ResourceData) -> ProviderResult<String> {
    data.id()
        .map(str::to_string)
        .ok_or_else(|| ProviderError::new("resource has no id").for_resource(resource_type))
}

/// Run schema validation over the bag, logging warnings
///
/// Server-computed attributes carried over from state are not user input
/// and are left out.
pub fn validate(schema: &ResourceSchema, data: &ResourceData) -> ProviderResult<()> {
    let input: HashMap<String, Value> = data
        .attributes()
        .iter()
        .filter(|(name, _)| schema.get(name).is_none_or(|a| a.user_settable()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    match schema.validate(&input) {
        Ok(warnings) => {
            for warning in warnings {
                log::warn!("{}: {}", schema.resource_type, warning);
            }
            Ok(())
        }
        Err(errors) => {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            Err(ProviderError::new(format!("invalid configuration: {}", message))
                .for_resource(schema.resource_type.clone()))
        }
    }
}

/// Fail when both members of a mutually exclusive pair are set
pub fn check_exclusive(
    resource_type: &str,
    data: &ResourceData,
    first: &str,
    second: &str,
) -> ProviderResult<()> {
    if data.contains(first) && data.contains(second) {
        return Err(ProviderError::new(format!(
            "only one of {} or {} may be set",
            first, second
        ))
        .for_resource(resource_type));
    }
    Ok(())
}

/// Build one nested block element, leaving out empty members
pub fn block<const N: usize>(members: [(&str, Value); N]) -> HashMap<String, Value> {
    members
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Bag value for a list of nested blocks
pub fn blocks_value(items: impl IntoIterator<Item = HashMap<String, Value>>) -> Value {
    Value::List(items.into_iter().map(Value::Map).collect())
}

/// Prepare a bag for create/update: defaults, then validation
pub fn prepare(schema: &ResourceSchema, data: &mut ResourceData) -> ProviderResult<()> {
    schema.apply_defaults(data);
    validate(schema, data)
}
