//! Provider - Traits the host framework drives
//!
//! A provider publishes resource adapters and data-source adapters under
//! stable type names. The host calls them with a per-resource attribute bag
//! and a root handle `M` returned by the provider's configure step.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::resource::ResourceData;
use crate::schema::ResourceSchema;

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    /// Resource type the error was raised for (e.g., "banyan_service_web")
    pub resource_type: Option<String>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.resource_type, &self.cause) {
            (Some(t), Some(cause)) => write!(f, "[{}] {}: {}", t, self.message, cause),
            (Some(t), None) => write!(f, "[{}] {}", t, self.message),
            (None, Some(cause)) => write!(f, "{}: {}", self.message, cause),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_type: None,
            cause: None,
        }
    }

    pub fn for_resource(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// A managed resource kind
///
/// Each handler receives the bag the host planned and mutates it in place.
/// Handlers either leave an identifier in the bag and return `Ok`, or return
/// with no identifier, which the host reads as "gone".
#[async_trait]
pub trait ResourceAdapter<M: Send + Sync>: Send + Sync {
    /// Stable type name (e.g., "banyan_service_web")
    fn type_name(&self) -> &'static str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema;

    async fn create(&self, meta: &M, data: &mut ResourceData) -> ProviderResult<()>;

    /// Refresh the bag from the remote side
    ///
    /// A resource that no longer exists clears the identifier and returns `Ok`.
    async fn read(&self, meta: &M, data: &mut ResourceData) -> ProviderResult<()>;

    async fn update(&self, meta: &M, data: &mut ResourceData) -> ProviderResult<()>;

    async fn delete(&self, meta: &M, data: &mut ResourceData) -> ProviderResult<()>;

    /// Adopt an existing remote object into state
    async fn import(&self, meta: &M, id: &str) -> ProviderResult<ResourceData> {
        let mut data = ResourceData::with_id(id);
        self.read(meta, &mut data).await?;
        if data.id().is_none() {
            return Err(ProviderError::new(format!("cannot import non-existent object {}", id))
                .for_resource(self.type_name()));
        }
        Ok(data)
    }
}

/// A read-only data source
#[async_trait]
pub trait DataSourceAdapter<M: Send + Sync>: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    async fn read(&self, meta: &M, data: &mut ResourceData) -> ProviderResult<()>;
}

/// Everything a provider exposes to the host
pub struct ProviderDescriptor<M: Send + Sync> {
    pub name: &'static str,
    /// Provider-level configuration block
    pub config_schema: ResourceSchema,
    resources: BTreeMap<&'static str, Arc<dyn ResourceAdapter<M>>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSourceAdapter<M>>>,
}

impl<M: Send + Sync> ProviderDescriptor<M> {
    pub fn new(name: &'static str, config_schema: ResourceSchema) -> Self {
        Self {
            name,
            config_schema,
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        }
    }

    pub fn with_resource(mut self, adapter: impl ResourceAdapter<M> + 'static) -> Self {
        self.resources.insert(adapter.type_name(), Arc::new(adapter));
        self
    }

    pub fn with_data_source(mut self, adapter: impl DataSourceAdapter<M> + 'static) -> Self {
        self.data_sources.insert(adapter.type_name(), Arc::new(adapter));
        self
    }

    pub fn resource(&self, type_name: &str) -> Option<Arc<dyn ResourceAdapter<M>>> {
        self.resources.get(type_name).cloned()
    }

    pub fn data_source(&self, type_name: &str) -> Option<Arc<dyn DataSourceAdapter<M>>> {
        self.data_sources.get(type_name).cloned()
    }

    pub fn resource_names(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    pub fn data_source_names(&self) -> Vec<&'static str> {
        self.data_sources.keys().copied().collect()
    }
}
