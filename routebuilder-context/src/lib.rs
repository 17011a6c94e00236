//! # RouteBuilder Context
//!
//! Shared state every route model is built against: the creation-order
//! counter, the id strategy, property placeholders and the context-scoped
//! error handler.

mod config;
mod counter;
mod error_handler;
mod id_factory;
mod properties;

pub use config::ContextConfig;
pub use counter::NodeCounter;
pub use error_handler::{ErrorHandlerDefinition, RedeliveryPolicyDefinition};
pub use id_factory::{
    DefaultNodeIdFactory, IdStrategy, NodeIdFactory, UuidNodeIdFactory,
};
pub use properties::{
    has_placeholder, has_unterminated_placeholder, replace_placeholders, Placeholder,
    PropertiesComponent, PropertiesError, PropertyScope,
};

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Handle to the context a model registry and its routes belong to.
///
/// Cheap to clone; all clones observe the same counter, id factory and error
/// handler.
#[derive(Debug, Clone)]
pub struct ModelContext {
    inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
    name: String,
    counter: Arc<NodeCounter>,
    id_factory: Arc<dyn NodeIdFactory>,
    properties: PropertiesComponent,
    endpoints: BTreeMap<String, String>,
    error_handler: RwLock<Option<ErrorHandlerDefinition>>,
    capture_source_location: bool,
}

impl Default for ModelContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ModelContext {
    /// Context using the process-wide node counter and default ids
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ModelContextBuilder {
        ModelContextBuilder::default()
    }

    /// Builds a context from loaded configuration
    pub fn from_config(config: ContextConfig) -> Self {
        let capture = config.captures_source_location();
        let mut builder = Self::builder()
            .id_factory(config.id_strategy.factory())
            .properties(config.properties)
            .endpoints(config.endpoints)
            .source_location(capture);
        if let Some(name) = config.name {
            builder = builder.name(name);
        }
        if let Some(handler) = config.error_handler {
            builder = builder.error_handler(handler);
        }
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn counter(&self) -> &Arc<NodeCounter> {
        &self.inner.counter
    }

    /// Next creation-order index for a new node
    pub fn next_node_index(&self) -> u64 {
        self.inner.counter.next_index()
    }

    pub fn id_factory(&self) -> &Arc<dyn NodeIdFactory> {
        &self.inner.id_factory
    }

    pub fn properties(&self) -> &PropertiesComponent {
        &self.inner.properties
    }

    /// Resolves placeholders against the context properties
    pub fn resolve_placeholders(
        &self,
        text: &str,
    ) -> Result<String, PropertiesError> {
        self.inner.properties.resolve(text)
    }

    /// Looks up a named endpoint for `ref:` uris
    pub fn endpoint(&self, name: &str) -> Option<&str> {
        self.inner.endpoints.get(name).map(String::as_str)
    }

    /// Current context-scoped error handler (cloned)
    pub fn error_handler(&self) -> Option<ErrorHandlerDefinition> {
        self.inner
            .error_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_error_handler(&self, handler: Option<ErrorHandlerDefinition>) {
        tracing::debug!(context = %self.inner.name, handler = ?handler, "context error handler changed");
        *self
            .inner
            .error_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = handler;
    }

    /// Whether nodes attached through the insertion API record where they were built
    pub fn captures_source_location(&self) -> bool {
        self.inner.capture_source_location
    }
}

/// Builder for [`ModelContext`]
#[derive(Debug, Default)]
pub struct ModelContextBuilder {
    name: Option<String>,
    counter: Option<Arc<NodeCounter>>,
    id_factory: Option<Arc<dyn NodeIdFactory>>,
    properties: BTreeMap<String, String>,
    endpoints: BTreeMap<String, String>,
    error_handler: Option<ErrorHandlerDefinition>,
    capture_source_location: bool,
}

impl ModelContextBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Injects a dedicated counter instead of the process-wide one
    pub fn counter(mut self, counter: Arc<NodeCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    pub fn id_factory(mut self, factory: Arc<dyn NodeIdFactory>) -> Self {
        self.id_factory = Some(factory);
        self
    }

    pub fn property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn endpoint(
        mut self,
        name: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        self.endpoints.insert(name.into(), uri.into());
        self
    }

    pub fn endpoints(mut self, endpoints: BTreeMap<String, String>) -> Self {
        self.endpoints.extend(endpoints);
        self
    }

    pub fn error_handler(mut self, handler: ErrorHandlerDefinition) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn source_location(mut self, enabled: bool) -> Self {
        self.capture_source_location = enabled;
        self
    }

    pub fn build(self) -> ModelContext {
        let name = self
            .name
            .unwrap_or_else(|| format!("context-{}", Uuid::new_v4()));
        ModelContext {
            inner: Arc::new(ContextInner {
                name,
                counter: self.counter.unwrap_or_else(NodeCounter::global),
                id_factory: self
                    .id_factory
                    .unwrap_or_else(|| Arc::new(DefaultNodeIdFactory::new())),
                properties: PropertiesComponent::new(self.properties),
                endpoints: self.endpoints,
                error_handler: RwLock::new(self.error_handler),
                capture_source_location: self.capture_source_location,
            }),
        }
    }
}
