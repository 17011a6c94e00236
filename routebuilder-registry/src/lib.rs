//! # RouteBuilder Registry
//!
//! Owns route definitions and everything they are prepared against: route
//! configurations, templates, data formats, validators, transformers and
//! resilience configurations. Adding routes runs id assignment,
//! configuration matching and preparation.

mod ids;
mod matching;
mod registry;
mod resources;

#[cfg(test)]
mod tests;

pub use ids::assign_route_ids;
pub use matching::{
    cross_cutting_for, matching_configurations, merge_configurations,
    requested_configuration_ids,
};
pub use registry::{ModelRegistry, RouteFilter};
pub use resources::{
    DataFormatDefinition, ResilienceConfiguration, TransformerDefinition, TransformerKind,
    ValidatorDefinition, ValidatorKind,
};

use anyhow::{Context, Result};
use routebuilder_context::ModelContext;
use routebuilder_core::{RouteConfigurationDefinition, RouteDefinition, RouteTemplateDefinition};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Registry shared between builders running concurrently
pub type SharedRegistry = Arc<Mutex<ModelRegistry>>;

pub fn shared(registry: ModelRegistry) -> SharedRegistry {
    Arc::new(Mutex::new(registry))
}

/// User code producing route definitions for a registry
pub trait RoutesBuilder: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn route_configurations(
        &self,
        _ctx: &ModelContext,
    ) -> routebuilder_core::Result<Vec<RouteConfigurationDefinition>> {
        Ok(Vec::new())
    }

    fn route_templates(
        &self,
        _ctx: &ModelContext,
    ) -> routebuilder_core::Result<Vec<RouteTemplateDefinition>> {
        Ok(Vec::new())
    }

    fn routes(&self, ctx: &ModelContext) -> routebuilder_core::Result<Vec<RouteDefinition>>;
}

impl ModelRegistry {
    /// Ingests everything `builder` produces.
    ///
    /// Configurations and templates go in first so the builder's own routes
    /// are prepared against them. Returns the ids of the added routes.
    pub fn add_routes_from(
        &mut self,
        builder: &dyn RoutesBuilder,
    ) -> routebuilder_core::Result<Vec<String>> {
        let ctx = self.context().clone();
        self.add_route_configurations(builder.route_configurations(&ctx)?);
        for template in builder.route_templates(&ctx)? {
            self.add_route_template(template);
        }
        let routes = builder.routes(&ctx)?;
        tracing::debug!(builder = builder.name(), routes = routes.len(), "routes built");
        self.add_routes(routes)
    }
}

/// Runs `builders` concurrently against one shared registry.
///
/// Building happens in parallel. Registration then takes the lock once:
/// every builder's configurations and templates go in before any route, so a
/// route may name a configuration supplied by another builder. Routes are
/// added as one batch in builder order; returns their ids.
pub async fn add_routes_concurrently(
    registry: &SharedRegistry,
    builders: Vec<Arc<dyn RoutesBuilder>>,
) -> Result<Vec<String>> {
    let ctx = registry.lock().await.context().clone();

    let handles: Vec<_> = builders
        .into_iter()
        .map(|builder| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let configurations = builder.route_configurations(&ctx)?;
                let templates = builder.route_templates(&ctx)?;
                let routes = builder.routes(&ctx)?;
                tracing::debug!(builder = builder.name(), routes = routes.len(), "routes built");
                Ok::<_, routebuilder_core::ModelError>((configurations, templates, routes))
            })
        })
        .collect();

    let mut configurations = Vec::new();
    let mut templates = Vec::new();
    let mut routes = Vec::new();
    for (index, result) in futures::future::join_all(handles).await.into_iter().enumerate() {
        let (built_configurations, built_templates, built_routes) = result
            .with_context(|| format!("routes builder task {index} did not complete"))?
            .with_context(|| format!("routes builder {index} failed"))?;
        configurations.extend(built_configurations);
        templates.extend(built_templates);
        routes.extend(built_routes);
    }

    let mut registry = registry.lock().await;
    registry.add_route_configurations(configurations);
    for template in templates {
        registry.add_route_template(template);
    }
    registry
        .add_routes(routes)
        .with_context(|| "Failed to register built routes")
}

/// Prelude module for registry functionality
pub mod prelude {
    pub use crate::{
        add_routes_concurrently, shared, DataFormatDefinition, ModelRegistry,
        ResilienceConfiguration, RouteFilter, RoutesBuilder, SharedRegistry,
    };
}
