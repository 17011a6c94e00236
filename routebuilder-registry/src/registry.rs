//! The model registry: owns routes, route configurations, templates and the
//! named definitions routes refer to.

use crate::ids::assign_route_ids;
use crate::matching::cross_cutting_for;
use crate::resources::{
    DataFormatDefinition, ResilienceConfiguration, TransformerDefinition, ValidatorDefinition,
};
use routebuilder_context::ModelContext;
use routebuilder_core::helper::{
    force_assign_node_ids, parse_bool, prune_disabled_nodes, sanity_check_route,
    validate_unique_ids,
};
use routebuilder_core::pattern::{match_endpoint, match_pattern};
use routebuilder_core::{
    prepare_route, ModelError, Result, RouteConfigurationDefinition, RouteDefinition,
    RouteTemplateDefinition,
};
use std::collections::{BTreeMap, BTreeSet};

/// Include / exclude patterns deciding which routes get registered.
///
/// A pattern matches a route by id or by input endpoint. Excludes win over
/// includes; an empty include list accepts everything not excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl RouteFilter {
    /// Builds a filter from comma separated pattern lists
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        let split = |patterns: Option<&str>| -> Vec<String> {
            patterns
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        };
        Self {
            include: split(include),
            exclude: split(exclude),
        }
    }

    pub fn accepts(&self, route: &RouteDefinition) -> bool {
        let matches = |pattern: &String| {
            route.id().is_some_and(|id| match_pattern(id, pattern))
                || route
                    .endpoint_uri()
                    .is_some_and(|uri| match_endpoint(uri, pattern))
        };
        if self.exclude.iter().any(matches) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(matches)
    }
}

/// Storage and lifecycle of route definitions
#[derive(Debug)]
pub struct ModelRegistry {
    ctx: ModelContext,
    routes: Vec<RouteDefinition>,
    configurations: Vec<RouteConfigurationDefinition>,
    templates: Vec<RouteTemplateDefinition>,
    data_formats: BTreeMap<String, DataFormatDefinition>,
    validators: Vec<ValidatorDefinition>,
    transformers: Vec<TransformerDefinition>,
    resilience_configurations: BTreeMap<String, ResilienceConfiguration>,
    route_filter: Option<RouteFilter>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(ModelContext::default())
    }
}

impl ModelRegistry {
    pub fn new(ctx: ModelContext) -> Self {
        Self {
            ctx,
            routes: Vec::new(),
            configurations: Vec::new(),
            templates: Vec::new(),
            data_formats: BTreeMap::new(),
            validators: Vec::new(),
            transformers: Vec::new(),
            resilience_configurations: BTreeMap::new(),
            route_filter: None,
        }
    }

    pub fn context(&self) -> &ModelContext {
        &self.ctx
    }

    pub fn set_route_filter(&mut self, filter: Option<RouteFilter>) {
        self.route_filter = filter;
    }

    // ---- routes ----

    pub fn add_route(&mut self, route: RouteDefinition) -> Result<Vec<String>> {
        self.add_routes(vec![route])
    }

    /// Registers a batch of routes and returns the ids of those added.
    ///
    /// Routes whose precondition resolves to false, or that the route filter
    /// rejects, are skipped. Every other route gets its disabled nodes
    /// pruned, an id, its matching route configurations folded in and its
    /// node ids assigned. Any failure rejects the whole batch and leaves the
    /// registry unchanged.
    pub fn add_routes(&mut self, routes: Vec<RouteDefinition>) -> Result<Vec<String>> {
        let mut batch = Vec::with_capacity(routes.len());
        for mut route in routes {
            if !self.precondition_holds(&route)? {
                tracing::info!(route = %route.display_name(), "route excluded by precondition");
                continue;
            }
            if let Some(filter) = &self.route_filter {
                if !filter.accepts(&route) {
                    tracing::debug!(route = %route.display_name(), "route excluded by filter");
                    continue;
                }
            }
            let root = route.root();
            let pruned = prune_disabled_nodes(&self.ctx, route.tree_mut(), root)?;
            if pruned > 0 {
                tracing::debug!(route = %route.display_name(), pruned, "disabled nodes removed");
            }
            batch.push(route);
        }
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let known: BTreeSet<String> = self
            .routes
            .iter()
            .filter_map(|r| r.id().map(str::to_string))
            .collect();
        assign_route_ids(&self.ctx, &mut batch, &known)?;

        for route in &batch {
            if let Some(id) = validate_unique_ids(route, self.routes.iter().chain(&batch), None) {
                return Err(ModelError::DuplicateNodeId {
                    route: route.display_name(),
                    id,
                });
            }
            sanity_check_route(route)?;
        }
        self.check_startup_orders(&batch)?;

        for route in &mut batch {
            let concerns = cross_cutting_for(&self.ctx, &self.configurations, route)?;
            prepare_route(&self.ctx, route, &concerns)?;
            let root = route.root();
            force_assign_node_ids(&self.ctx, route.tree_mut(), root)?;
        }

        let ids: Vec<String> = batch
            .iter()
            .filter_map(|r| r.id().map(str::to_string))
            .collect();
        for route in &batch {
            tracing::info!(
                route_id = %route.display_name(),
                configurations = ?route.applied_route_configuration_ids(),
                "route added"
            );
        }
        self.routes.append(&mut batch);
        Ok(ids)
    }

    fn precondition_holds(&self, route: &RouteDefinition) -> Result<bool> {
        match &route.precondition {
            Some(precondition) => {
                let resolved = self
                    .ctx
                    .properties()
                    .local_scope(&route.template_parameters)
                    .resolve(precondition)?;
                parse_bool("precondition", &resolved)
            }
            None => Ok(true),
        }
    }

    fn check_startup_orders(&self, batch: &[RouteDefinition]) -> Result<()> {
        let mut used: BTreeMap<i32, String> = self
            .routes
            .iter()
            .filter_map(|r| r.startup_order.map(|order| (order, r.display_name())))
            .collect();
        for route in batch {
            let Some(order) = route.startup_order else {
                continue;
            };
            if let Some(other) = used.get(&order) {
                return Err(ModelError::DuplicateStartupOrder {
                    order,
                    route: route.display_name(),
                    other: other.clone(),
                });
            }
            used.insert(order, route.display_name());
        }
        Ok(())
    }

    pub fn remove_route(&mut self, route_id: &str) -> Option<RouteDefinition> {
        let index = self.routes.iter().position(|r| r.id() == Some(route_id))?;
        let route = self.routes.remove(index);
        tracing::info!(route_id, "route removed");
        Some(route)
    }

    pub fn route(&self, route_id: &str) -> Option<&RouteDefinition> {
        self.routes.iter().find(|r| r.id() == Some(route_id))
    }

    /// Routes in registration order
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn route_ids(&self) -> Vec<&str> {
        self.routes.iter().filter_map(|r| r.id()).collect()
    }

    /// Resets and prepares every registered route again.
    ///
    /// Used after route configurations or properties changed. Stops at the
    /// first failing route; routes before it stay re-prepared and the
    /// failing one is left unprepared.
    pub fn reprepare_routes(&mut self) -> Result<()> {
        let ctx = &self.ctx;
        let configurations = &self.configurations;
        for route in &mut self.routes {
            route.reset_prepare();
            let concerns = cross_cutting_for(ctx, configurations, route)?;
            prepare_route(ctx, route, &concerns)?;
            let root = route.root();
            force_assign_node_ids(ctx, route.tree_mut(), root)?;
        }
        tracing::info!(routes = self.routes.len(), "routes prepared again");
        Ok(())
    }

    /// Routes in start order: explicit startup orders ascending, then the
    /// rest in registration order
    pub fn start_order(&self) -> Vec<&RouteDefinition> {
        let (mut ordered, rest): (Vec<&RouteDefinition>, Vec<&RouteDefinition>) =
            self.routes.iter().partition(|r| r.startup_order.is_some());
        ordered.sort_by_key(|r| r.startup_order);
        ordered.extend(rest);
        ordered
    }

    /// Reverse of [`Self::start_order`]
    pub fn stop_order(&self) -> Vec<&RouteDefinition> {
        let mut order = self.start_order();
        order.reverse();
        order
    }

    // ---- route configurations ----

    /// Adds a route configuration, replacing one with the same id.
    ///
    /// Routes already registered keep their preparation until
    /// [`Self::reprepare_routes`].
    pub fn add_route_configuration(&mut self, configuration: RouteConfigurationDefinition) {
        if let Some(id) = configuration.id() {
            self.configurations.retain(|c| c.id() != Some(id));
        }
        tracing::debug!(configuration = configuration.applied_id(), "route configuration added");
        self.configurations.push(configuration);
    }

    pub fn add_route_configurations(
        &mut self,
        configurations: impl IntoIterator<Item = RouteConfigurationDefinition>,
    ) {
        for configuration in configurations {
            self.add_route_configuration(configuration);
        }
    }

    pub fn remove_route_configuration(&mut self, id: &str) -> Option<RouteConfigurationDefinition> {
        let index = self.configurations.iter().position(|c| c.id() == Some(id))?;
        Some(self.configurations.remove(index))
    }

    pub fn route_configuration(&self, id: &str) -> Option<&RouteConfigurationDefinition> {
        self.configurations.iter().find(|c| c.id() == Some(id))
    }

    pub fn route_configurations(&self) -> &[RouteConfigurationDefinition] {
        &self.configurations
    }

    // ---- route templates ----

    /// Adds a route template, replacing one with the same id
    pub fn add_route_template(&mut self, template: RouteTemplateDefinition) {
        self.templates.retain(|t| t.id != template.id);
        tracing::debug!(template = %template.id, "route template added");
        self.templates.push(template);
    }

    pub fn remove_route_template(&mut self, id: &str) -> Option<RouteTemplateDefinition> {
        let index = self.templates.iter().position(|t| t.id == id)?;
        Some(self.templates.remove(index))
    }

    /// Removes every template whose id matches `pattern`; returns how many
    pub fn remove_route_templates(&mut self, pattern: &str) -> usize {
        let before = self.templates.len();
        self.templates.retain(|t| !match_pattern(&t.id, pattern));
        before - self.templates.len()
    }

    pub fn route_template(&self, id: &str) -> Option<&RouteTemplateDefinition> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn route_templates(&self) -> &[RouteTemplateDefinition] {
        &self.templates
    }

    /// Instantiates a template and registers the resulting route.
    ///
    /// Returns the route id, or `None` when the route's precondition
    /// excluded it.
    pub fn add_route_from_template(
        &mut self,
        route_id: Option<&str>,
        template_id: &str,
        parameters: &BTreeMap<String, String>,
    ) -> Result<Option<String>> {
        let template = self
            .route_template(template_id)
            .ok_or_else(|| ModelError::unresolved("route template", template_id))?;
        let mut route = template.instantiate(parameters)?;
        if let Some(id) = route_id {
            route.set_id(id);
        }
        tracing::info!(template = template_id, route_id = ?route_id, "route template instantiated");
        Ok(self.add_routes(vec![route])?.into_iter().next())
    }

    // ---- named definitions ----

    pub fn add_data_format(&mut self, data_format: DataFormatDefinition) {
        self.data_formats.insert(data_format.name.clone(), data_format);
    }

    pub fn data_format(&self, name: &str) -> Result<&DataFormatDefinition> {
        self.data_formats
            .get(name)
            .ok_or_else(|| ModelError::unresolved("data format", name))
    }

    pub fn data_formats(&self) -> impl Iterator<Item = &DataFormatDefinition> {
        self.data_formats.values()
    }

    pub fn add_validator(&mut self, validator: ValidatorDefinition) {
        self.validators.retain(|v| v.data_type != validator.data_type);
        self.validators.push(validator);
    }

    pub fn validator(&self, data_type: &str) -> Result<&ValidatorDefinition> {
        self.validators
            .iter()
            .find(|v| v.data_type == data_type)
            .ok_or_else(|| ModelError::unresolved("validator", data_type))
    }

    pub fn validators(&self) -> &[ValidatorDefinition] {
        &self.validators
    }

    pub fn add_transformer(&mut self, transformer: TransformerDefinition) {
        self.transformers.push(transformer);
    }

    /// Transformer for `from` to `to`: an exact pair first, then one declared
    /// for the scheme of either type
    pub fn transformer(&self, from: &str, to: &str) -> Result<&TransformerDefinition> {
        self.transformers
            .iter()
            .find(|t| t.matches(from, to))
            .or_else(|| self.transformers.iter().find(|t| t.matches_scheme(from, to)))
            .ok_or_else(|| ModelError::unresolved("transformer", format!("{from} -> {to}")))
    }

    pub fn transformers(&self) -> &[TransformerDefinition] {
        &self.transformers
    }

    pub fn add_resilience_configuration(&mut self, configuration: ResilienceConfiguration) {
        self.resilience_configurations
            .insert(configuration.id.clone(), configuration);
    }

    pub fn resilience_configuration(&self, id: &str) -> Result<&ResilienceConfiguration> {
        self.resilience_configurations
            .get(id)
            .ok_or_else(|| ModelError::unresolved("resilience configuration", id))
    }

    pub fn resilience_configurations(&self) -> impl Iterator<Item = &ResilienceConfiguration> {
        self.resilience_configurations.values()
    }
}
