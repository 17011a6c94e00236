//! Route configuration matching and merge.
//!
//! A route names the configurations it wants through a comma separated list
//! of id patterns. Routes without a list get every configuration that has no
//! id or the `*` id.

use routebuilder_context::ModelContext;
use routebuilder_core::helper::parse_bool;
use routebuilder_core::pattern::match_pattern;
use routebuilder_core::{
    CrossCutting, ForeignNode, Result, RouteConfigurationDefinition, RouteDefinition,
};

/// Id patterns requested by `route`.
///
/// Placeholders are resolved with the route's template parameters as a local
/// overlay. Absent ids mean `*`.
pub fn requested_configuration_ids(ctx: &ModelContext, route: &RouteDefinition) -> Result<Vec<String>> {
    let Some(ids) = route.route_configuration_ids() else {
        return Ok(vec!["*".to_string()]);
    };
    let resolved = ctx
        .properties()
        .local_scope(&route.template_parameters)
        .resolve(ids)?;
    Ok(resolved
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect())
}

fn included(ctx: &ModelContext, config: &RouteConfigurationDefinition) -> Result<bool> {
    match &config.precondition {
        Some(precondition) => parse_bool("precondition", &ctx.resolve_placeholders(precondition)?),
        None => Ok(true),
    }
}

/// Configurations applying to `route`.
///
/// Requested ids are walked in the route's declared order; the matches of
/// each id are sorted by `order` (stable for equal orders). A configuration
/// matched by several ids is taken once, at its first match.
pub fn matching_configurations<'a>(
    ctx: &ModelContext,
    configurations: &'a [RouteConfigurationDefinition],
    route: &RouteDefinition,
) -> Result<Vec<&'a RouteConfigurationDefinition>> {
    let declared = route.route_configuration_ids().is_some();
    let ids = requested_configuration_ids(ctx, route)?;

    let mut sorted: Vec<&RouteConfigurationDefinition> = configurations.iter().collect();
    sorted.sort_by_key(|c| c.order);

    let mut matched: Vec<&RouteConfigurationDefinition> = Vec::new();
    for pattern in &ids {
        for &config in &sorted {
            let selected = match (declared, config.id()) {
                (true, Some(id)) => match_pattern(id, pattern),
                (true, None) => false,
                (false, id) => id.map_or(true, |id| id == "*"),
            };
            if !selected || matched.iter().any(|m| std::ptr::eq(*m, config)) {
                continue;
            }
            if included(ctx, config)? {
                matched.push(config);
            }
        }
    }
    Ok(matched)
}

/// Merges the cross-cutting lists of `configurations`.
///
/// Lists accumulate in order; only the last error handler is kept.
pub fn merge_configurations<'a>(configurations: &[&'a RouteConfigurationDefinition]) -> CrossCutting<'a> {
    let mut concerns = CrossCutting::default();
    for &config in configurations {
        let tree = config.tree();
        let foreign = |nodes: Vec<_>| nodes.into_iter().map(|n| ForeignNode::new(tree, n));

        if let Some(handler) = &config.error_handler {
            concerns.error_handler = Some(handler.clone());
        }
        concerns.on_exceptions.extend(foreign(config.on_exceptions()));
        concerns.intercepts.extend(foreign(config.intercepts()));
        concerns.intercept_froms.extend(foreign(config.intercept_froms()));
        concerns
            .intercept_send_to_endpoints
            .extend(foreign(config.intercept_send_to_endpoints()));
        concerns.on_completions.extend(foreign(config.on_completions()));
        concerns
            .applied_configuration_ids
            .push(config.applied_id().to_string());

        tracing::debug!(configuration = config.applied_id(), "route configuration matched");
    }
    concerns
}

/// Matching plus merge for one route
pub fn cross_cutting_for<'a>(
    ctx: &ModelContext,
    configurations: &'a [RouteConfigurationDefinition],
    route: &RouteDefinition,
) -> Result<CrossCutting<'a>> {
    let matched = matching_configurations(ctx, configurations, route)?;
    Ok(merge_configurations(&matched))
}
