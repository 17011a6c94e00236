//! Route id assignment.

use routebuilder_context::ModelContext;
use routebuilder_core::{ModelError, Result, RouteDefinition};
use std::collections::BTreeSet;

const MAX_ID_ATTEMPTS: usize = 1000;

/// Assigns ids to a batch of routes being added.
///
/// Custom ids are placeholder-resolved and must be unique against `known`
/// and each other. Routes without one take the id of their REST verb when
/// it has a free custom id, else a generated `route<n>` that collides with
/// nothing known. `rest:` and `rest-api:` inputs get `routeId=` appended.
pub fn assign_route_ids(
    ctx: &ModelContext,
    routes: &mut [RouteDefinition],
    known: &BTreeSet<String>,
) -> Result<()> {
    let mut taken = known.clone();
    let mut pending = Vec::new();

    for (index, route) in routes.iter_mut().enumerate() {
        if !route.has_custom_id() {
            pending.push(index);
            continue;
        }
        let id = route.id().unwrap_or_default().to_string();
        let id = ctx.resolve_placeholders(&id)?;
        if !taken.insert(id.clone()) {
            return Err(ModelError::DuplicateRouteId(id));
        }
        route.set_id(id);
    }

    for index in pending {
        let route = &mut routes[index];
        match rest_verb_id(ctx, route, &taken)? {
            Some(id) => route.set_id(id.clone()),
            None => {
                let id = generate_route_id(ctx, route, &taken)?;
                tracing::debug!(route_id = %id, "route id auto-assigned");
                route.set_generated_id(id);
            }
        }
        if let Some(id) = route.id() {
            taken.insert(id.to_string());
        }
        append_route_id_to_rest_uri(route);
    }
    Ok(())
}

fn generate_route_id(
    ctx: &ModelContext,
    route: &RouteDefinition,
    taken: &BTreeSet<String>,
) -> Result<String> {
    let factory = ctx.id_factory();
    let short_name = route.tree().kind(route.root()).short_name();
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = factory.create_id(short_name);
        if !taken.contains(&id) {
            return Ok(id);
        }
    }
    Err(ModelError::IdAssignmentExhausted(route.display_name()))
}

/// Custom id of the most specific REST verb bound to the route's input
fn rest_verb_id(
    ctx: &ModelContext,
    route: &RouteDefinition,
    taken: &BTreeSet<String>,
) -> Result<Option<String>> {
    let (Some(rest), Some(uri)) = (route.rest.as_ref(), route.endpoint_uri()) else {
        return Ok(None);
    };
    let Some(id) = rest.find_verb_definition(uri).and_then(|v| v.id.as_deref()) else {
        return Ok(None);
    };
    let id = ctx.resolve_placeholders(id)?;
    Ok((!id.is_empty() && !taken.contains(&id)).then_some(id))
}

fn append_route_id_to_rest_uri(route: &mut RouteDefinition) {
    let Some(id) = route.id().map(str::to_string) else {
        return;
    };
    let Some(input) = route.input_mut() else {
        return;
    };
    let rest = input.uri.starts_with("rest:") || input.uri.starts_with("rest-api:");
    if rest && !input.uri.contains("routeId=") {
        let separator = if input.uri.contains('?') { '&' } else { '?' };
        input.uri = format!("{}{separator}routeId={id}", input.uri);
    }
}
