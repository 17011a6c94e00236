//! Route preparation.
//!
//! Folds the cross-cutting nodes of a route (its own top-level abstract
//! nodes plus those contributed by matching route configurations) into the
//! route's output list, producing the final layout:
//!
//! ```text
//! [on-exceptions..., interceptors..., on-completions..., regular outputs...]
//! ```
//!
//! where the regular outputs may be wrapped by a single saga and/or a
//! single transacted node.

use crate::error::{ModelError, Result};
use crate::kind::NodeKind;
use crate::node::NodeId;
use crate::pattern::match_endpoint;
use crate::route::RouteDefinition;
use crate::tree::NodeTree;
use routebuilder_context::{ErrorHandlerDefinition, ModelContext};

/// A node living in another tree (usually a route configuration)
#[derive(Debug, Clone, Copy)]
pub struct ForeignNode<'a> {
    pub tree: &'a NodeTree,
    pub node: NodeId,
}

impl<'a> ForeignNode<'a> {
    pub fn new(tree: &'a NodeTree, node: NodeId) -> Self {
        Self { tree, node }
    }
}

/// Cross-cutting definitions to apply while preparing one route.
///
/// Lists keep the order in which matching configurations contributed them.
#[derive(Debug, Clone, Default)]
pub struct CrossCutting<'a> {
    pub error_handler: Option<ErrorHandlerDefinition>,
    pub on_exceptions: Vec<ForeignNode<'a>>,
    pub intercepts: Vec<ForeignNode<'a>>,
    pub intercept_froms: Vec<ForeignNode<'a>>,
    pub intercept_send_to_endpoints: Vec<ForeignNode<'a>>,
    pub on_completions: Vec<ForeignNode<'a>>,
    /// Configuration ids recorded on the route once prepared
    pub applied_configuration_ids: Vec<String>,
}

impl CrossCutting<'_> {
    pub fn is_empty(&self) -> bool {
        self.error_handler.is_none()
            && self.on_exceptions.is_empty()
            && self.intercepts.is_empty()
            && self.intercept_froms.is_empty()
            && self.intercept_send_to_endpoints.is_empty()
            && self.on_completions.is_empty()
    }
}

/// Prepares `route` for use.
///
/// Runs at most once per route: a second call without
/// [`RouteDefinition::reset_prepare`] is a no-op returning `Ok(false)`.
/// On failure the route is restored to its authored state and left
/// unprepared.
pub fn prepare_route(
    ctx: &ModelContext,
    route: &mut RouteDefinition,
    concerns: &CrossCutting<'_>,
) -> Result<bool> {
    if !route.prepared_flag().try_begin() {
        tracing::debug!(route = %route.display_name(), "route already prepared");
        return Ok(false);
    }
    route.remember_authored();

    match prepare_route_imp(ctx, route, concerns) {
        Ok(()) => {
            for id in &concerns.applied_configuration_ids {
                route.add_applied_route_configuration_id(id.clone());
            }
            route.prepared_flag().finish();
            Ok(true)
        }
        Err(e) => {
            tracing::warn!(route = %route.display_name(), error = %e, "route preparation failed");
            route.reset_prepare();
            Err(e)
        }
    }
}

fn prepare_route_imp(
    ctx: &ModelContext,
    route: &mut RouteDefinition,
    concerns: &CrossCutting<'_>,
) -> Result<()> {
    let root = route.root();
    route.tree_mut().init_parent(root);

    let (abstracts, mut lower): (Vec<NodeId>, Vec<NodeId>) = route
        .outputs()
        .iter()
        .partition(|&&n| route.tree().kind(n).is_abstract());

    match &concerns.error_handler {
        Some(handler) => route.set_error_handler_if_none(handler.clone()),
        None => {
            if let Some(handler) = ctx.error_handler() {
                route.set_error_handler_if_none(handler);
            }
        }
    }

    validate_top_level(route.tree(), root)?;

    let mut upper = Vec::new();
    init_interceptors(ctx, route, &abstracts, &mut upper, concerns)?;
    let completions = init_on_completions(route.tree_mut(), &abstracts, &mut upper, concerns);

    let name = route.display_name();
    wrap_lower(
        route.tree_mut(),
        &abstracts,
        &mut lower,
        |k| matches!(k, NodeKind::Saga { .. }),
        || ModelError::MultipleSagas { route: name.clone() },
    )?;
    wrap_lower(
        route.tree_mut(),
        &abstracts,
        &mut lower,
        |k| matches!(k, NodeKind::Transacted { .. }),
        || ModelError::MultipleTransacted { route: name.clone() },
    )?;

    let on_exceptions = init_on_exceptions(route.tree_mut(), &abstracts, &mut upper, concerns);

    let mut outputs = upper;
    outputs.append(&mut lower);
    let tree = route.tree_mut();
    tree.clear_outputs(root);
    tree.replace_outputs(root, outputs);

    tracing::info!(
        route = %name,
        on_exceptions,
        on_completions = completions,
        outputs = route.outputs().len(),
        "route prepared"
    );
    Ok(())
}

/// Top-level-only nodes must sit directly under the route
fn validate_top_level(tree: &NodeTree, root: NodeId) -> Result<()> {
    for node in tree.descendants(root) {
        if node == root || !tree.kind(node).is_top_level_only() {
            continue;
        }
        let parent_is_root = tree.parent(node).map_or(true, |p| tree.kind(p).is_root());
        if !parent_is_root {
            return Err(ModelError::TopLevelOnly {
                node: tree.kind(node).label(),
            });
        }
    }
    Ok(())
}

fn import_all(tree: &mut NodeTree, foreign: &[ForeignNode<'_>]) -> Vec<NodeId> {
    foreign
        .iter()
        .map(|f| tree.import_subtree(f.tree, f.node))
        .collect()
}

fn of_kind(tree: &NodeTree, nodes: &[NodeId], pred: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
    nodes
        .iter()
        .copied()
        .filter(|&n| pred(tree.kind(n)))
        .collect()
}

/// Every interceptor is inserted at the front of `upper`, so later ones end
/// up first: intercepts, then matching intercept-froms, then
/// intercept-send-to-endpoints, each group with configuration ones before
/// the route's own.
fn init_interceptors(
    ctx: &ModelContext,
    route: &mut RouteDefinition,
    abstracts: &[NodeId],
    upper: &mut Vec<NodeId>,
    concerns: &CrossCutting<'_>,
) -> Result<()> {
    let tree = route.tree_mut();
    let mut intercepts = import_all(tree, &concerns.intercepts);
    intercepts.extend(of_kind(tree, abstracts, |k| matches!(k, NodeKind::Intercept { .. })));
    let mut intercept_froms = import_all(tree, &concerns.intercept_froms);
    intercept_froms.extend(of_kind(tree, abstracts, |k| {
        matches!(k, NodeKind::InterceptFrom { .. })
    }));
    let mut send_tos = import_all(tree, &concerns.intercept_send_to_endpoints);
    send_tos.extend(of_kind(tree, abstracts, |k| {
        matches!(k, NodeKind::InterceptSendToEndpoint { .. })
    }));

    for intercept in intercepts {
        upper.insert(0, intercept);
    }
    for intercept in intercept_froms {
        if intercept_from_matches(ctx, route, intercept)? {
            upper.insert(0, intercept);
        }
    }
    for intercept in send_tos {
        upper.insert(0, intercept);
    }
    Ok(())
}

/// Whether an intercept-from applies to the route's input endpoint.
///
/// No uri matches every route. A `ref:` input is resolved to the endpoint it
/// names unless the pattern itself targets references.
fn intercept_from_matches(
    ctx: &ModelContext,
    route: &RouteDefinition,
    intercept: NodeId,
) -> Result<bool> {
    let NodeKind::InterceptFrom { uri: Some(pattern), .. } = route.tree().kind(intercept) else {
        return Ok(true);
    };
    let Some(input) = route.endpoint_uri() else {
        return Ok(false);
    };

    let pattern = ctx.resolve_placeholders(pattern)?;
    let ref_pattern = pattern.starts_with("ref*") || pattern.starts_with("ref:");

    let mut uri = input.to_string();
    if !ref_pattern {
        if let Some(name) = input.strip_prefix("ref:") {
            uri = ctx
                .endpoint(name)
                .ok_or_else(|| ModelError::unresolved("endpoint", name))?
                .to_string();
        }
    }
    let uri = ctx
        .properties()
        .local_scope(&route.template_parameters)
        .resolve(&uri)?;

    Ok(match_endpoint(&uri, &pattern))
}

/// Route-scoped on-completions win; configuration ones apply only when the
/// route declares none. Returns how many were added.
fn init_on_completions(
    tree: &mut NodeTree,
    abstracts: &[NodeId],
    upper: &mut Vec<NodeId>,
    concerns: &CrossCutting<'_>,
) -> usize {
    let mut completions = of_kind(tree, abstracts, |k| matches!(k, NodeKind::OnCompletion { .. }));
    if completions.is_empty() {
        completions = import_all(tree, &concerns.on_completions);
        for &global in &completions {
            tree.kind_mut(global).set_route_scoped(false);
        }
    }
    upper.extend_from_slice(&completions);
    completions.len()
}

/// Moves all regular outputs under the single wrapper of the given kind
fn wrap_lower(
    tree: &mut NodeTree,
    abstracts: &[NodeId],
    lower: &mut Vec<NodeId>,
    pred: impl Fn(&NodeKind) -> bool,
    too_many: impl FnOnce() -> ModelError,
) -> Result<()> {
    let wrappers = of_kind(tree, abstracts, pred);
    match wrappers.as_slice() {
        [] => Ok(()),
        [wrapper] => {
            let mut outputs = std::mem::take(lower);
            outputs.extend_from_slice(tree.outputs(*wrapper));
            tree.replace_outputs(*wrapper, outputs);
            lower.push(*wrapper);
            Ok(())
        }
        _ => Err(too_many()),
    }
}

/// On-exceptions go first, in declaration order: the route's own, then
/// configuration ones (marked as not route scoped). Returns how many were
/// added.
fn init_on_exceptions(
    tree: &mut NodeTree,
    abstracts: &[NodeId],
    upper: &mut Vec<NodeId>,
    concerns: &CrossCutting<'_>,
) -> usize {
    let mut on_exceptions =
        of_kind(tree, abstracts, |k| matches!(k, NodeKind::OnException { .. }));
    for global in import_all(tree, &concerns.on_exceptions) {
        tree.kind_mut(global).set_route_scoped(false);
        on_exceptions.push(global);
    }

    for &on_exception in &on_exceptions {
        let index = upper
            .iter()
            .position(|&n| !matches!(tree.kind(n), NodeKind::OnException { .. }))
            .unwrap_or(upper.len());
        upper.insert(index, on_exception);
    }
    on_exceptions.len()
}
