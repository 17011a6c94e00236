//! Traversals over route trees: typed search, id gathering and reset,
//! output checks and route sanity checks.

use crate::error::{ModelError, Result};
use crate::kind::NodeKind;
use crate::node::NodeId;
use crate::route::RouteDefinition;
use crate::tree::NodeTree;
use routebuilder_context::ModelContext;
use std::collections::BTreeSet;

/// Finds every node below `outputs` whose kind satisfies `pred`.
///
/// `max_depth` bounds how many levels are descended (top-level outputs are
/// level 1); a negative value means unbounded. When top-level abstract
/// nodes are present the bound is raised by one, since preparation moves
/// regular steps one level down under them. Choice clauses and try clauses
/// belong to the level of their choice/try; their outputs are one level
/// deeper.
///
/// Depth is tracked per branch: every sibling is searched at the same level,
/// so a deep earlier sibling never uses up the depth of the ones after it.
pub fn filter_type_in_outputs(
    tree: &NodeTree,
    outputs: &[NodeId],
    pred: impl Fn(&NodeKind) -> bool,
    max_depth: i32,
) -> Vec<NodeId> {
    let mut max_depth = max_depth;
    if max_depth > 0
        && outputs.iter().any(|&o| {
            let kind = tree.kind(o);
            kind.is_abstract() && kind.is_top_level_only()
        })
    {
        max_depth += 1;
    }

    let mut found = Vec::new();
    find_type(tree, outputs, &pred, &mut found, 1, max_depth);
    found
}

fn find_type(
    tree: &NodeTree,
    outputs: &[NodeId],
    pred: &dyn Fn(&NodeKind) -> bool,
    found: &mut Vec<NodeId>,
    level: i32,
    max_depth: i32,
) {
    if max_depth > 0 && level > max_depth {
        return;
    }
    for &out in outputs {
        let kind = tree.kind(out);
        if pred(kind) {
            found.push(out);
        }

        match kind {
            NodeKind::Choice | NodeKind::Try => {
                let (clauses, body): (Vec<NodeId>, Vec<NodeId>) =
                    tree.outputs(out).iter().partition(|&&c| {
                        matches!(
                            tree.kind(c),
                            NodeKind::When { .. }
                                | NodeKind::Otherwise
                                | NodeKind::Catch { .. }
                                | NodeKind::Finally
                        )
                    });
                find_type(tree, &body, pred, found, level + 1, max_depth);
                for clause in clauses {
                    if pred(tree.kind(clause)) {
                        found.push(clause);
                    }
                    find_type(tree, tree.outputs(clause), pred, found, level + 1, max_depth);
                }
            }
            _ => {
                let children = tree.outputs(out);
                if !children.is_empty() {
                    find_type(tree, children, pred, found, level + 1, max_depth);
                }
            }
        }
    }
}

/// Collects node ids below (and including) `node`.
///
/// Abstract nodes and everything under them are skipped unless
/// `include_abstract` is set; with `only_custom_id` generated ids are left
/// out.
pub fn gather_all_node_ids(
    tree: &NodeTree,
    node: NodeId,
    only_custom_id: bool,
    include_abstract: bool,
) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    gather_into(tree, node, &mut ids, only_custom_id, include_abstract);
    ids
}

fn gather_into(
    tree: &NodeTree,
    node: NodeId,
    ids: &mut BTreeSet<String>,
    only_custom_id: bool,
    include_abstract: bool,
) {
    if tree.kind(node).is_abstract() && !include_abstract {
        return;
    }
    let header = tree.header(node);
    if let Some(id) = &header.id {
        if !only_custom_id || header.custom_id {
            ids.insert(id.clone());
        }
    }
    for &child in tree.outputs(node) {
        gather_into(tree, child, ids, only_custom_id, include_abstract);
    }
}

/// Clears every generated id below `node` so they can be regenerated;
/// custom ids and abstract subtrees are untouched
pub fn reset_all_auto_assigned_node_ids(tree: &mut NodeTree, node: NodeId) {
    if tree.kind(node).is_abstract() {
        return;
    }
    let header = tree.header_mut(node);
    if header.id.is_some() && !header.custom_id {
        header.id = None;
    }
    let children = tree.outputs(node).to_vec();
    for child in children {
        reset_all_auto_assigned_node_ids(tree, child);
    }
}

/// Gives every node below `node` an id: custom ids get their placeholders
/// resolved, the rest are generated by the context's id factory
pub fn force_assign_node_ids(ctx: &ModelContext, tree: &mut NodeTree, node: NodeId) -> Result<()> {
    for current in tree.descendants(node) {
        let header = tree.header(current);
        match header.custom_id.then(|| header.id.clone()).flatten() {
            Some(id) => {
                let resolved = ctx.resolve_placeholders(&id)?;
                tree.set_id(current, resolved);
            }
            None => {
                tree.id_or_create(current, ctx.id_factory().as_ref());
            }
        }
    }
    Ok(())
}

/// Whether `outputs` holds real processing steps.
///
/// With `exclude_abstract`, abstract nodes do not count, except that a
/// wrapping node (saga, transacted) counts when its own outputs do.
pub fn has_outputs(tree: &NodeTree, outputs: &[NodeId], exclude_abstract: bool) -> bool {
    if outputs.is_empty() {
        return false;
    }
    if !exclude_abstract {
        return true;
    }
    outputs.iter().any(|&output| {
        let kind = tree.kind(output);
        (kind.is_wrapping_entire_output() && has_outputs(tree, tree.outputs(output), true))
            || !kind.is_abstract()
    })
}

/// Returns the first custom node id of `target` that also appears in one of
/// `others` (with `prefix` prepended to the target's ids)
pub fn validate_unique_ids<'a>(
    target: &RouteDefinition,
    others: impl IntoIterator<Item = &'a RouteDefinition>,
    prefix: Option<&str>,
) -> Option<String> {
    let mut known = BTreeSet::new();
    for route in others {
        if std::ptr::eq(route, target) {
            continue;
        }
        gather_into(route.tree(), route.root(), &mut known, true, false);
    }

    let target_ids = gather_all_node_ids(target.tree(), target.root(), true, false);
    target_ids
        .into_iter()
        .map(|id| match prefix {
            Some(prefix) => format!("{prefix}{id}"),
            None => id,
        })
        .find(|id| known.contains(id))
}

/// Parses a placeholder-resolved boolean flag (`true`/`false`, any case)
pub fn parse_bool(what: &'static str, text: &str) -> Result<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ModelError::InvalidValue {
            what,
            value: text.to_string(),
        }),
    }
}

/// Detaches every node below `node` whose `disabled` flag resolves to true.
///
/// Returns how many subtrees were removed.
pub fn prune_disabled_nodes(ctx: &ModelContext, tree: &mut NodeTree, node: NodeId) -> Result<usize> {
    let mut removed = 0;
    for current in tree.descendants(node) {
        if current == node {
            continue;
        }
        let Some(flag) = tree.header(current).disabled.clone() else {
            continue;
        };
        if parse_bool("disabled", &ctx.resolve_placeholders(&flag)?)? {
            tree.detach(current);
            removed += 1;
        }
    }
    Ok(removed)
}

/// A route must have an input and at least one output before use
pub fn sanity_check_route(route: &RouteDefinition) -> Result<()> {
    if route.input().is_none() {
        return Err(ModelError::NoInput(route.display_name()));
    }
    if route.outputs().is_empty() {
        return Err(ModelError::NoOutputs(route.display_name()));
    }
    Ok(())
}
