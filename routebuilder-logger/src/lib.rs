//! # RouteBuilder Logger
//!
//! Logging and tracing support for RouteBuilder route models

use routebuilder_core::{NodeId, NodeKind, NodeTree, RouteDefinition};
use std::fmt::Write;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Logger for route models
pub struct Logger {
    pub trace_id: String,
}

impl Logger {
    /// Create a new logger
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific trace ID
    pub fn with_trace_id(trace_id: String) -> Self {
        Self { trace_id }
    }

    /// Initialize tracing subscriber.
    ///
    /// Returns `false` when a global subscriber is already installed.
    pub fn init_tracing() -> bool {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init()
            .is_ok()
    }

    pub fn info(&self, message: &str) {
        info!(trace_id = %self.trace_id, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(trace_id = %self.trace_id, "{}", message);
    }

    pub fn error(&self, message: &str) {
        error!(trace_id = %self.trace_id, "{}", message);
    }

    pub fn debug(&self, message: &str) {
        debug!(trace_id = %self.trace_id, "{}", message);
    }

    /// Log route summary
    pub fn log_route_summary(&self, route: &RouteDefinition) -> RouteSummary {
        let summary = RouteSummary::of(route);
        info!(
            trace_id = %self.trace_id,
            route = %route.display_name(),
            prepared = route.is_prepared(),
            nodes = summary.nodes,
            top_level = summary.top_level,
            on_exceptions = summary.on_exceptions,
            intercepts = summary.intercepts,
            on_completions = summary.on_completions,
            custom_ids = summary.custom_ids,
            disabled = summary.disabled,
            configurations = ?route.applied_route_configuration_ids(),
            "Route model summary"
        );
        if summary.disabled > 0 {
            warn!(
                trace_id = %self.trace_id,
                route = %route.display_name(),
                disabled = summary.disabled,
                "Route still contains disabled nodes"
            );
        }
        summary
    }

    /// Log every node of the route at debug level, depth first
    pub fn log_route_details(&self, route: &RouteDefinition) {
        let tree = route.tree();
        for node in tree.descendants(route.root()) {
            let header = tree.header(node);
            debug!(
                trace_id = %self.trace_id,
                route = %route.display_name(),
                node = %tree.kind(node).label(),
                id = header.id.as_deref().unwrap_or("-"),
                custom_id = header.custom_id,
                configuration = header.route_configuration_id.as_deref().unwrap_or("-"),
                "Route node"
            );
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Node counts of a route tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteSummary {
    /// 不含根节点
    pub nodes: usize,
    pub top_level: usize,
    pub on_exceptions: usize,
    pub intercepts: usize,
    pub on_completions: usize,
    pub custom_ids: usize,
    pub disabled: usize,
}

impl RouteSummary {
    pub fn of(route: &RouteDefinition) -> Self {
        let tree = route.tree();
        let root = route.root();
        let mut summary = RouteSummary {
            top_level: route.outputs().len(),
            ..Default::default()
        };
        for node in tree.descendants(root).into_iter().filter(|&n| n != root) {
            summary.nodes += 1;
            match tree.kind(node) {
                NodeKind::OnException { .. } => summary.on_exceptions += 1,
                NodeKind::Intercept { .. }
                | NodeKind::InterceptFrom { .. }
                | NodeKind::InterceptSendToEndpoint { .. } => summary.intercepts += 1,
                NodeKind::OnCompletion { .. } => summary.on_completions += 1,
                _ => {}
            }
            let header = tree.header(node);
            if header.has_custom_id() {
                summary.custom_ids += 1;
            }
            if header.disabled.is_some() {
                summary.disabled += 1;
            }
        }
        summary
    }
}

/// Renders a route as an indented outline, one node per line
pub fn dump_route(route: &RouteDefinition) -> String {
    let mut out = String::new();
    let input = route.endpoint_uri().unwrap_or("?");
    let _ = writeln!(out, "route[{}] from[{}]", route.display_name(), input);
    dump_outputs(route.tree(), route.root(), 1, &mut out);
    out
}

fn dump_outputs(tree: &NodeTree, node: NodeId, depth: usize, out: &mut String) {
    for &child in tree.outputs(node) {
        let header = tree.header(child);
        let _ = write!(out, "{}{}", "  ".repeat(depth), tree.kind(child).label());
        if let Some(id) = header.id.as_deref() {
            let _ = write!(out, " id={id}");
        }
        out.push('\n');
        dump_outputs(tree, child, depth + 1, out);
    }
}
