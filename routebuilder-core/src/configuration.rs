use crate::kind::NodeKind;
use crate::node::NodeId;
use crate::tree::NodeTree;
use routebuilder_context::{ErrorHandlerDefinition, ModelContext};

/// Id recorded on a route for configurations without an id
pub const DEFAULT_CONFIGURATION_ID: &str = "<default>";

/// Named bundle of cross-cutting definitions applied to matching routes.
///
/// The on-exception, intercept and on-completion nodes live as top-level
/// outputs of the configuration's own tree.
#[derive(Debug, Clone)]
pub struct RouteConfigurationDefinition {
    id: Option<String>,
    pub description: Option<String>,
    /// Precedence when several configurations match; lower sorts first
    pub order: i32,
    pub error_handler: Option<ErrorHandlerDefinition>,
    pub precondition: Option<String>,
    tree: NodeTree,
}

impl RouteConfigurationDefinition {
    pub fn new(ctx: &ModelContext) -> Self {
        Self {
            id: None,
            description: None,
            order: 0,
            error_handler: None,
            precondition: None,
            tree: NodeTree::new(ctx, NodeKind::RouteConfiguration),
        }
    }

    pub fn with_id(ctx: &ModelContext, id: impl Into<String>) -> Self {
        let mut config = Self::new(ctx);
        config.set_id(id);
        config
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        let root = self.tree.root();
        self.tree.set_id(root, id.clone());
        self.id = Some(id);
    }

    /// Id recorded on routes this configuration is applied to
    pub fn applied_id(&self) -> &str {
        self.id.as_deref().unwrap_or(DEFAULT_CONFIGURATION_ID)
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Adds a cross-cutting node at the top of the configuration
    #[track_caller]
    pub fn add(&mut self, kind: NodeKind) -> crate::Result<NodeId> {
        let root = self.tree.root();
        let node = self.tree.append(root, kind)?;
        if let Some(id) = &self.id {
            self.tree.header_mut(node).route_configuration_id = Some(id.clone());
        }
        Ok(node)
    }

    fn top_level(&self, pred: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        self.tree
            .outputs(self.tree.root())
            .iter()
            .copied()
            .filter(|&n| pred(self.tree.kind(n)))
            .collect()
    }

    pub fn on_exceptions(&self) -> Vec<NodeId> {
        self.top_level(|k| matches!(k, NodeKind::OnException { .. }))
    }

    pub fn intercepts(&self) -> Vec<NodeId> {
        self.top_level(|k| matches!(k, NodeKind::Intercept { .. }))
    }

    pub fn intercept_froms(&self) -> Vec<NodeId> {
        self.top_level(|k| matches!(k, NodeKind::InterceptFrom { .. }))
    }

    pub fn intercept_send_to_endpoints(&self) -> Vec<NodeId> {
        self.top_level(|k| matches!(k, NodeKind::InterceptSendToEndpoint { .. }))
    }

    pub fn on_completions(&self) -> Vec<NodeId> {
        self.top_level(|k| matches!(k, NodeKind::OnCompletion { .. }))
    }
}
