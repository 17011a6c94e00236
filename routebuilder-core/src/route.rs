use crate::error::Result;
use crate::kind::NodeKind;
use crate::node::NodeId;
use crate::rest::RestDefinition;
use crate::template::TemplateBeanDefinition;
use crate::tree::NodeTree;
use routebuilder_context::{ErrorHandlerDefinition, ModelContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU8, Ordering};

/// The endpoint a route consumes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromDefinition {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl FromDefinition {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            id: None,
        }
    }
}

const UNPREPARED: u8 = 0;
const PREPARING: u8 = 1;
const PREPARED: u8 = 2;

/// Guard making route preparation run at most once.
///
/// Claiming is a compare-and-swap; the final store uses release ordering so
/// anyone observing `is_prepared() == true` also observes the prepared tree.
#[derive(Debug, Default)]
pub struct PreparedFlag(AtomicU8);

impl PreparedFlag {
    pub fn is_prepared(&self) -> bool {
        self.0.load(Ordering::Acquire) == PREPARED
    }

    /// Claims the right to prepare. Only one caller wins until a reset.
    pub(crate) fn try_begin(&self) -> bool {
        self.0
            .compare_exchange(UNPREPARED, PREPARING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn finish(&self) {
        self.0.store(PREPARED, Ordering::Release);
    }

    pub(crate) fn reset(&self) {
        self.0.store(UNPREPARED, Ordering::Release);
    }
}

impl Clone for PreparedFlag {
    fn clone(&self) -> Self {
        PreparedFlag(AtomicU8::new(self.0.load(Ordering::Acquire)))
    }
}

/// A route: one input and an ordered tree of outputs plus routing metadata
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    tree: NodeTree,
    input: Option<FromDefinition>,
    pub group: Option<String>,
    pub startup_order: Option<i32>,
    pub auto_startup: Option<bool>,
    /// 占位符解析后为 false 的路由不会被注册
    pub precondition: Option<String>,
    route_configuration_ids: Option<String>,
    applied_route_configuration_ids: Vec<String>,
    error_handler: Option<ErrorHandlerDefinition>,
    context_scoped_error_handler: bool,
    pub template_id: Option<String>,
    pub template_parameters: BTreeMap<String, String>,
    pub local_beans: Vec<TemplateBeanDefinition>,
    pub stream_caching: Option<bool>,
    pub tracing: Option<bool>,
    pub message_history: Option<bool>,
    pub log_mask: Option<bool>,
    pub input_type: Option<String>,
    pub output_type: Option<String>,
    pub rest: Option<RestDefinition>,
    prepared: PreparedFlag,
    authored: Option<NodeTree>,
}

impl RouteDefinition {
    pub fn new(ctx: &ModelContext) -> Self {
        Self {
            tree: NodeTree::new(ctx, NodeKind::Route),
            input: None,
            group: None,
            startup_order: None,
            auto_startup: None,
            precondition: None,
            route_configuration_ids: None,
            applied_route_configuration_ids: Vec::new(),
            error_handler: None,
            context_scoped_error_handler: true,
            template_id: None,
            template_parameters: BTreeMap::new(),
            local_beans: Vec::new(),
            stream_caching: None,
            tracing: None,
            message_history: None,
            log_mask: None,
            input_type: None,
            output_type: None,
            rest: None,
            prepared: PreparedFlag::default(),
            authored: None,
        }
    }

    /// Route consuming from `uri`
    pub fn from(ctx: &ModelContext, uri: impl Into<String>) -> Self {
        let mut route = Self::new(ctx);
        route.input = Some(FromDefinition::new(uri));
        route
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    pub(crate) fn replace_tree(&mut self, tree: NodeTree) {
        self.tree = tree;
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn outputs(&self) -> &[NodeId] {
        self.tree.outputs(self.tree.root())
    }

    /// Appends a node at the top level of the route
    #[track_caller]
    pub fn add_output(&mut self, kind: NodeKind) -> Result<NodeId> {
        let root = self.tree.root();
        self.tree.append(root, kind)
    }

    pub fn input(&self) -> Option<&FromDefinition> {
        self.input.as_ref()
    }

    pub fn input_mut(&mut self) -> Option<&mut FromDefinition> {
        self.input.as_mut()
    }

    pub fn set_input(&mut self, uri: impl Into<String>) {
        self.input = Some(FromDefinition::new(uri));
    }

    pub fn endpoint_uri(&self) -> Option<&str> {
        self.input.as_ref().map(|i| i.uri.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.tree.header(self.tree.root()).id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        let root = self.tree.root();
        self.tree.set_id(root, id);
    }

    /// Stores an auto-assigned id
    pub fn set_generated_id(&mut self, id: impl Into<String>) {
        let root = self.tree.root();
        let header = self.tree.header_mut(root);
        header.id = Some(id.into());
        header.custom_id = false;
    }

    pub fn has_custom_id(&self) -> bool {
        self.tree.header(self.tree.root()).has_custom_id()
    }

    pub fn description(&self) -> Option<&str> {
        self.tree.header(self.tree.root()).description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let root = self.tree.root();
        self.tree.header_mut(root).description = Some(description.into());
    }

    /// Comma separated route configuration id patterns
    pub fn route_configuration_ids(&self) -> Option<&str> {
        self.route_configuration_ids.as_deref()
    }

    pub fn set_route_configuration_ids(&mut self, ids: impl Into<String>) {
        self.route_configuration_ids = Some(ids.into());
    }

    /// Configuration ids applied by the last preparation, in order of application
    pub fn applied_route_configuration_ids(&self) -> &[String] {
        &self.applied_route_configuration_ids
    }

    pub fn add_applied_route_configuration_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.applied_route_configuration_ids.contains(&id) {
            self.applied_route_configuration_ids.push(id);
        }
    }

    pub fn error_handler(&self) -> Option<&ErrorHandlerDefinition> {
        self.error_handler.as_ref()
    }

    /// Sets a route-local error handler; the route stops using the
    /// context-scoped one
    pub fn set_error_handler(&mut self, handler: ErrorHandlerDefinition) {
        self.error_handler = Some(handler);
        self.context_scoped_error_handler = false;
    }

    /// Installs `handler` only when the route has none yet
    pub fn set_error_handler_if_none(&mut self, handler: ErrorHandlerDefinition) {
        if self.error_handler.is_none() {
            self.error_handler = Some(handler);
        }
    }

    pub fn is_context_scoped_error_handler(&self) -> bool {
        self.context_scoped_error_handler
    }

    pub fn is_rest(&self) -> bool {
        self.rest.is_some()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.is_prepared()
    }

    pub(crate) fn prepared_flag(&self) -> &PreparedFlag {
        &self.prepared
    }

    /// Clears the prepared state so preparation can run again.
    ///
    /// The tree is restored to how it was authored before the first
    /// preparation, and the applied configuration ids are forgotten.
    pub fn reset_prepare(&mut self) {
        self.applied_route_configuration_ids.clear();
        if let Some(authored) = self.authored.take() {
            self.tree = authored;
        }
        self.prepared.reset();
    }

    pub(crate) fn remember_authored(&mut self) {
        if self.authored.is_none() {
            self.authored = Some(self.tree.clone());
        }
    }

    /// Human readable route name used in messages
    pub fn display_name(&self) -> String {
        match (self.id(), self.endpoint_uri()) {
            (Some(id), _) => id.to_string(),
            (None, Some(uri)) => format!("from[{uri}]"),
            (None, None) => "route".to_string(),
        }
    }
}
