//! Arena holding one route (or route configuration) tree.
//!
//! Nodes are addressed by [`NodeId`]; the parent link is a handle, never an
//! owning pointer. Nodes are only ever detached, not freed, so handles stay
//! valid for the lifetime of the tree.

use crate::error::{ModelError, Result};
use crate::expression::{ExpressionDefinition, ExpressionHolder};
use crate::kind::NodeKind;
use crate::node::{Node, NodeHeader, NodeId, SourceLocation};
use routebuilder_context::{ModelContext, NodeCounter, NodeIdFactory};
use std::panic::Location;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<Node>,
    root: NodeId,
    counter: Arc<NodeCounter>,
    capture_source_location: bool,
    resource: Option<String>,
}

impl NodeTree {
    /// Creates a tree whose root has the given kind (`Route` or `RouteConfiguration`)
    pub fn new(ctx: &ModelContext, root_kind: NodeKind) -> Self {
        let counter = ctx.counter().clone();
        let root = Node::new(counter.next_index(), root_kind);
        Self {
            nodes: vec![root],
            root: NodeId::new(0),
            counter,
            capture_source_location: ctx.captures_source_location(),
            resource: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever created in this arena, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.node_mut(id).kind
    }

    pub fn header(&self, id: NodeId) -> &NodeHeader {
        &self.node(id).header
    }

    pub fn header_mut(&mut self, id: NodeId) -> &mut NodeHeader {
        &mut self.node_mut(id).header
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn outputs(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).outputs
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Names the document this tree was loaded from
    pub fn set_resource(&mut self, resource: impl Into<String>) {
        self.resource = Some(resource.into());
    }

    pub fn set_capture_source_location(&mut self, enabled: bool) {
        self.capture_source_location = enabled;
    }

    /// Creates a detached node
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(self.counter.next_index(), kind));
        id
    }

    /// Creates a node and attaches it through [`add_output`](Self::add_output)
    #[track_caller]
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId> {
        self.append_at(parent, kind, Location::caller())
    }

    pub fn append_at(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        caller: &'static Location<'static>,
    ) -> Result<NodeId> {
        let child = self.create(kind);
        self.add_output_at(parent, child, caller)?;
        Ok(child)
    }

    /// Attaches `child` to `parent` or to the scope `parent` currently
    /// delegates to.
    ///
    /// Leaf nodes hand the call to their parent, a pushed block receives it
    /// instead of the node itself, and a choice routes plain steps into its
    /// current clause. Top-level-only children are rejected anywhere but
    /// directly under a root.
    #[track_caller]
    pub fn add_output(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.add_output_at(parent, child, Location::caller())
    }

    /// [`add_output`](Self::add_output) with an explicit call site for the
    /// recorded source location
    pub fn add_output_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        caller: &'static Location<'static>,
    ) -> Result<()> {
        let root = self.owning_root(parent);

        let mut target = parent;
        loop {
            let node = self.node(target);
            if !node.kind.is_output_holder() {
                match node.parent {
                    Some(up) => {
                        target = up;
                        continue;
                    }
                    None => {
                        return Err(ModelError::InvalidValue {
                            what: "output parent",
                            value: node.kind.label(),
                        })
                    }
                }
            }

            if matches!(node.kind, NodeKind::Choice) {
                if self.kind(child).is_choice_clause() {
                    self.check_choice_clause(target, child)?;
                    self.node_mut(target).clauses_only = false;
                    break;
                }
                if node.clauses_only || node.blocks.is_empty() {
                    return Err(ModelError::InvalidChoiceClause {
                        node: self.kind(child).label(),
                    });
                }
            }

            match node.blocks.last() {
                Some(&block) => target = block,
                None => break,
            }
        }

        if self.kind(child).is_top_level_only() && !self.kind(target).is_root() {
            return Err(ModelError::TopLevelOnly {
                node: self.kind(child).label(),
            });
        }

        self.node_mut(child).parent = Some(target);
        self.configure_child(target, child);
        self.node_mut(target).outputs.push(child);

        if self.capture_source_location && root.is_some() {
            let location = match &self.resource {
                Some(resource) => SourceLocation {
                    resource: resource.clone(),
                    line: None,
                },
                None => {
                    SourceLocation {
                        resource: caller.file().to_string(),
                        line: Some(caller.line()),
                    }
                }
            };
            self.header_mut(child).location = Some(location);
        }
        Ok(())
    }

    fn check_choice_clause(&self, choice: NodeId, clause: NodeId) -> Result<()> {
        let has_otherwise = self
            .outputs(choice)
            .iter()
            .any(|&c| matches!(self.kind(c), NodeKind::Otherwise));
        if has_otherwise {
            return Err(ModelError::InvalidChoiceClause {
                node: format!("{} after otherwise", self.kind(clause).label()),
            });
        }
        Ok(())
    }

    /// Hook run for every attached child; binds completed expression clauses
    fn configure_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(holder) = self.kind_mut(parent).expression_mut() {
            holder.bind_clause();
        }
        if matches!(self.kind(parent), NodeKind::Choice) {
            let clauses = self.node(parent).outputs.clone();
            for clause in clauses.into_iter().chain(Some(child)) {
                if let Some(holder) = self.kind_mut(clause).expression_mut() {
                    holder.bind_clause();
                }
            }
        }
    }

    /// Opens a clause (when, otherwise, catch, finally) on a choice or try
    /// and makes it the receiver of subsequent outputs
    #[track_caller]
    pub fn add_clause(&mut self, container: NodeId, kind: NodeKind) -> Result<NodeId> {
        self.add_clause_at(container, kind, Location::caller())
    }

    pub fn add_clause_at(
        &mut self,
        container: NodeId,
        kind: NodeKind,
        caller: &'static Location<'static>,
    ) -> Result<NodeId> {
        self.pop_block(container);
        let clause = self.create(kind);
        self.add_output_at(container, clause, caller)?;
        self.push_block(container, clause);
        Ok(clause)
    }

    pub fn push_block(&mut self, node: NodeId, block: NodeId) {
        self.node_mut(node).blocks.push(block);
    }

    pub fn pop_block(&mut self, node: NodeId) -> Option<NodeId> {
        self.node_mut(node).blocks.pop()
    }

    pub fn blocks(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).blocks
    }

    /// Ends the scope opened by `node` and returns the node fluent calls
    /// should continue on
    pub fn end(&mut self, node: NodeId) -> NodeId {
        if matches!(self.kind(node), NodeKind::OnCompletion { .. }) {
            if let Some(parent) = self.parent(node) {
                self.pop_block(parent);
            }
        }
        if matches!(self.kind(node), NodeKind::Try | NodeKind::Choice) {
            self.pop_block(node);
        }
        if self.blocks(node).is_empty() {
            return match self.parent(node) {
                Some(parent) => self.end_parent(parent),
                None => self.end_parent(node),
            };
        }
        self.pop_block(node);
        self.end_parent(node)
    }

    /// Anchor returned when `end()` lands on `node`; clauses hand back their
    /// choice or try
    pub fn end_parent(&self, node: NodeId) -> NodeId {
        match self.kind(node) {
            NodeKind::When { .. }
            | NodeKind::Otherwise
            | NodeKind::Catch { .. }
            | NodeKind::Finally => self.parent(node).unwrap_or(node),
            _ => node,
        }
    }

    /// Returns to the enclosing choice so another clause can be opened
    pub fn end_choice(&mut self, node: NodeId) -> Result<NodeId> {
        if let Some(parent) = self.parent(node) {
            if self.kind(parent).is_choice_clause() {
                if let Some(choice) = self.parent(parent) {
                    self.node_mut(choice).clauses_only = true;
                    return Ok(choice);
                }
            }
        }
        if matches!(self.kind(node), NodeKind::Choice) {
            self.node_mut(node).clauses_only = true;
            return Ok(node);
        }

        let ended = self.end(node);
        let choice = if self.kind(ended).is_choice_clause() {
            self.parent(ended)
        } else if matches!(self.kind(ended), NodeKind::Choice) {
            Some(ended)
        } else {
            None
        };
        match choice {
            Some(choice) => {
                self.node_mut(choice).clauses_only = true;
                Ok(choice)
            }
            None => Err(ModelError::UnbalancedEnd {
                node: self.kind(node).label(),
                expected: "choice",
            }),
        }
    }

    /// Returns to the enclosing try so another catch or finally can be opened
    pub fn end_do_try(&mut self, node: NodeId) -> Result<NodeId> {
        if matches!(self.kind(node), NodeKind::Try) {
            return Ok(node);
        }
        let ended = self.end(node);
        match self.kind(ended) {
            NodeKind::Try => Ok(ended),
            NodeKind::Catch { .. } | NodeKind::Finally => self
                .parent(ended)
                .filter(|&p| matches!(self.kind(p), NodeKind::Try))
                .ok_or_else(|| ModelError::UnbalancedEnd {
                    node: self.kind(node).label(),
                    expected: "doTry",
                }),
            _ => Err(ModelError::UnbalancedEnd {
                node: self.kind(node).label(),
                expected: "doTry",
            }),
        }
    }

    /// Walks parent links up to the enclosing route or route configuration
    pub fn owning_root(&self, node: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.kind(id).is_root() {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// Nearest ancestor (excluding `node`) satisfying `pred`
    pub fn find_first_parent(
        &self,
        node: NodeId,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if pred(self.kind(id)) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// Re-links every descendant's parent from the output lists
    pub fn init_parent(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let outputs = self.node(current).outputs.clone();
            for child in outputs {
                self.node_mut(child).parent = Some(current);
                stack.push(child);
            }
        }
    }

    /// Detaches and returns every output of `node`
    pub fn clear_outputs(&mut self, node: NodeId) -> Vec<NodeId> {
        let outputs = std::mem::take(&mut self.node_mut(node).outputs);
        for &child in &outputs {
            self.node_mut(child).parent = None;
        }
        outputs
    }

    /// Replaces the outputs of `node`, fixing the parent links of the new
    /// children. No placement validation happens here.
    pub fn replace_outputs(&mut self, node: NodeId, outputs: Vec<NodeId>) {
        for &child in &outputs {
            self.node_mut(child).parent = Some(node);
        }
        self.node_mut(node).outputs = outputs;
    }

    /// Removes `node` from its parent's outputs
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.node_mut(node).parent.take() {
            self.node_mut(parent).outputs.retain(|&c| c != node);
        }
    }

    /// Pre-order list of `node` and everything below it
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            found.push(current);
            stack.extend(self.outputs(current).iter().rev());
        }
        found
    }

    /// Deep copies a subtree of `source` into this arena.
    ///
    /// Copies get fresh creation indices and come back detached.
    pub fn import_subtree(&mut self, source: &NodeTree, node: NodeId) -> NodeId {
        let copy = self.create(source.kind(node).clone());
        let mut header = source.header(node).clone();
        header.index = self.header(copy).index;
        *self.header_mut(copy) = header;

        for &child in source.outputs(node) {
            let child_copy = self.import_subtree(source, child);
            self.node_mut(child_copy).parent = Some(copy);
            self.node_mut(copy).outputs.push(child_copy);
        }
        copy
    }

    /// Deep copy of the whole tree with fresh creation indices
    pub fn deep_copy(&self) -> NodeTree {
        let mut copy = NodeTree {
            nodes: Vec::new(),
            root: NodeId::new(0),
            counter: self.counter.clone(),
            capture_source_location: self.capture_source_location,
            resource: self.resource.clone(),
        };
        copy.root = copy.import_subtree(self, self.root);
        copy
    }

    /// Assigns a user-chosen id
    pub fn set_id(&mut self, node: NodeId, id: impl Into<String>) {
        let header = self.header_mut(node);
        header.id = Some(id.into());
        header.custom_id = true;
    }

    /// Returns the node id, generating one when none is set
    pub fn id_or_create(&mut self, node: NodeId, factory: &dyn NodeIdFactory) -> String {
        if let Some(id) = self.header(node).id.clone() {
            return id;
        }
        let id = factory.create_id(self.kind(node).short_name());
        let header = self.header_mut(node);
        header.id = Some(id.clone());
        header.custom_id = false;
        id
    }

    /// Sets the aggregator completion predicate; it may only be defined once
    pub fn set_completion_predicate(
        &mut self,
        node: NodeId,
        predicate: ExpressionDefinition,
    ) -> Result<()> {
        let label = self.kind(node).label();
        match self.kind_mut(node) {
            NodeKind::Aggregate {
                completion_predicate,
                ..
            } => {
                if completion_predicate.is_some() {
                    return Err(ModelError::AlreadyDefined {
                        what: "completionPredicate",
                        node: label,
                    });
                }
                *completion_predicate = Some(predicate);
                Ok(())
            }
            _ => Err(ModelError::InvalidValue {
                what: "completion predicate target",
                value: label,
            }),
        }
    }

    /// Completes the pending expression clause of `node`
    pub fn complete_clause(
        &mut self,
        node: NodeId,
        expression: ExpressionDefinition,
    ) -> Result<()> {
        let label = self.kind(node).label();
        match self.kind_mut(node).expression_mut() {
            Some(holder) => {
                match holder.clause_mut() {
                    Some(clause) => clause.set_expression_type(expression),
                    None => holder.set(expression),
                }
                Ok(())
            }
            None => Err(ModelError::InvalidValue {
                what: "expression target",
                value: label,
            }),
        }
    }

    /// Expression holder of `node`, if its kind carries one
    pub fn expression(&self, node: NodeId) -> Option<&ExpressionHolder> {
        self.kind(node).expression()
    }
}
