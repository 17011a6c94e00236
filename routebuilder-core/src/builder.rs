//! Fluent builders for routes and route configurations.
//!
//! Steps are appended at a cursor that moves into containers (`split`,
//! `choice`, `do_try`, ...) and back out with `end()`. The first failing
//! step is remembered and returned from `build()`; later steps are skipped.

use crate::configuration::RouteConfigurationDefinition;
use crate::error::{ModelError, Result};
use crate::expression::{ExpressionDefinition, ExpressionHolder};
use crate::kind::NodeKind;
use crate::node::NodeId;
use crate::route::RouteDefinition;
use crate::tree::NodeTree;
use routebuilder_context::{ErrorHandlerDefinition, ModelContext};
use std::panic::Location;

/// Cursor state shared by the fluent builders
#[derive(Debug, Clone)]
pub struct BuildState {
    cursor: NodeId,
    last: NodeId,
    error: Option<ModelError>,
}

impl BuildState {
    fn at(root: NodeId) -> Self {
        Self {
            cursor: root,
            last: root,
            error: None,
        }
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    /// Node most recently added or closed
    pub fn last(&self) -> NodeId {
        self.last
    }

    pub fn error(&self) -> Option<&ModelError> {
        self.error.as_ref()
    }
}

/// Step methods available on every tree builder
pub trait StepBuilder: Sized {
    fn parts(&mut self) -> (&mut NodeTree, &mut BuildState);

    /// Runs `f` unless an earlier step already failed
    fn apply(mut self, f: impl FnOnce(&mut NodeTree, &mut BuildState) -> Result<()>) -> Self {
        let (tree, state) = self.parts();
        if state.error.is_none() {
            if let Err(e) = f(tree, state) {
                tracing::debug!(error = %e, "route builder step failed");
                state.error = Some(e);
            }
        }
        self
    }

    /// Appends a leaf at the cursor
    #[track_caller]
    fn push_step(self, kind: NodeKind) -> Self {
        let caller = Location::caller();
        self.apply(|tree, state| {
            state.last = tree.append_at(state.cursor, kind, caller)?;
            Ok(())
        })
    }

    /// Appends a container at the cursor and moves the cursor into it
    #[track_caller]
    fn open_scope(self, kind: NodeKind) -> Self {
        let caller = Location::caller();
        self.apply(|tree, state| {
            let node = tree.append_at(state.cursor, kind, caller)?;
            state.cursor = node;
            state.last = node;
            Ok(())
        })
    }

    /// Edits the kind at the cursor; `f` returns false when the kind does
    /// not support the option
    fn configure(self, what: &'static str, f: impl FnOnce(&mut NodeKind) -> bool) -> Self {
        self.apply(|tree, state| {
            let label = tree.kind(state.cursor).label();
            if f(tree.kind_mut(state.cursor)) {
                Ok(())
            } else {
                Err(ModelError::InvalidValue { what, value: label })
            }
        })
    }

    #[track_caller]
    fn to(self, uri: impl Into<String>) -> Self {
        self.push_step(NodeKind::to(uri))
    }

    #[track_caller]
    fn to_d(self, uri: impl Into<String>) -> Self {
        self.push_step(NodeKind::ToD {
            uri: uri.into(),
            cache_size: None,
            ignore_invalid_endpoint: None,
        })
    }

    #[track_caller]
    fn log(self, message: impl Into<String>) -> Self {
        self.push_step(NodeKind::log(message))
    }

    #[track_caller]
    fn process(self, reference: impl Into<String>) -> Self {
        self.push_step(NodeKind::Process {
            reference: reference.into(),
        })
    }

    #[track_caller]
    fn bean(self, reference: impl Into<String>, method: Option<&str>) -> Self {
        self.push_step(NodeKind::Bean {
            reference: reference.into(),
            method: method.map(str::to_string),
        })
    }

    #[track_caller]
    fn set_body(self, expression: ExpressionDefinition) -> Self {
        self.push_step(NodeKind::SetBody {
            expression: expression.into(),
        })
    }

    #[track_caller]
    fn set_header(self, name: impl Into<String>, expression: ExpressionDefinition) -> Self {
        self.push_step(NodeKind::SetHeader {
            name: name.into(),
            expression: expression.into(),
        })
    }

    #[track_caller]
    fn set_property(self, name: impl Into<String>, expression: ExpressionDefinition) -> Self {
        self.push_step(NodeKind::SetProperty {
            name: name.into(),
            expression: expression.into(),
        })
    }

    #[track_caller]
    fn remove_header(self, name: impl Into<String>) -> Self {
        self.push_step(NodeKind::RemoveHeader { name: name.into() })
    }

    #[track_caller]
    fn transform(self, expression: ExpressionDefinition) -> Self {
        self.push_step(NodeKind::Transform {
            expression: expression.into(),
        })
    }

    #[track_caller]
    fn convert_body_to(self, type_name: impl Into<String>) -> Self {
        self.push_step(NodeKind::ConvertBodyTo {
            type_name: type_name.into(),
            charset: None,
        })
    }

    #[track_caller]
    fn marshal(self, data_format: impl Into<String>) -> Self {
        self.push_step(NodeKind::Marshal {
            data_format: data_format.into(),
        })
    }

    #[track_caller]
    fn unmarshal(self, data_format: impl Into<String>) -> Self {
        self.push_step(NodeKind::Unmarshal {
            data_format: data_format.into(),
        })
    }

    #[track_caller]
    fn validate(self, predicate: ExpressionDefinition) -> Self {
        self.push_step(NodeKind::Validate {
            expression: predicate.into(),
        })
    }

    #[track_caller]
    fn enrich(self, expression: ExpressionDefinition) -> Self {
        self.push_step(NodeKind::Enrich {
            expression: expression.into(),
            aggregation_strategy: None,
        })
    }

    #[track_caller]
    fn recipient_list(self, expression: ExpressionDefinition) -> Self {
        self.push_step(NodeKind::RecipientList {
            expression: expression.into(),
            delimiter: None,
            parallel_processing: None,
        })
    }

    #[track_caller]
    fn routing_slip(self, expression: ExpressionDefinition) -> Self {
        self.push_step(NodeKind::RoutingSlip {
            expression: expression.into(),
            uri_delimiter: None,
        })
    }

    #[track_caller]
    fn wire_tap(self, uri: impl Into<String>) -> Self {
        self.push_step(NodeKind::WireTap {
            uri: uri.into(),
            copy: None,
        })
    }

    #[track_caller]
    fn delay(self, expression: ExpressionDefinition) -> Self {
        self.push_step(NodeKind::Delay {
            expression: expression.into(),
            async_delayed: None,
        })
    }

    #[track_caller]
    fn throttle(self, expression: ExpressionDefinition) -> Self {
        self.push_step(NodeKind::Throttle {
            expression: expression.into(),
            time_period_ms: None,
        })
    }

    #[track_caller]
    fn stop(self) -> Self {
        self.push_step(NodeKind::Stop)
    }

    #[track_caller]
    fn rollback(self, message: Option<&str>) -> Self {
        self.push_step(NodeKind::Rollback {
            message: message.map(str::to_string),
            mark_rollback_only: None,
        })
    }

    #[track_caller]
    fn throw_exception(self, exception_type: impl Into<String>, message: Option<&str>) -> Self {
        self.push_step(NodeKind::ThrowException {
            exception_type: exception_type.into(),
            message: message.map(str::to_string),
        })
    }

    #[track_caller]
    fn filter(self, predicate: ExpressionDefinition) -> Self {
        self.open_scope(NodeKind::Filter {
            expression: predicate.into(),
            status_property_name: None,
        })
    }

    #[track_caller]
    fn split(self, expression: ExpressionDefinition) -> Self {
        self.open_scope(NodeKind::split(expression.into()))
    }

    /// Opens a split whose expression is given next through
    /// [`expression`](Self::expression) or one of its shorthands
    #[track_caller]
    fn split_clause(self) -> Self {
        self.open_scope(NodeKind::split(ExpressionHolder::pending()))
    }

    #[track_caller]
    fn aggregate(self, correlation: ExpressionDefinition) -> Self {
        self.open_scope(NodeKind::aggregate(correlation.into()))
    }

    #[track_caller]
    fn aggregate_clause(self) -> Self {
        self.open_scope(NodeKind::aggregate(ExpressionHolder::pending()))
    }

    #[track_caller]
    fn multicast(self) -> Self {
        self.open_scope(NodeKind::Multicast {
            parallel_processing: None,
            stop_on_exception: None,
            aggregation_strategy: None,
        })
    }

    #[track_caller]
    fn pipeline(self) -> Self {
        self.open_scope(NodeKind::Pipeline)
    }

    #[track_caller]
    fn step(self) -> Self {
        self.open_scope(NodeKind::Step)
    }

    #[track_caller]
    fn loop_count(self, expression: ExpressionDefinition) -> Self {
        self.open_scope(NodeKind::Loop {
            expression: expression.into(),
            do_while: None,
            copy: None,
        })
    }

    #[track_caller]
    fn loop_do_while(self, predicate: ExpressionDefinition) -> Self {
        self.open_scope(NodeKind::Loop {
            expression: predicate.into(),
            do_while: Some(true),
            copy: None,
        })
    }

    #[track_caller]
    fn idempotent_consumer(
        self,
        expression: ExpressionDefinition,
        repository: impl Into<String>,
    ) -> Self {
        self.open_scope(NodeKind::IdempotentConsumer {
            expression: expression.into(),
            repository: repository.into(),
        })
    }

    #[track_caller]
    fn circuit_breaker(self) -> Self {
        self.open_scope(NodeKind::CircuitBreaker {
            configuration: None,
        })
    }

    /// Opens the fallback of the enclosing circuit breaker
    #[track_caller]
    fn on_fallback(self) -> Self {
        let caller = Location::caller();
        self.apply(|tree, state| {
            let is_breaker = |k: &NodeKind| matches!(k, NodeKind::CircuitBreaker { .. });
            let breaker = if is_breaker(tree.kind(state.cursor)) {
                state.cursor
            } else {
                tree.find_first_parent(state.cursor, is_breaker)
                    .ok_or_else(|| ModelError::UnbalancedEnd {
                        node: tree.kind(state.cursor).label(),
                        expected: "circuitBreaker",
                    })?
            };
            let fallback = tree.append_at(
                breaker,
                NodeKind::OnFallback {
                    fallback_via_network: None,
                },
                caller,
            )?;
            state.cursor = fallback;
            state.last = fallback;
            Ok(())
        })
    }

    #[track_caller]
    fn threads(self, pool_size: u32) -> Self {
        self.open_scope(NodeKind::Threads {
            pool_size: Some(pool_size),
            max_pool_size: None,
        })
    }

    #[track_caller]
    fn transacted(self, policy: Option<&str>) -> Self {
        self.open_scope(NodeKind::Transacted {
            policy: policy.map(str::to_string),
        })
    }

    #[track_caller]
    fn saga(self) -> Self {
        self.open_scope(NodeKind::saga())
    }

    #[track_caller]
    fn choice(self) -> Self {
        self.open_scope(NodeKind::Choice)
    }

    #[track_caller]
    fn when(self, predicate: ExpressionDefinition) -> Self {
        self.choice_clause(NodeKind::When {
            expression: predicate.into(),
        })
    }

    /// Opens a when clause whose predicate is given next
    #[track_caller]
    fn when_clause(self) -> Self {
        self.choice_clause(NodeKind::When {
            expression: ExpressionHolder::pending(),
        })
    }

    #[track_caller]
    fn otherwise(self) -> Self {
        self.choice_clause(NodeKind::Otherwise)
    }

    #[track_caller]
    fn choice_clause(self, clause: NodeKind) -> Self {
        let caller = Location::caller();
        self.apply(|tree, state| {
            let choice = match tree.kind(state.cursor) {
                NodeKind::Choice => state.cursor,
                _ => tree.end_choice(state.cursor)?,
            };
            state.last = tree.add_clause_at(choice, clause, caller)?;
            state.cursor = choice;
            Ok(())
        })
    }

    /// Returns to the enclosing choice
    fn end_choice(self) -> Self {
        self.apply(|tree, state| {
            state.cursor = tree.end_choice(state.cursor)?;
            state.last = state.cursor;
            Ok(())
        })
    }

    #[track_caller]
    fn do_try(self) -> Self {
        self.open_scope(NodeKind::Try)
    }

    #[track_caller]
    fn do_catch<I, S>(self, exceptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let exceptions = exceptions.into_iter().map(Into::into).collect();
        self.try_clause(NodeKind::Catch {
            exceptions,
            on_when: None,
        })
    }

    #[track_caller]
    fn do_finally(self) -> Self {
        self.try_clause(NodeKind::Finally)
    }

    #[track_caller]
    fn try_clause(self, clause: NodeKind) -> Self {
        let caller = Location::caller();
        self.apply(|tree, state| {
            let try_node = tree.end_do_try(state.cursor)?;
            state.last = tree.add_clause_at(try_node, clause, caller)?;
            state.cursor = try_node;
            Ok(())
        })
    }

    /// Returns to the enclosing try
    fn end_do_try(self) -> Self {
        self.apply(|tree, state| {
            state.cursor = tree.end_do_try(state.cursor)?;
            state.last = state.cursor;
            Ok(())
        })
    }

    /// Closes the current scope
    fn end(self) -> Self {
        self.apply(|tree, state| {
            state.last = state.cursor;
            state.cursor = tree.end(state.cursor);
            Ok(())
        })
    }

    #[track_caller]
    fn on_exception<I, S>(self, exceptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.open_scope(NodeKind::on_exception(exceptions))
    }

    /// Opens an on-completion at the cursor.
    ///
    /// Any on-completion already declared there is replaced, so at most one
    /// remains per route.
    #[track_caller]
    fn on_completion(self) -> Self {
        let caller = Location::caller();
        self.apply(|tree, state| {
            let parent = state.cursor;
            let existing: Vec<NodeId> = tree
                .outputs(parent)
                .iter()
                .copied()
                .filter(|&n| matches!(tree.kind(n), NodeKind::OnCompletion { .. }))
                .collect();
            for node in existing {
                tree.detach(node);
            }

            tree.pop_block(parent);
            let node = tree.append_at(parent, NodeKind::on_completion(), caller)?;
            tree.push_block(parent, node);
            state.cursor = node;
            state.last = node;
            Ok(())
        })
    }

    /// Completes the pending expression clause at the cursor
    fn expression(self, expression: ExpressionDefinition) -> Self {
        self.apply(|tree, state| {
            let target = match tree.kind(state.cursor) {
                NodeKind::Choice => *tree.blocks(state.cursor).last().unwrap_or(&state.cursor),
                _ => state.cursor,
            };
            tree.complete_clause(target, expression)
        })
    }

    fn simple(self, text: impl Into<String>) -> Self {
        self.expression(ExpressionDefinition::simple(text))
    }

    fn header(self, name: impl Into<String>) -> Self {
        self.expression(ExpressionDefinition::header(name))
    }

    fn constant(self, value: impl Into<String>) -> Self {
        self.expression(ExpressionDefinition::constant(value))
    }

    /// Sets the id of the most recently added node
    fn id(self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.apply(|tree, state| {
            tree.set_id(state.last, id);
            Ok(())
        })
    }

    /// Sets the description of the most recently added node
    fn description(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.apply(|tree, state| {
            tree.header_mut(state.last).description = Some(text);
            Ok(())
        })
    }

    /// Disables the most recently added node; accepts placeholders
    fn disabled(self, flag: impl Into<String>) -> Self {
        let flag = flag.into();
        self.apply(|tree, state| {
            tree.header_mut(state.last).disabled = Some(flag);
            Ok(())
        })
    }

    fn handled(self, predicate: ExpressionDefinition) -> Self {
        self.configure("handled", |kind| match kind {
            NodeKind::OnException { handled, .. } => {
                *handled = Some(predicate);
                true
            }
            _ => false,
        })
    }

    fn continued(self, predicate: ExpressionDefinition) -> Self {
        self.configure("continued", |kind| match kind {
            NodeKind::OnException { continued, .. } => {
                *continued = Some(predicate);
                true
            }
            _ => false,
        })
    }

    fn use_original_message(self) -> Self {
        self.configure("useOriginalMessage", |kind| match kind {
            NodeKind::OnException {
                use_original_message,
                ..
            } => {
                *use_original_message = Some(true);
                true
            }
            _ => false,
        })
    }

    fn on_when(self, predicate: ExpressionDefinition) -> Self {
        self.configure("onWhen", |kind| match kind {
            NodeKind::OnException { on_when, .. }
            | NodeKind::OnCompletion { on_when, .. }
            | NodeKind::Intercept { on_when }
            | NodeKind::InterceptFrom { on_when, .. }
            | NodeKind::InterceptSendToEndpoint { on_when, .. }
            | NodeKind::Catch { on_when, .. } => {
                *on_when = Some(predicate);
                true
            }
            _ => false,
        })
    }

    fn completion_predicate(self, predicate: ExpressionDefinition) -> Self {
        self.apply(|tree, state| tree.set_completion_predicate(state.cursor, predicate))
    }

    fn completion_size(self, size: i32) -> Self {
        self.configure("completionSize", |kind| match kind {
            NodeKind::Aggregate {
                completion_size, ..
            } => {
                *completion_size = Some(size);
                true
            }
            _ => false,
        })
    }

    fn completion_timeout_ms(self, timeout: u64) -> Self {
        self.configure("completionTimeout", |kind| match kind {
            NodeKind::Aggregate {
                completion_timeout_ms,
                ..
            } => {
                *completion_timeout_ms = Some(timeout);
                true
            }
            _ => false,
        })
    }

    fn aggregation_strategy(self, reference: impl Into<String>) -> Self {
        let reference = reference.into();
        self.configure("aggregationStrategy", |kind| match kind {
            NodeKind::Aggregate {
                aggregation_strategy,
                ..
            }
            | NodeKind::Split {
                aggregation_strategy,
                ..
            }
            | NodeKind::Multicast {
                aggregation_strategy,
                ..
            } => {
                *aggregation_strategy = Some(reference);
                true
            }
            _ => false,
        })
    }

    fn parallel_processing(self) -> Self {
        self.configure("parallelProcessing", |kind| match kind {
            NodeKind::Split {
                parallel_processing,
                ..
            }
            | NodeKind::Multicast {
                parallel_processing,
                ..
            }
            | NodeKind::OnCompletion {
                parallel_processing,
                ..
            } => {
                *parallel_processing = Some(true);
                true
            }
            _ => false,
        })
    }
}

/// Fluent builder producing a [`RouteDefinition`]
#[derive(Debug)]
pub struct RouteBuilder {
    route: RouteDefinition,
    state: BuildState,
}

impl RouteBuilder {
    /// Route without an input; set one with [`input`](Self::input)
    pub fn new(ctx: &ModelContext) -> Self {
        let route = RouteDefinition::new(ctx);
        let state = BuildState::at(route.root());
        Self { route, state }
    }

    pub fn from(ctx: &ModelContext, uri: impl Into<String>) -> Self {
        let route = RouteDefinition::from(ctx, uri);
        let state = BuildState::at(route.root());
        Self { route, state }
    }

    pub fn input(mut self, uri: impl Into<String>) -> Self {
        self.route.set_input(uri);
        self
    }

    pub fn route_id(mut self, id: impl Into<String>) -> Self {
        self.route.set_id(id);
        self
    }

    pub fn route_description(mut self, description: impl Into<String>) -> Self {
        self.route.set_description(description);
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.route.group = Some(group.into());
        self
    }

    pub fn startup_order(mut self, order: i32) -> Self {
        self.route.startup_order = Some(order);
        self
    }

    pub fn auto_startup(mut self, auto_startup: bool) -> Self {
        self.route.auto_startup = Some(auto_startup);
        self
    }

    pub fn precondition(mut self, precondition: impl Into<String>) -> Self {
        self.route.precondition = Some(precondition.into());
        self
    }

    /// Comma separated configuration id patterns to apply
    pub fn route_configuration_id(mut self, ids: impl Into<String>) -> Self {
        self.route.set_route_configuration_ids(ids);
        self
    }

    pub fn error_handler(mut self, handler: ErrorHandlerDefinition) -> Self {
        self.route.set_error_handler(handler);
        self
    }

    pub fn no_error_handler(self) -> Self {
        self.error_handler(ErrorHandlerDefinition::NoErrorHandler)
    }

    pub fn stream_caching(mut self, enabled: bool) -> Self {
        self.route.stream_caching = Some(enabled);
        self
    }

    pub fn tracing(mut self, enabled: bool) -> Self {
        self.route.tracing = Some(enabled);
        self
    }

    pub fn message_history(mut self, enabled: bool) -> Self {
        self.route.message_history = Some(enabled);
        self
    }

    pub fn log_mask(mut self, enabled: bool) -> Self {
        self.route.log_mask = Some(enabled);
        self
    }

    pub fn input_type(mut self, type_name: impl Into<String>) -> Self {
        self.route.input_type = Some(type_name.into());
        self
    }

    pub fn output_type(mut self, type_name: impl Into<String>) -> Self {
        self.route.output_type = Some(type_name.into());
        self
    }

    pub fn state(&self) -> &BuildState {
        &self.state
    }

    /// Finishes the route, surfacing the first step that failed
    pub fn build(self) -> Result<RouteDefinition> {
        match self.state.error {
            Some(e) => Err(e),
            None => Ok(self.route),
        }
    }
}

impl StepBuilder for RouteBuilder {
    fn parts(&mut self) -> (&mut NodeTree, &mut BuildState) {
        (self.route.tree_mut(), &mut self.state)
    }
}

/// 路由配置构建器
#[derive(Debug)]
pub struct RouteConfigurationBuilder {
    config: RouteConfigurationDefinition,
    state: BuildState,
}

impl RouteConfigurationBuilder {
    pub fn new(ctx: &ModelContext) -> Self {
        let config = RouteConfigurationDefinition::new(ctx);
        let state = BuildState::at(config.root());
        Self { config, state }
    }

    pub fn configuration_id(mut self, id: impl Into<String>) -> Self {
        self.config.set_id(id);
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.config.order = order;
        self
    }

    pub fn error_handler(mut self, handler: ErrorHandlerDefinition) -> Self {
        self.config.error_handler = Some(handler);
        self
    }

    pub fn precondition(mut self, precondition: impl Into<String>) -> Self {
        self.config.precondition = Some(precondition.into());
        self
    }

    pub fn configuration_description(mut self, description: impl Into<String>) -> Self {
        self.config.description = Some(description.into());
        self
    }

    /// Intercepts every step of matching routes
    #[track_caller]
    pub fn intercept(self) -> Self {
        self.open_scope(NodeKind::Intercept { on_when: None })
    }

    /// Intercepts route inputs matching `uri`; `None` intercepts all
    #[track_caller]
    pub fn intercept_from(self, uri: Option<&str>) -> Self {
        self.open_scope(NodeKind::InterceptFrom {
            uri: uri.map(str::to_string),
            on_when: None,
        })
    }

    #[track_caller]
    pub fn intercept_send_to_endpoint(self, uri: impl Into<String>) -> Self {
        self.open_scope(NodeKind::InterceptSendToEndpoint {
            uri: uri.into(),
            skip_send_to_original_endpoint: None,
            after_uri: None,
            on_when: None,
        })
    }

    pub fn skip_send_to_original_endpoint(self) -> Self {
        self.configure("skipSendToOriginalEndpoint", |kind| match kind {
            NodeKind::InterceptSendToEndpoint {
                skip_send_to_original_endpoint,
                ..
            } => {
                *skip_send_to_original_endpoint = Some(true);
                true
            }
            _ => false,
        })
    }

    pub fn build(mut self) -> Result<RouteConfigurationDefinition> {
        if let Some(e) = self.state.error {
            return Err(e);
        }
        if let Some(id) = self.config.id().map(str::to_string) {
            let root = self.config.root();
            let tree = self.config.tree_mut();
            for node in tree.outputs(root).to_vec() {
                tree.header_mut(node)
                    .route_configuration_id
                    .get_or_insert_with(|| id.clone());
            }
        }
        Ok(self.config)
    }
}

impl StepBuilder for RouteConfigurationBuilder {
    fn parts(&mut self) -> (&mut NodeTree, &mut BuildState) {
        (self.config.tree_mut(), &mut self.state)
    }
}
