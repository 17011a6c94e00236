use crate::config::*;
use anyhow::Context;
use routebuilder_context::ModelContext;
use routebuilder_core::{
    ExpressionHolder, ModelError, NodeId, NodeKind, NodeTree, Result, RouteConfigurationDefinition,
    RouteDefinition, RouteTemplateDefinition,
};
use tracing::debug;

/// 文档解析出的模型定义
#[derive(Debug, Default)]
pub struct ParsedRoutes {
    pub routes: Vec<RouteDefinition>,
    pub configurations: Vec<RouteConfigurationDefinition>,
    pub templates: Vec<RouteTemplateDefinition>,
}

impl ParsedRoutes {
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.configurations.is_empty() && self.templates.is_empty()
    }

    pub fn extend(&mut self, other: ParsedRoutes) {
        self.routes.extend(other.routes);
        self.configurations.extend(other.configurations);
        self.templates.extend(other.templates);
    }
}

/// YAML 路由解析器，把文档条目转换为路由模型
#[derive(Clone)]
pub struct YamlRouteParser {
    ctx: ModelContext,
    resource: Option<String>,
}

impl YamlRouteParser {
    pub fn new(ctx: ModelContext) -> Self {
        Self {
            ctx,
            resource: None,
        }
    }

    /// Resource name stamped as the source location of parsed nodes
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn context(&self) -> &ModelContext {
        &self.ctx
    }

    /// 解析整个文档
    pub fn parse(&self, document: &RoutesDocument) -> anyhow::Result<ParsedRoutes> {
        let mut parsed = ParsedRoutes::default();
        for (index, entry) in document.entries.iter().enumerate() {
            match entry {
                DocumentEntry::Route(route) => {
                    let route = self.build_route(route).with_context(|| {
                        format!("Failed to build route {}", entry_name(route.id.as_deref(), index))
                    })?;
                    parsed.routes.push(route);
                }
                DocumentEntry::RouteConfiguration(config) => {
                    let config = self.build_route_configuration(config).with_context(|| {
                        format!(
                            "Failed to build route configuration {}",
                            entry_name(config.id.as_deref(), index)
                        )
                    })?;
                    parsed.configurations.push(config);
                }
                DocumentEntry::RouteTemplate(template) => {
                    let template = self
                        .build_route_template(template)
                        .with_context(|| format!("Failed to build route template {}", template.id))?;
                    parsed.templates.push(template);
                }
            }
        }
        debug!(
            resource = self.resource.as_deref().unwrap_or("<inline>"),
            routes = parsed.routes.len(),
            configurations = parsed.configurations.len(),
            templates = parsed.templates.len(),
            "routes document parsed"
        );
        Ok(parsed)
    }

    pub fn build_route(&self, entry: &RouteEntry) -> Result<RouteDefinition> {
        if entry.from.trim().is_empty() {
            return Err(ModelError::NoInput(
                entry.id.clone().unwrap_or_else(|| "<unnamed>".to_string()),
            ));
        }

        let mut route = RouteDefinition::from(&self.ctx, entry.from.clone());
        if let Some(resource) = &self.resource {
            route.tree_mut().set_resource(resource.clone());
        }
        if let Some(id) = &entry.id {
            route.set_id(id.clone());
        }
        if let Some(description) = &entry.description {
            route.set_description(description.clone());
        }
        if let Some(ids) = &entry.route_configuration_id {
            route.set_route_configuration_ids(ids.clone());
        }
        if let Some(handler) = &entry.error_handler {
            route.set_error_handler(handler.clone());
        }
        route.group = entry.group.clone();
        route.precondition = entry.precondition.clone();
        route.startup_order = entry.startup_order;
        route.auto_startup = entry.auto_startup;
        route.stream_caching = entry.stream_caching;
        route.tracing = entry.tracing;
        route.message_history = entry.message_history;
        route.log_mask = entry.log_mask;
        route.input_type = entry.input_type.clone();
        route.output_type = entry.output_type.clone();
        route.rest = entry.rest.clone();

        let root = route.root();
        self.add_steps(route.tree_mut(), root, &entry.steps)?;
        Ok(route)
    }

    pub fn build_route_configuration(
        &self,
        entry: &RouteConfigurationEntry,
    ) -> Result<RouteConfigurationDefinition> {
        let mut config = RouteConfigurationDefinition::new(&self.ctx);
        // id 需先设置，add() 会把它记录到节点上
        if let Some(id) = &entry.id {
            config.set_id(id.clone());
        }
        if let Some(resource) = &self.resource {
            config.tree_mut().set_resource(resource.clone());
        }
        config.description = entry.description.clone();
        config.order = entry.order;
        config.precondition = entry.precondition.clone();
        config.error_handler = entry.error_handler.clone();

        for e in &entry.on_exception {
            let node = config.add(on_exception_kind(e))?;
            self.finish_node(config.tree_mut(), node, Some(&e.attributes), &e.steps)?;
        }
        for e in &entry.intercept {
            let node = config.add(intercept_kind(e))?;
            self.finish_node(config.tree_mut(), node, Some(&e.attributes), &e.steps)?;
        }
        for e in &entry.intercept_from {
            let node = config.add(intercept_from_kind(e))?;
            self.finish_node(config.tree_mut(), node, Some(&e.attributes), &e.steps)?;
        }
        for e in &entry.intercept_send_to_endpoint {
            let node = config.add(intercept_send_to_endpoint_kind(e))?;
            self.finish_node(config.tree_mut(), node, Some(&e.attributes), &e.steps)?;
        }
        for e in &entry.on_completion {
            let node = config.add(on_completion_kind(e))?;
            self.finish_node(config.tree_mut(), node, Some(&e.attributes), &e.steps)?;
        }
        Ok(config)
    }

    pub fn build_route_template(
        &self,
        entry: &RouteTemplateEntry,
    ) -> Result<RouteTemplateDefinition> {
        let route = self.build_route(&entry.route)?;
        let mut template = RouteTemplateDefinition::new(entry.id.clone(), route);
        template.description = entry.description.clone();
        template.parameters = entry.parameters.clone();
        template.beans = entry.beans.clone();
        Ok(template)
    }

    fn add_steps(&self, tree: &mut NodeTree, parent: NodeId, steps: &[StepEntry]) -> Result<()> {
        for step in steps {
            self.add_step(tree, parent, step)?;
        }
        Ok(())
    }

    fn add_step(&self, tree: &mut NodeTree, parent: NodeId, step: &StepEntry) -> Result<NodeId> {
        match step {
            StepEntry::Choice(choice) => self.add_choice(tree, parent, choice),
            StepEntry::DoTry(entry) => self.add_try(tree, parent, entry),
            StepEntry::CircuitBreaker(entry) => self.add_circuit_breaker(tree, parent, entry),
            _ => {
                let (kind, attributes, steps) = node_kind(step)?;
                let node = tree.append(parent, kind)?;
                self.finish_node(tree, node, attributes, steps)?;
                Ok(node)
            }
        }
    }

    fn finish_node(
        &self,
        tree: &mut NodeTree,
        node: NodeId,
        attributes: Option<&StepAttributes>,
        steps: &[StepEntry],
    ) -> Result<()> {
        if let Some(attributes) = attributes {
            apply_attributes(tree, node, attributes);
        }
        self.add_steps(tree, node, steps)
    }

    fn add_choice(&self, tree: &mut NodeTree, parent: NodeId, entry: &ChoiceEntry) -> Result<NodeId> {
        let choice = tree.append(parent, NodeKind::Choice)?;
        apply_attributes(tree, choice, &entry.attributes);
        for when in &entry.when {
            let clause = tree.add_clause(
                choice,
                NodeKind::When {
                    expression: holder(&when.expression),
                },
            )?;
            self.finish_node(tree, clause, Some(&when.attributes), &when.steps)?;
        }
        if let Some(otherwise) = &entry.otherwise {
            let clause = tree.add_clause(choice, NodeKind::Otherwise)?;
            self.finish_node(tree, clause, Some(&otherwise.attributes), &otherwise.steps)?;
        }
        tree.pop_block(choice);
        Ok(choice)
    }

    fn add_try(&self, tree: &mut NodeTree, parent: NodeId, entry: &TryEntry) -> Result<NodeId> {
        let node = tree.append(parent, NodeKind::Try)?;
        // 先添加 try 主体，再打开 catch/finally 子句
        self.finish_node(tree, node, Some(&entry.attributes), &entry.steps)?;
        for catch in &entry.do_catch {
            let clause = tree.add_clause(
                node,
                NodeKind::Catch {
                    exceptions: catch.exceptions.clone(),
                    on_when: catch.on_when.as_ref().map(ExpressionEntry::to_definition),
                },
            )?;
            self.finish_node(tree, clause, Some(&catch.attributes), &catch.steps)?;
        }
        if let Some(finally) = &entry.do_finally {
            let clause = tree.add_clause(node, NodeKind::Finally)?;
            self.finish_node(tree, clause, Some(&finally.attributes), &finally.steps)?;
        }
        tree.pop_block(node);
        Ok(node)
    }

    fn add_circuit_breaker(
        &self,
        tree: &mut NodeTree,
        parent: NodeId,
        entry: &CircuitBreakerEntry,
    ) -> Result<NodeId> {
        let node = tree.append(
            parent,
            NodeKind::CircuitBreaker {
                configuration: entry.configuration.clone(),
            },
        )?;
        self.finish_node(tree, node, Some(&entry.attributes), &entry.steps)?;
        if let Some(fallback) = &entry.on_fallback {
            let fallback_node = tree.append(
                node,
                NodeKind::OnFallback {
                    fallback_via_network: None,
                },
            )?;
            self.finish_node(tree, fallback_node, Some(&fallback.attributes), &fallback.steps)?;
        }
        Ok(node)
    }
}

fn entry_name(id: Option<&str>, index: usize) -> String {
    match id {
        Some(id) => id.to_string(),
        None => format!("#{index}"),
    }
}

fn holder(expression: &ExpressionEntry) -> ExpressionHolder {
    expression.to_definition().into()
}

fn apply_attributes(tree: &mut NodeTree, node: NodeId, attributes: &StepAttributes) {
    if let Some(id) = &attributes.id {
        tree.set_id(node, id.clone());
    }
    let header = tree.header_mut(node);
    if let Some(description) = &attributes.description {
        header.description = Some(description.clone());
    }
    if let Some(disabled) = &attributes.disabled {
        header.disabled = Some(disabled.clone());
    }
}

fn on_exception_kind(e: &OnExceptionEntry) -> NodeKind {
    NodeKind::OnException {
        exceptions: e.exceptions.clone(),
        handled: e.handled.as_ref().map(ExpressionEntry::to_definition),
        continued: e.continued.as_ref().map(ExpressionEntry::to_definition),
        on_when: e.on_when.as_ref().map(ExpressionEntry::to_definition),
        redelivery_policy: e.redelivery_policy.clone(),
        use_original_message: e.use_original_message,
        route_scoped: None,
    }
}

fn on_completion_kind(e: &OnCompletionEntry) -> NodeKind {
    NodeKind::OnCompletion {
        mode: e.mode,
        trigger: e.trigger,
        on_when: e.on_when.as_ref().map(ExpressionEntry::to_definition),
        parallel_processing: e.parallel_processing,
        route_scoped: None,
    }
}

fn intercept_kind(e: &InterceptEntry) -> NodeKind {
    NodeKind::Intercept {
        on_when: e.on_when.as_ref().map(ExpressionEntry::to_definition),
    }
}

fn intercept_from_kind(e: &InterceptFromEntry) -> NodeKind {
    NodeKind::InterceptFrom {
        uri: e.uri.clone(),
        on_when: e.on_when.as_ref().map(ExpressionEntry::to_definition),
    }
}

fn intercept_send_to_endpoint_kind(e: &InterceptSendToEndpointEntry) -> NodeKind {
    NodeKind::InterceptSendToEndpoint {
        uri: e.uri.clone(),
        skip_send_to_original_endpoint: e.skip_send_to_original_endpoint,
        after_uri: e.after_uri.clone(),
        on_when: e.on_when.as_ref().map(ExpressionEntry::to_definition),
    }
}

type StepParts<'a> = (NodeKind, Option<&'a StepAttributes>, &'a [StepEntry]);

/// Node kind, header attributes and nested steps of a single-node step
fn node_kind(step: &StepEntry) -> Result<StepParts<'_>> {
    const NONE: &[StepEntry] = &[];
    let parts = match step {
        StepEntry::To(send) => {
            let (uri, pattern, attributes) = send_parts(send);
            (
                NodeKind::To {
                    uri,
                    pattern,
                },
                attributes,
                NONE,
            )
        }
        StepEntry::ToD(send) => {
            let (uri, _, attributes) = send_parts(send);
            (
                NodeKind::ToD {
                    uri,
                    cache_size: None,
                    ignore_invalid_endpoint: None,
                },
                attributes,
                NONE,
            )
        }
        StepEntry::WireTap(send) => {
            let (uri, _, attributes) = send_parts(send);
            (NodeKind::WireTap { uri, copy: None }, attributes, NONE)
        }
        StepEntry::Log(LogEntry::Message(message)) => (NodeKind::log(message.clone()), None, NONE),
        StepEntry::Log(LogEntry::Full {
            message,
            logging_level,
            log_name,
            attributes,
        }) => (
            NodeKind::Log {
                message: message.clone(),
                logging_level: *logging_level,
                log_name: log_name.clone(),
            },
            Some(attributes),
            NONE,
        ),
        StepEntry::Process(e) => (
            NodeKind::Process {
                reference: e.reference.clone(),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::Bean(e) => (
            NodeKind::Bean {
                reference: e.reference.clone(),
                method: e.method.clone(),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::SetBody(e) => (
            NodeKind::SetBody {
                expression: holder(&e.expression),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::SetHeader(e) => (
            NodeKind::SetHeader {
                name: e.name.clone(),
                expression: holder(&e.expression),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::SetProperty(e) => (
            NodeKind::SetProperty {
                name: e.name.clone(),
                expression: holder(&e.expression),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::RemoveHeader(e) => (
            NodeKind::RemoveHeader {
                name: e.name.clone(),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::Transform(e) => (
            NodeKind::Transform {
                expression: holder(&e.expression),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::ConvertBodyTo(e) => (
            NodeKind::ConvertBodyTo {
                type_name: e.type_name.clone(),
                charset: e.charset.clone(),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::Marshal(e) => (
            NodeKind::Marshal {
                data_format: e.data_format.clone(),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::Unmarshal(e) => (
            NodeKind::Unmarshal {
                data_format: e.data_format.clone(),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::Validate(e) => (
            NodeKind::Validate {
                expression: holder(&e.expression),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::Enrich(e) => (
            NodeKind::Enrich {
                expression: holder(&e.expression),
                aggregation_strategy: None,
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::PollEnrich(e) => (
            NodeKind::PollEnrich {
                expression: holder(&e.expression),
                timeout_ms: e.timeout_ms,
                aggregation_strategy: e.aggregation_strategy.clone(),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::RecipientList(e) => (
            NodeKind::RecipientList {
                expression: holder(&e.expression),
                delimiter: None,
                parallel_processing: None,
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::RoutingSlip(e) => (
            NodeKind::RoutingSlip {
                expression: holder(&e.expression),
                uri_delimiter: None,
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::DynamicRouter(e) => (
            NodeKind::DynamicRouter {
                expression: holder(&e.expression),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::Delay(e) => (
            NodeKind::Delay {
                expression: holder(&e.expression),
                async_delayed: None,
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::Throttle(e) => (
            NodeKind::Throttle {
                expression: holder(&e.expression),
                time_period_ms: None,
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::Filter(e) => (
            NodeKind::Filter {
                expression: holder(&e.expression),
                status_property_name: None,
            },
            Some(&e.attributes),
            &e.steps[..],
        ),
        StepEntry::Split(e) => (
            NodeKind::Split {
                expression: holder(&e.expression),
                parallel_processing: e.parallel_processing,
                streaming: e.streaming,
                stop_on_exception: e.stop_on_exception,
                aggregation_strategy: e.aggregation_strategy.clone(),
            },
            Some(&e.attributes),
            &e.steps[..],
        ),
        StepEntry::Aggregate(e) => (
            NodeKind::Aggregate {
                correlation_expression: holder(&e.correlation_expression),
                completion_predicate: e
                    .completion_predicate
                    .as_ref()
                    .map(ExpressionEntry::to_definition),
                completion_size: e.completion_size,
                completion_timeout_ms: e.completion_timeout_ms,
                aggregation_strategy: e.aggregation_strategy.clone(),
                aggregation_repository: e.aggregation_repository.clone(),
            },
            Some(&e.attributes),
            &e.steps[..],
        ),
        StepEntry::Loop(e) => (
            NodeKind::Loop {
                expression: holder(&e.expression),
                do_while: e.do_while,
                copy: e.copy,
            },
            Some(&e.attributes),
            &e.steps[..],
        ),
        StepEntry::IdempotentConsumer(e) => (
            NodeKind::IdempotentConsumer {
                expression: holder(&e.expression),
                repository: e.repository.clone(),
            },
            Some(&e.attributes),
            &e.steps[..],
        ),
        StepEntry::Multicast(e) => (
            NodeKind::Multicast {
                parallel_processing: e.parallel_processing,
                stop_on_exception: e.stop_on_exception,
                aggregation_strategy: e.aggregation_strategy.clone(),
            },
            Some(&e.attributes),
            &e.steps[..],
        ),
        StepEntry::Pipeline(e) => (NodeKind::Pipeline, Some(&e.attributes), &e.steps[..]),
        StepEntry::Step(e) => (NodeKind::Step, Some(&e.attributes), &e.steps[..]),
        StepEntry::Threads(e) => (
            NodeKind::Threads {
                pool_size: e.pool_size,
                max_pool_size: e.max_pool_size,
            },
            Some(&e.attributes),
            &e.steps[..],
        ),
        StepEntry::Transacted(e) => (
            NodeKind::Transacted {
                policy: e.policy.clone(),
            },
            Some(&e.attributes),
            &e.steps[..],
        ),
        StepEntry::Saga(e) => (
            NodeKind::Saga {
                propagation: e.propagation,
                completion_mode: e.completion_mode,
                compensation: e.compensation.clone(),
                completion: e.completion.clone(),
                timeout_ms: e.timeout_ms,
            },
            Some(&e.attributes),
            &e.steps[..],
        ),
        StepEntry::OnException(e) => (on_exception_kind(e), Some(&e.attributes), &e.steps[..]),
        StepEntry::OnCompletion(e) => (on_completion_kind(e), Some(&e.attributes), &e.steps[..]),
        StepEntry::Intercept(e) => (intercept_kind(e), Some(&e.attributes), &e.steps[..]),
        StepEntry::InterceptFrom(e) => {
            (intercept_from_kind(e), Some(&e.attributes), &e.steps[..])
        }
        StepEntry::InterceptSendToEndpoint(e) => (
            intercept_send_to_endpoint_kind(e),
            Some(&e.attributes),
            &e.steps[..],
        ),
        StepEntry::Stop(attributes) => (NodeKind::Stop, Some(attributes), NONE),
        StepEntry::Rollback(e) => (
            NodeKind::Rollback {
                message: e.message.clone(),
                mark_rollback_only: e.mark_rollback_only,
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::ThrowException(e) => (
            NodeKind::ThrowException {
                exception_type: e.exception_type.clone(),
                message: e.message.clone(),
            },
            Some(&e.attributes),
            NONE,
        ),
        StepEntry::Choice(_) | StepEntry::DoTry(_) | StepEntry::CircuitBreaker(_) => {
            return Err(ModelError::InvalidValue {
                what: "single-node step",
                value: step.name().to_string(),
            })
        }
    };
    Ok(parts)
}

fn send_parts(
    send: &SendEntry,
) -> (
    String,
    Option<routebuilder_core::ExchangePattern>,
    Option<&StepAttributes>,
) {
    match send {
        SendEntry::Uri(uri) => (uri.clone(), None, None),
        SendEntry::Full {
            uri,
            pattern,
            attributes,
        } => (uri.clone(), *pattern, Some(attributes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routebuilder_context::NodeCounter;
    use std::sync::Arc;

    fn parser() -> YamlRouteParser {
        let ctx = ModelContext::builder()
            .counter(Arc::new(NodeCounter::new()))
            .source_location(true)
            .build();
        YamlRouteParser::new(ctx).with_resource("routes/orders.yaml")
    }

    fn parse(yaml: &str) -> ParsedRoutes {
        let document: RoutesDocument = serde_yaml::from_str(yaml).unwrap();
        parser().parse(&document).unwrap()
    }

    fn labels(tree: &NodeTree, node: NodeId) -> Vec<String> {
        tree.outputs(node)
            .iter()
            .map(|&n| tree.kind(n).label())
            .collect()
    }

    #[test]
    fn test_parse_simple_route() {
        let parsed = parse(
            r#"
- route:
    id: orders
    from: direct:orders
    group: sales
    startup-order: 3
    tracing: true
    log-mask: false
    steps:
      - log: "received ${body}"
      - to:
          uri: mock:orders
          id: send-orders
          description: outbound
"#,
        );
        assert_eq!(parsed.routes.len(), 1);
        let route = &parsed.routes[0];
        assert_eq!(route.id(), Some("orders"));
        assert!(route.has_custom_id());
        assert_eq!(route.endpoint_uri(), Some("direct:orders"));
        assert_eq!(route.group.as_deref(), Some("sales"));
        assert_eq!(route.startup_order, Some(3));
        assert_eq!(route.tracing, Some(true));
        assert_eq!(route.log_mask, Some(false));
        assert_eq!(route.stream_caching, None);

        let outputs = route.outputs();
        assert_eq!(outputs.len(), 2);
        let to = route.tree().header(outputs[1]);
        assert_eq!(to.id.as_deref(), Some("send-orders"));
        assert!(to.custom_id);
        assert_eq!(to.description.as_deref(), Some("outbound"));
        assert_eq!(
            to.location.as_ref().map(|l| l.resource.as_str()),
            Some("routes/orders.yaml")
        );
    }

    #[test]
    fn test_parse_choice_clauses() {
        let parsed = parse(
            r#"
- route:
    from: direct:choice
    steps:
      - choice:
          when:
            - expression: { simple: "${header.kind} == 'a'" }
              steps:
                - to: mock:a
            - expression: { simple: "${header.kind} == 'b'" }
              steps:
                - to: mock:b
                - log: b
          otherwise:
            steps:
              - to: mock:other
      - to: mock:after
"#,
        );
        let route = &parsed.routes[0];
        let tree = route.tree();
        let outputs = route.outputs();
        assert_eq!(outputs.len(), 2);
        let choice = outputs[0];
        let clauses = tree.outputs(choice);
        assert_eq!(clauses.len(), 3);
        assert_eq!(labels(tree, clauses[1]).len(), 2);
        assert!(matches!(tree.kind(clauses[2]), NodeKind::Otherwise));
        assert!(tree.blocks(choice).is_empty());
    }

    #[test]
    fn test_parse_try_catch_finally() {
        let parsed = parse(
            r#"
- route:
    from: direct:try
    steps:
      - do-try:
          steps:
            - to: mock:risky
          do-catch:
            - exceptions: [IoError, TimeoutError]
              steps:
                - log: caught
          do-finally:
            steps:
              - to: mock:cleanup
"#,
        );
        let route = &parsed.routes[0];
        let tree = route.tree();
        let try_node = route.outputs()[0];
        let children = tree.outputs(try_node);
        assert_eq!(children.len(), 3);
        assert!(matches!(tree.kind(children[0]), NodeKind::To { .. }));
        match tree.kind(children[1]) {
            NodeKind::Catch { exceptions, .. } => {
                assert_eq!(exceptions, &vec!["IoError".to_string(), "TimeoutError".to_string()])
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(tree.kind(children[2]), NodeKind::Finally));
        assert_eq!(tree.outputs(children[2]).len(), 1);
    }

    #[test]
    fn test_parse_route_configuration() {
        let parsed = parse(
            r#"
- route-configuration:
    id: errors
    order: 2
    error-handler:
      dead-letter-channel:
        dead-letter-uri: jms:queue:dead
    on-exception:
      - exceptions: [ValidationError]
        handled: { constant: "true" }
        steps:
          - log: invalid
    intercept-from:
      - uri: "jms:*"
        steps:
          - to: mock:audit
"#,
        );
        let config = &parsed.configurations[0];
        assert_eq!(config.id(), Some("errors"));
        assert_eq!(config.order, 2);
        assert!(config.error_handler.is_some());
        assert_eq!(config.on_exceptions().len(), 1);
        assert_eq!(config.intercept_froms().len(), 1);
        let on_exception = config.on_exceptions()[0];
        assert_eq!(
            config.tree().header(on_exception).route_configuration_id.as_deref(),
            Some("errors")
        );
    }

    #[test]
    fn test_parse_route_template() {
        let parsed = parse(
            r#"
- route-template:
    id: greeter
    parameters:
      - name: name
      - name: greeting
        default-value: Hello
        required: false
    route:
      from: "timer:{{name}}"
      steps:
        - log: "{{greeting}} {{name}}"
"#,
        );
        let template = &parsed.templates[0];
        assert_eq!(template.id, "greeter");
        assert_eq!(template.parameters.len(), 2);
        assert!(template.parameters[0].is_required());
        assert!(!template.parameters[1].is_required());
    }

    #[test]
    fn test_top_level_only_step_rejected_when_nested() {
        let document: RoutesDocument = serde_yaml::from_str(
            r#"
- route:
    from: direct:nested
    steps:
      - filter:
          expression: { simple: "${body} != null" }
          steps:
            - on-exception:
                exceptions: [IoError]
"#,
        )
        .unwrap();
        let err = parser().parse(&document).unwrap_err();
        assert!(err.to_string().contains("Failed to build route #0"));
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::TopLevelOnly { .. })
        ));
    }

    #[test]
    fn test_empty_from_rejected() {
        let err = parser()
            .build_route(&RouteEntry {
                id: Some("broken".into()),
                ..RouteEntry::default()
            })
            .unwrap_err();
        assert_eq!(err, ModelError::NoInput("broken".into()));
    }
}
