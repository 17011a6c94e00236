//! The closed set of route node kinds.
//!
//! Every EIP is one variant carrying its own configuration; structural
//! behaviour (abstract, top-level-only, output holder) is answered by
//! matching on the variant.

use crate::expression::{ExpressionDefinition, ExpressionHolder};
use routebuilder_context::RedeliveryPolicyDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExchangePattern {
    InOnly,
    InOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoggingLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnCompletionMode {
    AfterConsumer,
    BeforeConsumer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnCompletionTrigger {
    Always,
    CompleteOnly,
    FailureOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SagaPropagation {
    Required,
    RequiresNew,
    Mandatory,
    Supports,
    NotSupported,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SagaCompletionMode {
    Auto,
    Manual,
}

/// Kind-specific payload of a route node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NodeKind {
    Route,
    RouteConfiguration,

    To {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<ExchangePattern>,
    },
    ToD {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_size: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ignore_invalid_endpoint: Option<bool>,
    },
    Log {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        logging_level: Option<LoggingLevel>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        log_name: Option<String>,
    },
    Process {
        reference: String,
    },
    Bean {
        reference: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
    },
    SetBody {
        expression: ExpressionHolder,
    },
    SetHeader {
        name: String,
        expression: ExpressionHolder,
    },
    SetProperty {
        name: String,
        expression: ExpressionHolder,
    },
    RemoveHeader {
        name: String,
    },
    Transform {
        expression: ExpressionHolder,
    },
    ConvertBodyTo {
        type_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        charset: Option<String>,
    },
    Marshal {
        data_format: String,
    },
    Unmarshal {
        data_format: String,
    },
    Filter {
        expression: ExpressionHolder,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status_property_name: Option<String>,
    },
    Validate {
        expression: ExpressionHolder,
    },
    Choice,
    When {
        expression: ExpressionHolder,
    },
    Otherwise,
    Split {
        expression: ExpressionHolder,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parallel_processing: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        streaming: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stop_on_exception: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation_strategy: Option<String>,
    },
    Aggregate {
        correlation_expression: ExpressionHolder,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completion_predicate: Option<ExpressionDefinition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completion_size: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completion_timeout_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation_strategy: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation_repository: Option<String>,
    },
    Multicast {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parallel_processing: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stop_on_exception: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation_strategy: Option<String>,
    },
    Pipeline,
    Step,
    Loop {
        expression: ExpressionHolder,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        do_while: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        copy: Option<bool>,
    },
    Enrich {
        expression: ExpressionHolder,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation_strategy: Option<String>,
    },
    PollEnrich {
        expression: ExpressionHolder,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation_strategy: Option<String>,
    },
    RoutingSlip {
        expression: ExpressionHolder,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uri_delimiter: Option<String>,
    },
    RecipientList {
        expression: ExpressionHolder,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delimiter: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parallel_processing: Option<bool>,
    },
    DynamicRouter {
        expression: ExpressionHolder,
    },
    WireTap {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        copy: Option<bool>,
    },
    Delay {
        expression: ExpressionHolder,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        async_delayed: Option<bool>,
    },
    Throttle {
        expression: ExpressionHolder,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_period_ms: Option<u64>,
    },
    IdempotentConsumer {
        expression: ExpressionHolder,
        repository: String,
    },
    CircuitBreaker {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        configuration: Option<String>,
    },
    OnFallback {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback_via_network: Option<bool>,
    },
    Threads {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pool_size: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_pool_size: Option<u32>,
    },
    Try,
    Catch {
        #[serde(default)]
        exceptions: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_when: Option<ExpressionDefinition>,
    },
    Finally,
    OnException {
        exceptions: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        handled: Option<ExpressionDefinition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        continued: Option<ExpressionDefinition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_when: Option<ExpressionDefinition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        redelivery_policy: Option<RedeliveryPolicyDefinition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        use_original_message: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        route_scoped: Option<bool>,
    },
    OnCompletion {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<OnCompletionMode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trigger: Option<OnCompletionTrigger>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_when: Option<ExpressionDefinition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parallel_processing: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        route_scoped: Option<bool>,
    },
    Intercept {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_when: Option<ExpressionDefinition>,
    },
    InterceptFrom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_when: Option<ExpressionDefinition>,
    },
    InterceptSendToEndpoint {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        skip_send_to_original_endpoint: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        after_uri: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_when: Option<ExpressionDefinition>,
    },
    Transacted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<String>,
    },
    Saga {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        propagation: Option<SagaPropagation>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completion_mode: Option<SagaCompletionMode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        compensation: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completion: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    Stop,
    Rollback {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mark_rollback_only: Option<bool>,
    },
    ThrowException {
        exception_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl NodeKind {
    pub fn to(uri: impl Into<String>) -> Self {
        NodeKind::To {
            uri: uri.into(),
            pattern: None,
        }
    }

    pub fn log(message: impl Into<String>) -> Self {
        NodeKind::Log {
            message: message.into(),
            logging_level: None,
            log_name: None,
        }
    }

    pub fn on_exception<I, S>(exceptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NodeKind::OnException {
            exceptions: exceptions.into_iter().map(Into::into).collect(),
            handled: None,
            continued: None,
            on_when: None,
            redelivery_policy: None,
            use_original_message: None,
            route_scoped: None,
        }
    }

    pub fn on_completion() -> Self {
        NodeKind::OnCompletion {
            mode: None,
            trigger: None,
            on_when: None,
            parallel_processing: None,
            route_scoped: None,
        }
    }

    pub fn split(expression: ExpressionHolder) -> Self {
        NodeKind::Split {
            expression,
            parallel_processing: None,
            streaming: None,
            stop_on_exception: None,
            aggregation_strategy: None,
        }
    }

    pub fn aggregate(correlation_expression: ExpressionHolder) -> Self {
        NodeKind::Aggregate {
            correlation_expression,
            completion_predicate: None,
            completion_size: None,
            completion_timeout_ms: None,
            aggregation_strategy: None,
            aggregation_repository: None,
        }
    }

    pub fn saga() -> Self {
        NodeKind::Saga {
            propagation: None,
            completion_mode: None,
            compensation: None,
            completion: None,
            timeout_ms: None,
        }
    }

    /// Short name used for generated ids and diagnostics
    pub fn short_name(&self) -> &'static str {
        match self {
            NodeKind::Route => "route",
            NodeKind::RouteConfiguration => "routeConfiguration",
            NodeKind::To { .. } => "to",
            NodeKind::ToD { .. } => "toD",
            NodeKind::Log { .. } => "log",
            NodeKind::Process { .. } => "process",
            NodeKind::Bean { .. } => "bean",
            NodeKind::SetBody { .. } => "setBody",
            NodeKind::SetHeader { .. } => "setHeader",
            NodeKind::SetProperty { .. } => "setProperty",
            NodeKind::RemoveHeader { .. } => "removeHeader",
            NodeKind::Transform { .. } => "transform",
            NodeKind::ConvertBodyTo { .. } => "convertBodyTo",
            NodeKind::Marshal { .. } => "marshal",
            NodeKind::Unmarshal { .. } => "unmarshal",
            NodeKind::Filter { .. } => "filter",
            NodeKind::Validate { .. } => "validate",
            NodeKind::Choice => "choice",
            NodeKind::When { .. } => "when",
            NodeKind::Otherwise => "otherwise",
            NodeKind::Split { .. } => "split",
            NodeKind::Aggregate { .. } => "aggregate",
            NodeKind::Multicast { .. } => "multicast",
            NodeKind::Pipeline => "pipeline",
            NodeKind::Step => "step",
            NodeKind::Loop { .. } => "loop",
            NodeKind::Enrich { .. } => "enrich",
            NodeKind::PollEnrich { .. } => "pollEnrich",
            NodeKind::RoutingSlip { .. } => "routingSlip",
            NodeKind::RecipientList { .. } => "recipientList",
            NodeKind::DynamicRouter { .. } => "dynamicRouter",
            NodeKind::WireTap { .. } => "wireTap",
            NodeKind::Delay { .. } => "delay",
            NodeKind::Throttle { .. } => "throttle",
            NodeKind::IdempotentConsumer { .. } => "idempotentConsumer",
            NodeKind::CircuitBreaker { .. } => "circuitBreaker",
            NodeKind::OnFallback { .. } => "onFallback",
            NodeKind::Threads { .. } => "threads",
            NodeKind::Try => "doTry",
            NodeKind::Catch { .. } => "doCatch",
            NodeKind::Finally => "doFinally",
            NodeKind::OnException { .. } => "onException",
            NodeKind::OnCompletion { .. } => "onCompletion",
            NodeKind::Intercept { .. } => "intercept",
            NodeKind::InterceptFrom { .. } => "interceptFrom",
            NodeKind::InterceptSendToEndpoint { .. } => "interceptSendToEndpoint",
            NodeKind::Transacted { .. } => "transacted",
            NodeKind::Saga { .. } => "saga",
            NodeKind::Stop => "stop",
            NodeKind::Rollback { .. } => "rollback",
            NodeKind::ThrowException { .. } => "throwException",
        }
    }

    /// Cross-cutting marker folded in by route preparation
    pub fn is_abstract(&self) -> bool {
        matches!(
            self,
            NodeKind::OnException { .. }
                | NodeKind::OnCompletion { .. }
                | NodeKind::Intercept { .. }
                | NodeKind::InterceptFrom { .. }
                | NodeKind::InterceptSendToEndpoint { .. }
                | NodeKind::Transacted { .. }
                | NodeKind::Saga { .. }
        )
    }

    /// Only valid as a direct child of a route (or route configuration)
    pub fn is_top_level_only(&self) -> bool {
        matches!(
            self,
            NodeKind::OnException { .. }
                | NodeKind::OnCompletion { .. }
                | NodeKind::Intercept { .. }
                | NodeKind::InterceptFrom { .. }
                | NodeKind::InterceptSendToEndpoint { .. }
        )
    }

    /// The node wraps everything after it, so it counts as output on its own
    pub fn is_wrapping_entire_output(&self) -> bool {
        matches!(self, NodeKind::Transacted { .. } | NodeKind::Saga { .. })
    }

    pub fn is_root(&self) -> bool {
        matches!(self, NodeKind::Route | NodeKind::RouteConfiguration)
    }

    /// Whether children are appended to this node directly.
    ///
    /// Leaf kinds hand `add_output` calls up to their parent.
    pub fn is_output_holder(&self) -> bool {
        matches!(
            self,
            NodeKind::Route
                | NodeKind::RouteConfiguration
                | NodeKind::Filter { .. }
                | NodeKind::Choice
                | NodeKind::When { .. }
                | NodeKind::Otherwise
                | NodeKind::Split { .. }
                | NodeKind::Aggregate { .. }
                | NodeKind::Multicast { .. }
                | NodeKind::Pipeline
                | NodeKind::Step
                | NodeKind::Loop { .. }
                | NodeKind::IdempotentConsumer { .. }
                | NodeKind::CircuitBreaker { .. }
                | NodeKind::OnFallback { .. }
                | NodeKind::Threads { .. }
                | NodeKind::Try
                | NodeKind::Catch { .. }
                | NodeKind::Finally
                | NodeKind::OnException { .. }
                | NodeKind::OnCompletion { .. }
                | NodeKind::Intercept { .. }
                | NodeKind::InterceptFrom { .. }
                | NodeKind::InterceptSendToEndpoint { .. }
                | NodeKind::Transacted { .. }
                | NodeKind::Saga { .. }
        )
    }

    /// Nodes that send to an endpoint uri
    pub fn is_send(&self) -> bool {
        matches!(
            self,
            NodeKind::To { .. } | NodeKind::ToD { .. } | NodeKind::WireTap { .. }
        )
    }

    pub fn is_choice_clause(&self) -> bool {
        matches!(self, NodeKind::When { .. } | NodeKind::Otherwise)
    }

    /// Endpoint uri for sending kinds and endpoint interceptors
    pub fn endpoint_uri(&self) -> Option<&str> {
        match self {
            NodeKind::To { uri, .. }
            | NodeKind::ToD { uri, .. }
            | NodeKind::WireTap { uri, .. }
            | NodeKind::InterceptSendToEndpoint { uri, .. } => Some(uri),
            NodeKind::InterceptFrom { uri, .. } => uri.as_deref(),
            _ => None,
        }
    }

    /// Whether an on-exception / on-completion is scoped to its route
    pub fn is_route_scoped(&self) -> bool {
        match self {
            NodeKind::OnException { route_scoped, .. }
            | NodeKind::OnCompletion { route_scoped, .. } => {
                route_scoped.unwrap_or(true)
            }
            _ => false,
        }
    }

    pub fn set_route_scoped(&mut self, scoped: bool) {
        if let NodeKind::OnException { route_scoped, .. }
        | NodeKind::OnCompletion { route_scoped, .. } = self
        {
            *route_scoped = Some(scoped);
        }
    }

    /// Primary expression of expression-bearing kinds
    pub fn expression(&self) -> Option<&ExpressionHolder> {
        match self {
            NodeKind::SetBody { expression }
            | NodeKind::SetHeader { expression, .. }
            | NodeKind::SetProperty { expression, .. }
            | NodeKind::Transform { expression }
            | NodeKind::Filter { expression, .. }
            | NodeKind::Validate { expression }
            | NodeKind::When { expression }
            | NodeKind::Split { expression, .. }
            | NodeKind::Loop { expression, .. }
            | NodeKind::Enrich { expression, .. }
            | NodeKind::PollEnrich { expression, .. }
            | NodeKind::RoutingSlip { expression, .. }
            | NodeKind::RecipientList { expression, .. }
            | NodeKind::DynamicRouter { expression }
            | NodeKind::Delay { expression, .. }
            | NodeKind::Throttle { expression, .. }
            | NodeKind::IdempotentConsumer { expression, .. } => Some(expression),
            NodeKind::Aggregate {
                correlation_expression,
                ..
            } => Some(correlation_expression),
            _ => None,
        }
    }

    pub fn expression_mut(&mut self) -> Option<&mut ExpressionHolder> {
        match self {
            NodeKind::SetBody { expression }
            | NodeKind::SetHeader { expression, .. }
            | NodeKind::SetProperty { expression, .. }
            | NodeKind::Transform { expression }
            | NodeKind::Filter { expression, .. }
            | NodeKind::Validate { expression }
            | NodeKind::When { expression }
            | NodeKind::Split { expression, .. }
            | NodeKind::Loop { expression, .. }
            | NodeKind::Enrich { expression, .. }
            | NodeKind::PollEnrich { expression, .. }
            | NodeKind::RoutingSlip { expression, .. }
            | NodeKind::RecipientList { expression, .. }
            | NodeKind::DynamicRouter { expression }
            | NodeKind::Delay { expression, .. }
            | NodeKind::Throttle { expression, .. }
            | NodeKind::IdempotentConsumer { expression, .. } => Some(expression),
            NodeKind::Aggregate {
                correlation_expression,
                ..
            } => Some(correlation_expression),
            _ => None,
        }
    }

    /// Visits every user-supplied text attribute (uris, messages, references,
    /// expression bodies) so template parameters can be substituted.
    pub fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        match self {
            NodeKind::To { uri, .. }
            | NodeKind::ToD { uri, .. }
            | NodeKind::WireTap { uri, .. } => f(uri),
            NodeKind::Log {
                message, log_name, ..
            } => {
                f(message);
                if let Some(name) = log_name {
                    f(name);
                }
            }
            NodeKind::Process { reference } => f(reference),
            NodeKind::Bean { reference, method } => {
                f(reference);
                if let Some(method) = method {
                    f(method);
                }
            }
            NodeKind::RemoveHeader { name } => f(name),
            NodeKind::ConvertBodyTo { type_name, .. } => f(type_name),
            NodeKind::Marshal { data_format }
            | NodeKind::Unmarshal { data_format } => f(data_format),
            NodeKind::IdempotentConsumer { repository, .. } => f(repository),
            NodeKind::CircuitBreaker {
                configuration: Some(configuration),
            } => f(configuration),
            NodeKind::InterceptFrom { uri: Some(uri), .. } => f(uri),
            NodeKind::InterceptSendToEndpoint { uri, after_uri, .. } => {
                f(uri);
                if let Some(after) = after_uri {
                    f(after);
                }
            }
            NodeKind::Transacted {
                policy: Some(policy),
            } => f(policy),
            NodeKind::Saga {
                compensation,
                completion,
                ..
            } => {
                if let Some(compensation) = compensation {
                    f(compensation);
                }
                if let Some(completion) = completion {
                    f(completion);
                }
            }
            NodeKind::Rollback {
                message: Some(message),
                ..
            }
            | NodeKind::ThrowException {
                message: Some(message),
                ..
            } => f(message),
            _ => {}
        }

        if let NodeKind::SetHeader { name, .. } | NodeKind::SetProperty { name, .. } = self {
            f(name);
        }
        if let Some(text) = self
            .expression_mut()
            .and_then(ExpressionHolder::expression_text_mut)
        {
            f(text);
        }
    }

    /// Short human readable description, e.g. `to[direct:b]`
    pub fn label(&self) -> String {
        let detail = match self {
            NodeKind::Log { message, .. } => Some(message.clone()),
            NodeKind::Process { reference } | NodeKind::Bean { reference, .. } => {
                Some(reference.clone())
            }
            NodeKind::SetHeader { name, .. }
            | NodeKind::SetProperty { name, .. }
            | NodeKind::RemoveHeader { name } => Some(name.clone()),
            NodeKind::Marshal { data_format }
            | NodeKind::Unmarshal { data_format } => Some(data_format.clone()),
            NodeKind::ConvertBodyTo { type_name, .. } => Some(type_name.clone()),
            NodeKind::OnException { exceptions, .. }
            | NodeKind::Catch { exceptions, .. } => Some(exceptions.join(", ")),
            NodeKind::ThrowException { exception_type, .. } => {
                Some(exception_type.clone())
            }
            _ => self
                .endpoint_uri()
                .map(str::to_string)
                .or_else(|| {
                    self.expression()
                        .and_then(ExpressionHolder::get)
                        .map(ToString::to_string)
                }),
        };
        match detail {
            Some(detail) => format!("{}[{}]", self.short_name(), detail),
            None => self.short_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_flags() {
        let on_exception = NodeKind::on_exception(["IoException"]);
        assert!(on_exception.is_abstract());
        assert!(on_exception.is_top_level_only());
        assert!(on_exception.is_output_holder());
        assert!(on_exception.is_route_scoped());

        let saga = NodeKind::saga();
        assert!(saga.is_abstract());
        assert!(!saga.is_top_level_only());
        assert!(saga.is_wrapping_entire_output());

        let to = NodeKind::to("direct:b");
        assert!(!to.is_abstract());
        assert!(!to.is_output_holder());
        assert!(to.is_send());
    }

    #[test]
    fn test_route_scoped_toggle() {
        let mut kind = NodeKind::on_completion();
        assert!(kind.is_route_scoped());
        kind.set_route_scoped(false);
        assert!(!kind.is_route_scoped());
    }

    #[test]
    fn test_labels() {
        assert_eq!(NodeKind::to("direct:b").label(), "to[direct:b]");
        assert_eq!(NodeKind::log("x").label(), "log[x]");
        assert_eq!(NodeKind::Choice.label(), "choice");
        let split = NodeKind::split(ExpressionDefinition::body().into());
        assert_eq!(split.label(), "split[simple{${body}}]");
    }

    #[test]
    fn test_text_visitor_reaches_uri_and_expression() {
        let mut kind = NodeKind::SetHeader {
            name: "{{h}}".to_string(),
            expression: ExpressionDefinition::simple("{{v}}").into(),
        };
        let mut seen = Vec::new();
        kind.for_each_text_mut(&mut |text| seen.push(text.clone()));
        assert_eq!(seen, vec!["{{h}}".to_string(), "{{v}}".to_string()]);
    }

    #[test]
    fn test_kind_serializes_with_tag() {
        let json = serde_json::to_value(NodeKind::to("direct:b")).unwrap();
        assert_eq!(json["kind"], "to");
        assert_eq!(json["uri"], "direct:b");
        let back: NodeKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, NodeKind::to("direct:b"));
    }
}
