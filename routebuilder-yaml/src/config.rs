use routebuilder_context::{ErrorHandlerDefinition, RedeliveryPolicyDefinition};
use routebuilder_core::{
    ExchangePattern, ExpressionDefinition, LoggingLevel, OnCompletionMode, OnCompletionTrigger,
    RestDefinition, SagaCompletionMode, SagaPropagation, TemplateBeanDefinition,
    TemplateParameterDefinition,
};
use serde::{Deserialize, Serialize};

/// 路由文档：route / route-configuration / route-template 条目列表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutesDocument {
    pub entries: Vec<DocumentEntry>,
}

impl RoutesDocument {
    pub fn routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter().filter_map(|e| match e {
            DocumentEntry::Route(route) => Some(route),
            _ => None,
        })
    }

    pub fn route_configurations(&self) -> impl Iterator<Item = &RouteConfigurationEntry> {
        self.entries.iter().filter_map(|e| match e {
            DocumentEntry::RouteConfiguration(config) => Some(config),
            _ => None,
        })
    }

    pub fn route_templates(&self) -> impl Iterator<Item = &RouteTemplateEntry> {
        self.entries.iter().filter_map(|e| match e {
            DocumentEntry::RouteTemplate(template) => Some(template),
            _ => None,
        })
    }
}

/// 文档条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentEntry {
    Route(RouteEntry),
    RouteConfiguration(RouteConfigurationEntry),
    RouteTemplate(RouteTemplateEntry),
}

/// 路由定义
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RouteEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// 输入端点 uri
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_configuration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precondition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_startup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_caching: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_history: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_mask: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_handler: Option<ErrorHandlerDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<RestDefinition>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
}

/// 路由配置定义
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RouteConfigurationEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precondition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_handler: Option<ErrorHandlerDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_exception: Vec<OnExceptionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intercept: Vec<InterceptEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intercept_from: Vec<InterceptFromEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intercept_send_to_endpoint: Vec<InterceptSendToEndpointEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_completion: Vec<OnCompletionEntry>,
}

/// 路由模板定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RouteTemplateEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<TemplateParameterDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub beans: Vec<TemplateBeanDefinition>,
    pub route: RouteEntry,
}

/// 表达式：`{simple: ..}` 简写或 `{language, expression}` 完整形式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpressionEntry {
    Language {
        language: String,
        expression: String,
        #[serde(default, rename = "result-type", skip_serializing_if = "Option::is_none")]
        result_type: Option<String>,
    },
    Simple {
        simple: String,
    },
    Constant {
        constant: String,
    },
    Header {
        header: String,
    },
}

impl ExpressionEntry {
    pub fn to_definition(&self) -> ExpressionDefinition {
        match self {
            ExpressionEntry::Language {
                language,
                expression,
                result_type,
            } => {
                let definition = ExpressionDefinition::new(language.clone(), expression.clone());
                match result_type {
                    Some(result_type) => definition.with_result_type(result_type.clone()),
                    None => definition,
                }
            }
            ExpressionEntry::Simple { simple } => ExpressionDefinition::simple(simple.clone()),
            ExpressionEntry::Constant { constant } => {
                ExpressionDefinition::constant(constant.clone())
            }
            ExpressionEntry::Header { header } => ExpressionDefinition::header(header.clone()),
        }
    }
}

/// 所有步骤共有的节点属性
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StepAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 支持占位符，例如 `"{{audit.disabled}}"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<String>,
}

/// 步骤定义，每个步骤是只有一个键的映射，例如 `- to: mock:a`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepEntry {
    To(SendEntry),
    ToD(SendEntry),
    WireTap(SendEntry),
    Log(LogEntry),
    Process(ReferenceEntry),
    Bean(BeanEntry),
    SetBody(ExpressionStep),
    SetHeader(NamedExpressionStep),
    SetProperty(NamedExpressionStep),
    RemoveHeader(NameEntry),
    Transform(ExpressionStep),
    ConvertBodyTo(ConvertBodyToEntry),
    Marshal(DataFormatEntry),
    Unmarshal(DataFormatEntry),
    Validate(ExpressionStep),
    Enrich(ExpressionStep),
    PollEnrich(PollEnrichEntry),
    RecipientList(ExpressionStep),
    RoutingSlip(ExpressionStep),
    DynamicRouter(ExpressionStep),
    Delay(ExpressionStep),
    Throttle(ExpressionStep),
    Filter(ExpressionBlock),
    Split(SplitEntry),
    Aggregate(AggregateEntry),
    Loop(LoopEntry),
    IdempotentConsumer(IdempotentConsumerEntry),
    Multicast(MulticastEntry),
    Pipeline(BlockEntry),
    Step(BlockEntry),
    Choice(ChoiceEntry),
    DoTry(TryEntry),
    CircuitBreaker(CircuitBreakerEntry),
    Threads(ThreadsEntry),
    Transacted(TransactedEntry),
    Saga(SagaEntry),
    OnException(OnExceptionEntry),
    OnCompletion(OnCompletionEntry),
    Intercept(InterceptEntry),
    InterceptFrom(InterceptFromEntry),
    InterceptSendToEndpoint(InterceptSendToEndpointEntry),
    Stop(StepAttributes),
    Rollback(RollbackEntry),
    ThrowException(ThrowExceptionEntry),
}

impl StepEntry {
    /// Document key of the step
    pub fn name(&self) -> &'static str {
        match self {
            StepEntry::To(_) => "to",
            StepEntry::ToD(_) => "to-d",
            StepEntry::WireTap(_) => "wire-tap",
            StepEntry::Log(_) => "log",
            StepEntry::Process(_) => "process",
            StepEntry::Bean(_) => "bean",
            StepEntry::SetBody(_) => "set-body",
            StepEntry::SetHeader(_) => "set-header",
            StepEntry::SetProperty(_) => "set-property",
            StepEntry::RemoveHeader(_) => "remove-header",
            StepEntry::Transform(_) => "transform",
            StepEntry::ConvertBodyTo(_) => "convert-body-to",
            StepEntry::Marshal(_) => "marshal",
            StepEntry::Unmarshal(_) => "unmarshal",
            StepEntry::Validate(_) => "validate",
            StepEntry::Enrich(_) => "enrich",
            StepEntry::PollEnrich(_) => "poll-enrich",
            StepEntry::RecipientList(_) => "recipient-list",
            StepEntry::RoutingSlip(_) => "routing-slip",
            StepEntry::DynamicRouter(_) => "dynamic-router",
            StepEntry::Delay(_) => "delay",
            StepEntry::Throttle(_) => "throttle",
            StepEntry::Filter(_) => "filter",
            StepEntry::Split(_) => "split",
            StepEntry::Aggregate(_) => "aggregate",
            StepEntry::Loop(_) => "loop",
            StepEntry::IdempotentConsumer(_) => "idempotent-consumer",
            StepEntry::Multicast(_) => "multicast",
            StepEntry::Pipeline(_) => "pipeline",
            StepEntry::Step(_) => "step",
            StepEntry::Choice(_) => "choice",
            StepEntry::DoTry(_) => "do-try",
            StepEntry::CircuitBreaker(_) => "circuit-breaker",
            StepEntry::Threads(_) => "threads",
            StepEntry::Transacted(_) => "transacted",
            StepEntry::Saga(_) => "saga",
            StepEntry::OnException(_) => "on-exception",
            StepEntry::OnCompletion(_) => "on-completion",
            StepEntry::Intercept(_) => "intercept",
            StepEntry::InterceptFrom(_) => "intercept-from",
            StepEntry::InterceptSendToEndpoint(_) => "intercept-send-to-endpoint",
            StepEntry::Stop(_) => "stop",
            StepEntry::Rollback(_) => "rollback",
            StepEntry::ThrowException(_) => "throw-exception",
        }
    }

    /// Nested steps, in document order
    pub fn children(&self) -> Vec<&StepEntry> {
        let mut children: Vec<&StepEntry> = Vec::new();
        match self {
            StepEntry::Filter(e) => children.extend(&e.steps),
            StepEntry::Split(e) => children.extend(&e.steps),
            StepEntry::Aggregate(e) => children.extend(&e.steps),
            StepEntry::Loop(e) => children.extend(&e.steps),
            StepEntry::IdempotentConsumer(e) => children.extend(&e.steps),
            StepEntry::Multicast(e) => children.extend(&e.steps),
            StepEntry::Pipeline(e) | StepEntry::Step(e) => children.extend(&e.steps),
            StepEntry::Choice(e) => {
                for when in &e.when {
                    children.extend(&when.steps);
                }
                if let Some(otherwise) = &e.otherwise {
                    children.extend(&otherwise.steps);
                }
            }
            StepEntry::DoTry(e) => {
                children.extend(&e.steps);
                for catch in &e.do_catch {
                    children.extend(&catch.steps);
                }
                if let Some(finally) = &e.do_finally {
                    children.extend(&finally.steps);
                }
            }
            StepEntry::CircuitBreaker(e) => {
                children.extend(&e.steps);
                if let Some(fallback) = &e.on_fallback {
                    children.extend(&fallback.steps);
                }
            }
            StepEntry::Threads(e) => children.extend(&e.steps),
            StepEntry::Transacted(e) => children.extend(&e.steps),
            StepEntry::Saga(e) => children.extend(&e.steps),
            StepEntry::OnException(e) => children.extend(&e.steps),
            StepEntry::OnCompletion(e) => children.extend(&e.steps),
            StepEntry::Intercept(e) => children.extend(&e.steps),
            StepEntry::InterceptFrom(e) => children.extend(&e.steps),
            StepEntry::InterceptSendToEndpoint(e) => children.extend(&e.steps),
            _ => {}
        }
        children
    }

    /// Custom id declared on the step, if any
    pub fn custom_id(&self) -> Option<&str> {
        match self {
            StepEntry::To(SendEntry::Full { attributes, .. })
            | StepEntry::ToD(SendEntry::Full { attributes, .. })
            | StepEntry::WireTap(SendEntry::Full { attributes, .. })
            | StepEntry::Log(LogEntry::Full { attributes, .. }) => attributes.id.as_deref(),
            StepEntry::To(_) | StepEntry::ToD(_) | StepEntry::WireTap(_) | StepEntry::Log(_) => {
                None
            }
            StepEntry::Process(e) => e.attributes.id.as_deref(),
            StepEntry::Bean(e) => e.attributes.id.as_deref(),
            StepEntry::SetBody(e)
            | StepEntry::Transform(e)
            | StepEntry::Validate(e)
            | StepEntry::Enrich(e)
            | StepEntry::RecipientList(e)
            | StepEntry::RoutingSlip(e)
            | StepEntry::DynamicRouter(e)
            | StepEntry::Delay(e)
            | StepEntry::Throttle(e) => e.attributes.id.as_deref(),
            StepEntry::SetHeader(e) | StepEntry::SetProperty(e) => e.attributes.id.as_deref(),
            StepEntry::RemoveHeader(e) => e.attributes.id.as_deref(),
            StepEntry::PollEnrich(e) => e.attributes.id.as_deref(),
            StepEntry::ConvertBodyTo(e) => e.attributes.id.as_deref(),
            StepEntry::Marshal(e) | StepEntry::Unmarshal(e) => e.attributes.id.as_deref(),
            StepEntry::Filter(e) => e.attributes.id.as_deref(),
            StepEntry::Split(e) => e.attributes.id.as_deref(),
            StepEntry::Aggregate(e) => e.attributes.id.as_deref(),
            StepEntry::Loop(e) => e.attributes.id.as_deref(),
            StepEntry::IdempotentConsumer(e) => e.attributes.id.as_deref(),
            StepEntry::Multicast(e) => e.attributes.id.as_deref(),
            StepEntry::Pipeline(e) | StepEntry::Step(e) => e.attributes.id.as_deref(),
            StepEntry::Choice(e) => e.attributes.id.as_deref(),
            StepEntry::DoTry(e) => e.attributes.id.as_deref(),
            StepEntry::CircuitBreaker(e) => e.attributes.id.as_deref(),
            StepEntry::Threads(e) => e.attributes.id.as_deref(),
            StepEntry::Transacted(e) => e.attributes.id.as_deref(),
            StepEntry::Saga(e) => e.attributes.id.as_deref(),
            StepEntry::OnException(e) => e.attributes.id.as_deref(),
            StepEntry::OnCompletion(e) => e.attributes.id.as_deref(),
            StepEntry::Intercept(e) => e.attributes.id.as_deref(),
            StepEntry::InterceptFrom(e) => e.attributes.id.as_deref(),
            StepEntry::InterceptSendToEndpoint(e) => e.attributes.id.as_deref(),
            StepEntry::Stop(attributes) => attributes.id.as_deref(),
            StepEntry::Rollback(e) => e.attributes.id.as_deref(),
            StepEntry::ThrowException(e) => e.attributes.id.as_deref(),
        }
    }
}

/// 发送端点：`- to: mock:a` 简写或带属性的完整形式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SendEntry {
    Uri(String),
    Full {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<ExchangePattern>,
        #[serde(flatten)]
        attributes: StepAttributes,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogEntry {
    Message(String),
    Full {
        message: String,
        #[serde(
            default,
            rename = "logging-level",
            skip_serializing_if = "Option::is_none"
        )]
        logging_level: Option<LoggingLevel>,
        #[serde(default, rename = "log-name", skip_serializing_if = "Option::is_none")]
        log_name: Option<String>,
        #[serde(flatten)]
        attributes: StepAttributes,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReferenceEntry {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BeanEntry {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExpressionStep {
    pub expression: ExpressionEntry,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollEnrichEntry {
    pub expression: ExpressionEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_strategy: Option<String>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NamedExpressionStep {
    pub name: String,
    pub expression: ExpressionEntry,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NameEntry {
    pub name: String,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConvertBodyToEntry {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DataFormatEntry {
    pub data_format: String,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

/// 仅包含子步骤的块
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BlockEntry {
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExpressionBlock {
    pub expression: ExpressionEntry,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SplitEntry {
    pub expression: ExpressionEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_processing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_on_exception: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_strategy: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AggregateEntry {
    pub correlation_expression: ExpressionEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_predicate: Option<ExpressionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_size: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_repository: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoopEntry {
    pub expression: ExpressionEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_while: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<bool>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IdempotentConsumerEntry {
    pub expression: ExpressionEntry,
    pub repository: String,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MulticastEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_processing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_on_exception: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_strategy: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChoiceEntry {
    #[serde(default)]
    pub when: Vec<ExpressionBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<BlockEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CatchEntry {
    #[serde(default)]
    pub exceptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_when: Option<ExpressionEntry>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TryEntry {
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub do_catch: Vec<CatchEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_finally: Option<BlockEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CircuitBreakerEntry {
    /// 引用的弹性配置 id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_fallback: Option<BlockEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ThreadsEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pool_size: Option<u32>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransactedEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SagaEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagation: Option<SagaPropagation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_mode: Option<SagaCompletionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OnExceptionEntry {
    pub exceptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handled: Option<ExpressionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continued: Option<ExpressionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_when: Option<ExpressionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redelivery_policy: Option<RedeliveryPolicyDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_original_message: Option<bool>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OnCompletionEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<OnCompletionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<OnCompletionTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_when: Option<ExpressionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_processing: Option<bool>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterceptEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_when: Option<ExpressionEntry>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterceptFromEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_when: Option<ExpressionEntry>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterceptSendToEndpointEntry {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_send_to_original_endpoint: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_when: Option<ExpressionEntry>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RollbackEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_rollback_only: Option<bool>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ThrowExceptionEntry {
    pub exception_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub attributes: StepAttributes,
}
