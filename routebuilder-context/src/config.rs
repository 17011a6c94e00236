use crate::error_handler::ErrorHandlerDefinition;
use crate::id_factory::IdStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 上下文配置，可以从 YAML/JSON 加载
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ContextConfig {
    /// 上下文名称
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 是否记录节点的源码位置
    pub source_location_enabled: bool,
    pub debugging: bool,
    pub tracing: bool,
    /// 属性占位符使用的属性表
    pub properties: BTreeMap<String, String>,
    /// 命名端点，`ref:<name>` 形式的 uri 会被解析到这里
    pub endpoints: BTreeMap<String, String>,
    /// 上下文级别的错误处理器
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_handler: Option<ErrorHandlerDefinition>,
    pub id_strategy: IdStrategy,
}

impl ContextConfig {
    /// Whether nodes should be stamped with their source location
    pub fn captures_source_location(&self) -> bool {
        self.source_location_enabled || self.debugging || self.tracing
    }
}
