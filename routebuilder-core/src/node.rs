use crate::kind::NodeKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle of a node inside its [`NodeTree`](crate::NodeTree)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a node was declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// Attributes every node kind shares
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeHeader {
    /// 创建顺序，进程内全局单调递增
    pub index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// id 是否由用户指定（而不是自动生成）
    #[serde(default)]
    pub custom_id: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 字符串形式的布尔值，允许占位符
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit_error_handler: Option<bool>,
    /// 贡献该节点的路由配置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_configuration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl NodeHeader {
    pub fn has_custom_id(&self) -> bool {
        self.id.is_some() && self.custom_id
    }
}

/// A node in the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub header: NodeHeader,
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) outputs: Vec<NodeId>,
    pub(crate) blocks: Vec<NodeId>,
    /// Set on a choice by `end_choice`: only new clauses may be added next
    pub(crate) clauses_only: bool,
}

impl Node {
    pub(crate) fn new(index: u64, kind: NodeKind) -> Self {
        Self {
            header: NodeHeader {
                index,
                ..NodeHeader::default()
            },
            kind,
            parent: None,
            outputs: Vec::new(),
            blocks: Vec::new(),
            clauses_only: false,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn id(&self) -> Option<&str> {
        self.header.id.as_deref()
    }

    pub fn index(&self) -> u64 {
        self.header.index
    }

    pub fn is_abstract(&self) -> bool {
        self.kind.is_abstract()
    }

    pub fn is_top_level_only(&self) -> bool {
        self.kind.is_top_level_only()
    }
}
