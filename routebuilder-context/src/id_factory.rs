use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Strategy for generating node and route ids
pub trait NodeIdFactory: Send + Sync + fmt::Debug {
    /// Creates a new id for a node of the given kind (`route`, `to`, `choice`, ...)
    fn create_id(&self, kind: &str) -> String;
}

/// Generates `<kind><n>` ids with one sequence per kind, e.g. `to1`, `to2`, `log1`
#[derive(Debug, Default)]
pub struct DefaultNodeIdFactory {
    sequences: Mutex<HashMap<String, u64>>,
}

impl DefaultNodeIdFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeIdFactory for DefaultNodeIdFactory {
    fn create_id(&self, kind: &str) -> String {
        let mut sequences =
            self.sequences.lock().unwrap_or_else(PoisonError::into_inner);
        let next = sequences.entry(kind.to_string()).or_insert(0);
        *next += 1;
        format!("{kind}{next}")
    }
}

/// Generates `<kind>-<uuid>` ids
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidNodeIdFactory;

impl NodeIdFactory for UuidNodeIdFactory {
    fn create_id(&self, kind: &str) -> String {
        format!("{kind}-{}", Uuid::new_v4())
    }
}

/// 配置中可选择的 id 生成策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Default,
    Uuid,
}

impl IdStrategy {
    pub fn factory(self) -> Arc<dyn NodeIdFactory> {
        match self {
            IdStrategy::Default => Arc::new(DefaultNodeIdFactory::new()),
            IdStrategy::Uuid => Arc::new(UuidNodeIdFactory),
        }
    }
}
