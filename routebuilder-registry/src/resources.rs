//! Named definitions routes refer to by reference: data formats, validators,
//! transformers and resilience (circuit breaker) configurations.

use routebuilder_core::ExpressionDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named data format used by marshal / unmarshal steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DataFormatDefinition {
    pub name: String,
    /// Format family, e.g. `json`, `csv`
    pub format: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl DataFormatDefinition {
    pub fn new(name: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: format.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValidatorKind {
    Endpoint { uri: String },
    Predicate { expression: ExpressionDefinition },
    Custom { class_name: String },
}

/// Validates messages declaring a given data type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValidatorDefinition {
    pub data_type: String,
    #[serde(flatten)]
    pub kind: ValidatorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TransformerKind {
    Endpoint { uri: String },
    DataFormat { name: String },
    Custom { class_name: String },
}

/// Converts messages between two data types.
///
/// A transformer declared with a `scheme` applies to every type of that
/// scheme (`json:*`) and is used when no exact pair matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransformerDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_type: Option<String>,
    #[serde(flatten)]
    pub kind: TransformerKind,
}

impl TransformerDefinition {
    pub(crate) fn matches(&self, from: &str, to: &str) -> bool {
        self.from_type.as_deref() == Some(from) && self.to_type.as_deref() == Some(to)
    }

    pub(crate) fn matches_scheme(&self, from: &str, to: &str) -> bool {
        let Some(scheme) = self.scheme.as_deref() else {
            return false;
        };
        let in_scheme = |t: &str| t.split_once(':').is_some_and(|(s, _)| s == scheme);
        in_scheme(from) || in_scheme(to)
    }
}

/// Settings of a circuit breaker, referenced by id from circuit breaker steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct ResilienceConfiguration {
    pub id: String,
    pub failure_rate_threshold: Option<f32>,
    pub minimum_number_of_calls: Option<u32>,
    pub sliding_window_size: Option<u32>,
    pub wait_duration_in_open_state_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub bulkhead_enabled: Option<bool>,
    pub bulkhead_max_concurrent_calls: Option<u32>,
}

impl ResilienceConfiguration {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}
