use serde::{Deserialize, Serialize};

/// Redelivery settings shared by the error handler kinds that retry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RedeliveryPolicyDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_redeliveries: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redelivery_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_multiplier: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_exhausted: Option<bool>,
}

/// Error handler factory attached to a context, a route configuration or a
/// single route.
///
/// Routes receive a clone, so changing one route's handler never leaks into
/// another route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorHandlerDefinition {
    #[serde(rename_all = "kebab-case")]
    DefaultErrorHandler {
        #[serde(default)]
        redelivery_policy: RedeliveryPolicyDefinition,
    },
    #[serde(rename_all = "kebab-case")]
    DeadLetterChannel {
        dead_letter_uri: String,
        #[serde(default)]
        use_original_message: bool,
        #[serde(default)]
        redelivery_policy: RedeliveryPolicyDefinition,
    },
    NoErrorHandler,
    /// Reference to a handler registered elsewhere
    Ref(String),
}

impl Default for ErrorHandlerDefinition {
    fn default() -> Self {
        ErrorHandlerDefinition::DefaultErrorHandler {
            redelivery_policy: RedeliveryPolicyDefinition::default(),
        }
    }
}

impl ErrorHandlerDefinition {
    pub fn dead_letter_channel(uri: impl Into<String>) -> Self {
        ErrorHandlerDefinition::DeadLetterChannel {
            dead_letter_uri: uri.into(),
            use_original_message: false,
            redelivery_policy: RedeliveryPolicyDefinition::default(),
        }
    }

    /// Whether the handler can retry or divert failed messages
    pub fn supports_redelivery(&self) -> bool {
        matches!(
            self,
            ErrorHandlerDefinition::DefaultErrorHandler { .. }
                | ErrorHandlerDefinition::DeadLetterChannel { .. }
        )
    }
}
