//! # RouteBuilder Core
//!
//! Route definition model: the node tree, node kinds, routes, route
//! configurations and templates, plus route preparation which folds
//! cross-cutting definitions into a route's output list.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod configuration;
mod error;
mod expression;
pub mod helper;
mod kind;
mod node;
pub mod pattern;
mod prepare;
mod rest;
mod route;
mod template;
mod tree;

#[cfg(test)]
mod tests;

pub use builder::{BuildState, RouteBuilder, RouteConfigurationBuilder, StepBuilder};
pub use configuration::{RouteConfigurationDefinition, DEFAULT_CONFIGURATION_ID};
pub use error::{ModelError, Result};
pub use expression::{ExpressionClause, ExpressionDefinition, ExpressionHolder};
pub use kind::{
    ExchangePattern, LoggingLevel, NodeKind, OnCompletionMode, OnCompletionTrigger,
    SagaCompletionMode, SagaPropagation,
};
pub use node::{Node, NodeHeader, NodeId, SourceLocation};
pub use prepare::{prepare_route, CrossCutting, ForeignNode};
pub use rest::{RestDefinition, VerbDefinition};
pub use route::{FromDefinition, PreparedFlag, RouteDefinition};
pub use template::{
    substitute, BeanSource, RouteTemplateDefinition, TemplateBeanDefinition,
    TemplateParameterDefinition,
};
pub use tree::NodeTree;

/// Prelude module for core functionality
pub mod prelude {
    pub use crate::{
        prepare_route, CrossCutting, ExpressionDefinition, ModelError, NodeId, NodeKind,
        NodeTree, RouteBuilder, RouteConfigurationBuilder, RouteConfigurationDefinition,
        RouteDefinition, RouteTemplateDefinition, StepBuilder,
    };
    pub use routebuilder_context::{ErrorHandlerDefinition, ModelContext};
}
