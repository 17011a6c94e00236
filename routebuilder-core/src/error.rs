use routebuilder_context::PropertiesError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while building, validating or preparing route models
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("The output must be added as top-level on the route. Try moving {node} to the top of route.")]
    TopLevelOnly { node: String },

    #[error("A new choice clause should start with a when() or otherwise() ({node})")]
    InvalidChoiceClause { node: String },

    #[error("{what} is already defined on {node}")]
    AlreadyDefined { what: &'static str, node: String },

    #[error("The route can only have one saga defined (route: {route})")]
    MultipleSagas { route: String },

    #[error("The route can only have one transacted defined (route: {route})")]
    MultipleTransacted { route: String },

    #[error("end() called on {node} without an enclosing {expected}")]
    UnbalancedEnd { node: String, expected: &'static str },

    #[error("Route {0} has no inputs")]
    NoInput(String),

    #[error("Route {0} has no outputs")]
    NoOutputs(String),

    #[error("Duplicate route id detected: {0}. Please correct ids to be unique among all your routes.")]
    DuplicateRouteId(String),

    #[error("Duplicate id detected: {id} in route {route}. Please correct ids to be unique among all your routes.")]
    DuplicateNodeId { route: String, id: String },

    #[error("Cannot add route {route} with startupOrder {order} because it is already in use by route {other}")]
    DuplicateStartupOrder {
        order: i32,
        route: String,
        other: String,
    },

    #[error("Cannot auto assign id to route: {0}")]
    IdAssignmentExhausted(String),

    #[error("No {kind} found with id: {name}")]
    UnresolvedReference { kind: &'static str, name: String },

    #[error("Route template {template} the following mandatory parameters must be provided: {}", .parameters.join(", "))]
    MissingTemplateParameters {
        template: String,
        parameters: Vec<String>,
    },

    #[error("Invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: String },

    #[error(transparent)]
    Placeholder(#[from] PropertiesError),
}

impl ModelError {
    pub fn unresolved(kind: &'static str, name: impl Into<String>) -> Self {
        ModelError::UnresolvedReference {
            kind,
            name: name.into(),
        }
    }
}
