//! # RouteBuilder YAML
//!
//! Route, route configuration and route template definitions loaded from
//! YAML/JSON documents

mod config;
mod loader;
mod parser;
#[cfg(feature = "registry")]
mod registry_integration;
mod settings;

pub use config::*;
pub use loader::*;
pub use parser::*;
#[cfg(feature = "registry")]
pub use registry_integration::*;
pub use settings::*;

/// Prelude module for YAML functionality
pub mod prelude {
    pub use crate::{
        ParsedRoutes, RoutesDocument, RoutesLoader, SettingsLoader, StepEntry, YamlRouteParser,
    };

    #[cfg(feature = "registry")]
    pub use crate::{load_routes_into_registry, YamlRoutesBuilder};
}
