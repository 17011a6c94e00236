//! # RouteBuilder - Route Definition Model
//!
//! RouteBuilder models message routes as trees of EIP nodes, merges route
//! configurations into them and prepares them for a routing engine.
//!
//! ## Features
//!
//! - `registry` (default): Model registry with configuration matching, id assignment and templates
//! - `yaml`: YAML/JSON route documents
//! - `yaml-registry` (default): YAML documents loaded straight into a registry
//! - `logger`: Tracing setup and route dumps
//! - `full`: All features enabled
//!
//! ## Quick Start
//!
//! ```rust
//! use routebuilder::prelude::*;
//!
//! # #[cfg(feature = "registry")]
//! # fn main() -> anyhow::Result<()> {
//! let ctx = ModelContext::new();
//! let mut registry = ModelRegistry::new(ctx.clone());
//!
//! let route = RouteBuilder::from(&ctx, "direct:orders")
//!     .route_id("orders")
//!     .log("received")
//!     .to("mock:orders")
//!     .build()?;
//! registry.add_route(route)?;
//!
//! assert!(registry.route("orders").map_or(false, |r| r.is_prepared()));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "registry"))]
//! # fn main() {}
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export core functionality
pub use routebuilder_context as context;
pub use routebuilder_core::*;

#[cfg(feature = "registry")]
#[cfg_attr(docsrs, doc(cfg(feature = "registry")))]
pub use routebuilder_registry as registry;

#[cfg(feature = "yaml")]
#[cfg_attr(docsrs, doc(cfg(feature = "yaml")))]
pub use routebuilder_yaml as yaml;

#[cfg(feature = "logger")]
#[cfg_attr(docsrs, doc(cfg(feature = "logger")))]
pub use routebuilder_logger as logger;

/// Prelude module for easy imports
pub mod prelude {
    pub use routebuilder_context::{ContextConfig, NodeCounter};
    pub use routebuilder_core::prelude::*;

    #[cfg(feature = "registry")]
    #[cfg_attr(docsrs, doc(cfg(feature = "registry")))]
    pub use routebuilder_registry::prelude::*;

    #[cfg(feature = "yaml")]
    #[cfg_attr(docsrs, doc(cfg(feature = "yaml")))]
    pub use routebuilder_yaml::prelude::*;

    #[cfg(feature = "logger")]
    #[cfg_attr(docsrs, doc(cfg(feature = "logger")))]
    pub use routebuilder_logger::{dump_route, Logger};
}
