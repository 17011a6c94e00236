#![cfg(feature = "yaml-registry")]

use routebuilder::prelude::*;
use std::sync::Arc;

fn context() -> ModelContext {
    ModelContext::builder()
        .counter(Arc::new(NodeCounter::new()))
        .build()
}

#[test]
fn test_prelude_builds_and_prepares() {
    let ctx = context();
    let mut registry = ModelRegistry::new(ctx.clone());
    registry.add_route_configuration(
        RouteConfigurationBuilder::new(&ctx)
            .on_exception(["IoError"])
            .end()
            .build()
            .unwrap(),
    );
    let route = RouteBuilder::from(&ctx, "direct:facade")
        .route_id("facade")
        .to("mock:out")
        .build()
        .unwrap();
    registry.add_route(route).unwrap();

    let route = registry.route("facade").unwrap();
    assert!(route.is_prepared());
    assert_eq!(route.outputs().len(), 2);
}

#[test]
fn test_yaml_documents_through_facade() {
    let document = RoutesLoader::from_yaml_str(
        r#"
- route:
    id: yaml-route
    from: direct:yaml
    steps:
      - to: mock:yaml
"#,
    )
    .unwrap();
    let mut registry = ModelRegistry::new(context());
    let ids = registry
        .add_routes_from(&YamlRoutesBuilder::new(document))
        .unwrap();
    assert_eq!(ids, vec!["yaml-route"]);
}

#[test]
fn test_context_from_config() {
    let config: ContextConfig = serde_json::from_str(
        r#"{"name": "facade", "properties": {"queue": "orders"}}"#,
    )
    .unwrap();
    let ctx = ModelContext::from_config(config);
    assert_eq!(ctx.name(), "facade");
    assert_eq!(ctx.resolve_placeholders("jms:{{queue}}").unwrap(), "jms:orders");
}
