use routebuilder_context::{ErrorHandlerDefinition, ModelContext, NodeCounter};
use routebuilder_core::prelude::*;
use routebuilder_core::{RestDefinition, VerbDefinition};
use routebuilder_registry::prelude::*;
use std::sync::Arc;

fn fresh_context() -> ModelContext {
    ModelContext::builder()
        .name("registry-tests")
        .counter(Arc::new(NodeCounter::new()))
        .property("region", "eu")
        .endpoint("incoming", "jms:queue:orders")
        .build()
}

fn labels(route: &RouteDefinition) -> Vec<String> {
    route
        .outputs()
        .iter()
        .map(|&n| route.tree().kind(n).label())
        .collect()
}

struct Platform;

impl RoutesBuilder for Platform {
    fn route_configurations(
        &self,
        ctx: &ModelContext,
    ) -> routebuilder_core::Result<Vec<RouteConfigurationDefinition>> {
        let errors = RouteConfigurationBuilder::new(ctx)
            .configuration_id("errors-eu")
            .order(1)
            .error_handler(ErrorHandlerDefinition::dead_letter_channel("jms:queue:dead"))
            .on_exception(["ValidationError"])
            .log("rejected")
            .end()
            .build()?;
        let auditing = RouteConfigurationBuilder::new(ctx)
            .configuration_id("audit")
            .order(0)
            .intercept_from(Some("jms:*"))
            .to("mock:audit")
            .end()
            .on_completion()
            .log("done")
            .end()
            .build()?;
        Ok(vec![errors, auditing])
    }

    fn routes(&self, ctx: &ModelContext) -> routebuilder_core::Result<Vec<RouteDefinition>> {
        let orders = RouteBuilder::from(ctx, "ref:incoming")
            .route_id("orders")
            .route_configuration_id("errors-*,audit")
            .on_exception(["TimeoutError"])
            .end()
            .to("mock:orders")
            .build()?;

        let mut users = RouteDefinition::from(ctx, "rest:get:/users:/{id}");
        users.rest = Some(RestDefinition {
            id: Some("users-api".into()),
            path: Some("/users".into()),
            verbs: vec![VerbDefinition {
                id: Some("find-user".into()),
                method: "GET".into(),
                path: Some("/{id}".into()),
            }],
        });
        users.add_output(NodeKind::to("mock:users"))?;

        Ok(vec![orders, users])
    }
}

#[test]
fn configurations_merge_in_declared_order_onto_matching_routes() {
    let mut registry = ModelRegistry::new(fresh_context());
    let ids = registry.add_routes_from(&Platform).unwrap();
    assert_eq!(ids, vec!["orders", "find-user"]);

    let orders = registry.route("orders").unwrap();
    assert_eq!(orders.applied_route_configuration_ids(), &["errors-eu", "audit"]);
    assert_eq!(
        labels(orders),
        vec![
            "onException[TimeoutError]",
            "onException[ValidationError]",
            "interceptFrom[jms:*]",
            "onCompletion",
            "to[mock:orders]",
        ]
    );
    assert_eq!(
        orders.error_handler(),
        Some(&ErrorHandlerDefinition::dead_letter_channel("jms:queue:dead"))
    );
}

#[test]
fn rest_routes_take_their_verb_id() {
    let mut registry = ModelRegistry::new(fresh_context());
    registry.add_routes_from(&Platform).unwrap();

    let users = registry.route("find-user").unwrap();
    assert_eq!(
        users.endpoint_uri(),
        Some("rest:get:/users:/{id}?routeId=find-user")
    );
    assert!(users.applied_route_configuration_ids().is_empty());
}

#[test]
fn configuration_nodes_are_copied_per_route() {
    let ctx = fresh_context();
    let mut registry = ModelRegistry::new(ctx.clone());
    registry.add_route_configuration(
        RouteConfigurationBuilder::new(&ctx)
            .on_exception(["Boom"])
            .handled(ExpressionDefinition::constant("true"))
            .end()
            .build()
            .unwrap(),
    );
    let routes = (0..2)
        .map(|i| {
            RouteBuilder::from(&ctx, format!("direct:{i}"))
                .log("x")
                .build()
                .unwrap()
        })
        .collect();
    registry.add_routes(routes).unwrap();

    for route in registry.routes() {
        let on_exception = route.outputs()[0];
        assert!(!route.tree().kind(on_exception).is_route_scoped());
        assert_eq!(route.tree().parent(on_exception), Some(route.root()));
    }
    // the configuration itself is untouched
    let config = &registry.route_configurations()[0];
    assert!(config.tree().kind(config.on_exceptions()[0]).is_route_scoped());
}

#[test]
fn failed_preparation_leaves_registry_unchanged() {
    let ctx = fresh_context();
    let mut registry = ModelRegistry::new(ctx.clone());
    let good = RouteBuilder::from(&ctx, "direct:good").log("ok").build().unwrap();
    let bad = RouteBuilder::from(&ctx, "direct:bad")
        .transacted(None)
        .end()
        .transacted(Some("required"))
        .end()
        .log("x")
        .build()
        .unwrap();

    let err = registry.add_routes(vec![good, bad]).unwrap_err();
    assert!(matches!(err, ModelError::MultipleTransacted { .. }));
    assert!(registry.routes().is_empty());
}
