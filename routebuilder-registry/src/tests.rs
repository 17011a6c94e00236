#[cfg(test)]
mod tests {
    use crate::*;
    use routebuilder_context::{ErrorHandlerDefinition, ModelContext, NodeCounter};
    use routebuilder_core::prelude::*;
    use routebuilder_core::{TemplateParameterDefinition, RouteTemplateDefinition};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn ctx() -> ModelContext {
        ModelContext::builder()
            .counter(Arc::new(NodeCounter::new()))
            .property("orders.enabled", "true")
            .property("audit.enabled", "false")
            .build()
    }

    fn simple_route(ctx: &ModelContext, uri: &str) -> RouteDefinition {
        RouteBuilder::from(ctx, uri).log("hello").build().unwrap()
    }

    fn kinds(route: &RouteDefinition) -> Vec<&'static str> {
        route
            .outputs()
            .iter()
            .map(|&n| route.tree().kind(n).short_name())
            .collect()
    }

    fn shared_configuration(ctx: &ModelContext) -> RouteConfigurationDefinition {
        RouteConfigurationBuilder::new(ctx)
            .configuration_id("shared")
            .error_handler(ErrorHandlerDefinition::dead_letter_channel("mock:dlq"))
            .on_exception(["IoError"])
            .handled(ExpressionDefinition::constant("true"))
            .end()
            .build()
            .unwrap()
    }

    #[test]
    fn test_add_routes_applies_matching_configuration() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        registry.add_route_configuration(shared_configuration(&ctx));

        let route = RouteBuilder::from(&ctx, "direct:orders")
            .route_configuration_id("shared")
            .to("mock:orders")
            .build()
            .unwrap();
        let ids = registry.add_route(route).unwrap();
        assert_eq!(ids, vec!["route1"]);

        let route = registry.route("route1").unwrap();
        assert!(route.is_prepared());
        assert_eq!(kinds(route), vec!["onException", "to"]);
        assert_eq!(route.applied_route_configuration_ids(), &["shared"]);
        assert_eq!(
            route.error_handler(),
            Some(&ErrorHandlerDefinition::dead_letter_channel("mock:dlq"))
        );
        // node ids are assigned once registered
        let to = route.outputs()[1];
        assert_eq!(route.tree().header(to).id.as_deref(), Some("to1"));
    }

    #[test]
    fn test_route_without_configuration_ids_ignores_named_configuration() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        registry.add_route_configuration(shared_configuration(&ctx));

        registry.add_route(simple_route(&ctx, "direct:a")).unwrap();
        let route = &registry.routes()[0];
        assert_eq!(kinds(route), vec!["log"]);
        assert!(route.applied_route_configuration_ids().is_empty());
    }

    #[test]
    fn test_precondition_excludes_route() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        let included = RouteBuilder::from(&ctx, "direct:orders")
            .precondition("{{orders.enabled}}")
            .log("x")
            .build()
            .unwrap();
        let excluded = RouteBuilder::from(&ctx, "direct:audit")
            .precondition("{{audit.enabled}}")
            .log("x")
            .build()
            .unwrap();

        let ids = registry.add_routes(vec![included, excluded]).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(registry.routes().len(), 1);
        assert_eq!(registry.routes()[0].endpoint_uri(), Some("direct:orders"));
    }

    #[test]
    fn test_invalid_precondition_is_an_error() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        let route = RouteBuilder::from(&ctx, "direct:a")
            .precondition("maybe")
            .log("x")
            .build()
            .unwrap();
        let err = registry.add_route(route).unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { what: "precondition", .. }));
    }

    #[test]
    fn test_disabled_nodes_are_pruned() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        let route = RouteBuilder::from(&ctx, "direct:a")
            .log("kept")
            .to("mock:audit")
            .disabled("{{orders.enabled}}")
            .build()
            .unwrap();
        registry.add_route(route).unwrap();
        assert_eq!(kinds(&registry.routes()[0]), vec!["log"]);
    }

    #[test]
    fn test_duplicate_route_id_rejects_whole_batch() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        let first = RouteBuilder::from(&ctx, "direct:a")
            .route_id("orders")
            .log("x")
            .build()
            .unwrap();
        let second = RouteBuilder::from(&ctx, "direct:b")
            .route_id("orders")
            .log("y")
            .build()
            .unwrap();

        let err = registry.add_routes(vec![first, second]).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateRouteId(ref id) if id == "orders"));
        assert!(registry.routes().is_empty());
    }

    #[test]
    fn test_duplicate_node_id_across_routes() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        let first = RouteBuilder::from(&ctx, "direct:a")
            .to("mock:a")
            .id("send")
            .build()
            .unwrap();
        registry.add_route(first).unwrap();

        let second = RouteBuilder::from(&ctx, "direct:b")
            .to("mock:b")
            .id("send")
            .build()
            .unwrap();
        let err = registry.add_route(second).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateNodeId { ref id, .. } if id == "send"));
        assert_eq!(registry.routes().len(), 1);
    }

    #[test]
    fn test_route_without_outputs_fails_sanity_check() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        let route = RouteDefinition::from(&ctx, "direct:empty");
        let err = registry.add_route(route).unwrap_err();
        assert!(matches!(err, ModelError::NoOutputs(_)));
    }

    #[test]
    fn test_start_and_stop_order() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        let routes = vec![
            RouteBuilder::from(&ctx, "direct:a").route_id("a").log("a").build().unwrap(),
            RouteBuilder::from(&ctx, "direct:b")
                .route_id("b")
                .startup_order(20)
                .log("b")
                .build()
                .unwrap(),
            RouteBuilder::from(&ctx, "direct:c").route_id("c").log("c").build().unwrap(),
            RouteBuilder::from(&ctx, "direct:d")
                .route_id("d")
                .startup_order(10)
                .log("d")
                .build()
                .unwrap(),
        ];
        registry.add_routes(routes).unwrap();

        let start: Vec<&str> = registry.start_order().iter().filter_map(|r| r.id()).collect();
        assert_eq!(start, vec!["d", "b", "a", "c"]);
        let stop: Vec<&str> = registry.stop_order().iter().filter_map(|r| r.id()).collect();
        assert_eq!(stop, vec!["c", "a", "b", "d"]);

        let clash = RouteBuilder::from(&ctx, "direct:e")
            .startup_order(10)
            .log("e")
            .build()
            .unwrap();
        let err = registry.add_route(clash).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DuplicateStartupOrder { order: 10, ref other, .. } if other == "d"
        ));
    }

    #[test]
    fn test_route_from_template() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        registry.add_route_configuration(shared_configuration(&ctx));

        let route = RouteBuilder::from(&ctx, "direct:{{name}}")
            .route_configuration_id("{{config}}")
            .to("mock:{{name}}")
            .build()
            .unwrap();
        let template = RouteTemplateDefinition::new("greeter", route)
            .parameter(TemplateParameterDefinition::required("name"))
            .parameter(TemplateParameterDefinition::optional("config", "shared"));
        registry.add_route_template(template);

        let parameters = BTreeMap::from([("name".to_string(), "alice".to_string())]);
        let id = registry
            .add_route_from_template(Some("alice-route"), "greeter", &parameters)
            .unwrap();
        assert_eq!(id.as_deref(), Some("alice-route"));

        let route = registry.route("alice-route").unwrap();
        assert_eq!(route.endpoint_uri(), Some("direct:alice"));
        assert_eq!(route.template_id.as_deref(), Some("greeter"));
        assert_eq!(route.applied_route_configuration_ids(), &["shared"]);

        let err = registry
            .add_route_from_template(None, "greeter", &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingTemplateParameters { .. }));
        let err = registry
            .add_route_from_template(None, "unknown", &parameters)
            .unwrap_err();
        assert!(matches!(err, ModelError::UnresolvedReference { kind: "route template", .. }));
    }

    #[test]
    fn test_remove_templates_by_pattern() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        for id in ["orders-in", "orders-out", "billing"] {
            registry.add_route_template(RouteTemplateDefinition::new(id, simple_route(&ctx, "direct:x")));
        }
        assert_eq!(registry.remove_route_templates("orders*"), 2);
        assert_eq!(registry.route_templates().len(), 1);
        assert!(registry.route_template("billing").is_some());
    }

    #[test]
    fn test_reprepare_picks_up_new_configuration() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        registry.add_route(simple_route(&ctx, "direct:a")).unwrap();
        assert_eq!(kinds(&registry.routes()[0]), vec!["log"]);

        let global = RouteConfigurationBuilder::new(&ctx)
            .on_exception(["Timeout"])
            .end()
            .build()
            .unwrap();
        registry.add_route_configuration(global);
        registry.reprepare_routes().unwrap();

        let route = &registry.routes()[0];
        assert_eq!(kinds(route), vec!["onException", "log"]);
        assert_eq!(route.applied_route_configuration_ids(), &["<default>"]);
    }

    #[test]
    fn test_route_filter() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        registry.set_route_filter(Some(RouteFilter::new(Some("orders*"), Some("*-legacy"))));
        let routes = vec![
            RouteBuilder::from(&ctx, "direct:a").route_id("orders-new").log("a").build().unwrap(),
            RouteBuilder::from(&ctx, "direct:b").route_id("orders-legacy").log("b").build().unwrap(),
            RouteBuilder::from(&ctx, "direct:c").route_id("billing").log("c").build().unwrap(),
        ];
        let ids = registry.add_routes(routes).unwrap();
        assert_eq!(ids, vec!["orders-new"]);
    }

    #[test]
    fn test_remove_route_and_configuration() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        registry.add_route_configuration(shared_configuration(&ctx));
        registry.add_route(simple_route(&ctx, "direct:a")).unwrap();

        assert!(registry.remove_route("route1").is_some());
        assert!(registry.remove_route("route1").is_none());
        assert!(registry.route_ids().is_empty());

        assert!(registry.route_configuration("shared").is_some());
        assert!(registry.remove_route_configuration("shared").is_some());
        assert!(registry.route_configurations().is_empty());
    }

    #[test]
    fn test_configuration_with_same_id_is_replaced() {
        let ctx = ctx();
        let mut registry = ModelRegistry::new(ctx.clone());
        registry.add_route_configuration(shared_configuration(&ctx));
        let mut replacement = RouteConfigurationDefinition::with_id(&ctx, "shared");
        replacement.order = 5;
        registry.add_route_configuration(replacement);

        assert_eq!(registry.route_configurations().len(), 1);
        assert_eq!(registry.route_configuration("shared").unwrap().order, 5);
    }

    #[test]
    fn test_named_definitions() {
        let mut registry = ModelRegistry::new(ctx());
        registry.add_data_format(DataFormatDefinition::new("orders-json", "json").property("pretty", "true"));
        registry.add_validator(ValidatorDefinition {
            data_type: "json:order".into(),
            kind: ValidatorKind::Custom {
                class_name: "OrderValidator".into(),
            },
        });
        registry.add_transformer(TransformerDefinition {
            scheme: Some("json".into()),
            from_type: None,
            to_type: None,
            kind: TransformerKind::DataFormat {
                name: "orders-json".into(),
            },
        });
        registry.add_resilience_configuration(ResilienceConfiguration {
            failure_rate_threshold: Some(50.0),
            ..ResilienceConfiguration::new("slow-backend")
        });

        assert_eq!(registry.data_format("orders-json").unwrap().format, "json");
        assert!(registry.validator("json:order").is_ok());
        assert!(registry.transformer("xml:order", "json:order").is_ok());
        assert_eq!(
            registry
                .resilience_configuration("slow-backend")
                .unwrap()
                .failure_rate_threshold,
            Some(50.0)
        );

        let err = registry.data_format("csv").unwrap_err();
        assert!(matches!(err, ModelError::UnresolvedReference { kind: "data format", .. }));
        assert!(registry.validator("xml:order").is_err());
        assert!(registry.transformer("xml:a", "csv:b").is_err());
        assert!(registry.resilience_configuration("fast").is_err());
        assert_eq!(registry.data_formats().count(), 1);
    }

    struct OrdersRoutes;

    impl RoutesBuilder for OrdersRoutes {
        fn route_configurations(
            &self,
            ctx: &ModelContext,
        ) -> routebuilder_core::Result<Vec<RouteConfigurationDefinition>> {
            Ok(vec![RouteConfigurationBuilder::new(ctx)
                .configuration_id("orders")
                .intercept()
                .log("intercepted")
                .end()
                .build()?])
        }

        fn routes(&self, ctx: &ModelContext) -> routebuilder_core::Result<Vec<RouteDefinition>> {
            Ok(vec![RouteBuilder::from(ctx, "direct:orders")
                .route_id("orders")
                .route_configuration_id("orders")
                .to("mock:orders")
                .build()?])
        }
    }

    struct BillingRoutes;

    impl RoutesBuilder for BillingRoutes {
        fn routes(&self, ctx: &ModelContext) -> routebuilder_core::Result<Vec<RouteDefinition>> {
            (0..3)
                .map(|i| {
                    RouteBuilder::from(ctx, format!("direct:billing-{i}"))
                        .to("mock:billing")
                        .build()
                })
                .collect()
        }
    }

    #[test]
    fn test_add_routes_from_builder() {
        let mut registry = ModelRegistry::new(ctx());
        let ids = registry.add_routes_from(&OrdersRoutes).unwrap();
        assert_eq!(ids, vec!["orders"]);
        let route = registry.route("orders").unwrap();
        assert_eq!(kinds(route), vec!["intercept", "to"]);
    }

    #[tokio::test]
    async fn test_concurrent_builders_share_one_registry() {
        let registry = shared(ModelRegistry::new(ctx()));
        let builders: Vec<Arc<dyn RoutesBuilder>> =
            vec![Arc::new(OrdersRoutes), Arc::new(BillingRoutes)];

        let ids = add_routes_concurrently(&registry, builders).await.unwrap();
        assert_eq!(ids.len(), 4);

        let registry = registry.lock().await;
        assert_eq!(registry.routes().len(), 4);
        let mut generated: Vec<&str> = registry
            .route_ids()
            .into_iter()
            .filter(|id| id.starts_with("route"))
            .collect();
        generated.sort_unstable();
        assert_eq!(generated, vec!["route1", "route2", "route3"]);
    }

    struct AuditedRoutes;

    impl RoutesBuilder for AuditedRoutes {
        fn routes(&self, ctx: &ModelContext) -> routebuilder_core::Result<Vec<RouteDefinition>> {
            Ok(vec![RouteBuilder::from(ctx, "direct:payments")
                .route_id("payments")
                .route_configuration_id("orders")
                .to("mock:payments")
                .build()?])
        }
    }

    #[tokio::test]
    async fn test_concurrent_builders_see_each_others_configurations() {
        for _ in 0..8 {
            let registry = shared(ModelRegistry::new(ctx()));
            // the route naming "orders" comes from the builder listed first
            let builders: Vec<Arc<dyn RoutesBuilder>> =
                vec![Arc::new(AuditedRoutes), Arc::new(OrdersRoutes)];

            let ids = add_routes_concurrently(&registry, builders).await.unwrap();
            assert_eq!(ids, vec!["payments", "orders"]);

            let registry = registry.lock().await;
            let payments = registry.route("payments").unwrap();
            assert_eq!(payments.applied_route_configuration_ids(), &["orders"]);
            assert_eq!(kinds(payments), vec!["intercept", "to"]);
        }
    }
}
