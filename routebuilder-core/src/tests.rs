#[cfg(test)]
mod tests {
    use crate::*;
    use routebuilder_context::{ErrorHandlerDefinition, ModelContext, NodeCounter};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn ctx() -> ModelContext {
        ModelContext::builder()
            .counter(Arc::new(NodeCounter::new()))
            .build()
    }

    fn described(tree: &mut NodeTree, node: NodeId, text: &str) -> NodeId {
        tree.header_mut(node).description = Some(text.to_string());
        node
    }

    fn descriptions(route: &RouteDefinition, node: NodeId) -> Vec<String> {
        route
            .tree()
            .outputs(node)
            .iter()
            .map(|&n| {
                route
                    .tree()
                    .header(n)
                    .description
                    .clone()
                    .unwrap_or_else(|| route.tree().kind(n).short_name().to_string())
            })
            .collect()
    }

    #[test]
    fn test_prepare_global_on_exception_scenario() {
        let ctx = ctx();
        let mut route = RouteDefinition::from(&ctx, "A");
        let mut kind = NodeKind::on_exception(["FooException"]);
        kind.set_route_scoped(false);
        let on_ex = route.add_output(kind).unwrap();
        let log = route.add_output(NodeKind::log("x")).unwrap();
        let to = route.add_output(NodeKind::to("B")).unwrap();

        assert!(prepare_route(&ctx, &mut route, &CrossCutting::default()).unwrap());
        assert_eq!(route.outputs(), &[on_ex, log, to]);
        assert!(route.is_prepared());

        assert!(!prepare_route(&ctx, &mut route, &CrossCutting::default()).unwrap());
        assert_eq!(route.outputs(), &[on_ex, log, to]);
    }

    #[test]
    fn test_interceptors_are_prepended_in_reverse() {
        let ctx = ctx();
        let mut config = RouteConfigurationDefinition::with_id(&ctx, "cfg");
        let i1 = config.add(NodeKind::Intercept { on_when: None }).unwrap();
        described(config.tree_mut(), i1, "i1");
        let f1 = config
            .add(NodeKind::InterceptFrom {
                uri: None,
                on_when: None,
            })
            .unwrap();
        described(config.tree_mut(), f1, "f1");
        let s1 = config
            .add(NodeKind::InterceptSendToEndpoint {
                uri: "mock:*".to_string(),
                skip_send_to_original_endpoint: None,
                after_uri: None,
                on_when: None,
            })
            .unwrap();
        described(config.tree_mut(), s1, "s1");

        let mut route = RouteDefinition::from(&ctx, "direct:orders");
        let i2 = route.add_output(NodeKind::Intercept { on_when: None }).unwrap();
        described(route.tree_mut(), i2, "i2");
        let f2 = route
            .add_output(NodeKind::InterceptFrom {
                uri: Some("direct:*".to_string()),
                on_when: None,
            })
            .unwrap();
        described(route.tree_mut(), f2, "f2");
        let f3 = route
            .add_output(NodeKind::InterceptFrom {
                uri: Some("timer:*".to_string()),
                on_when: None,
            })
            .unwrap();
        described(route.tree_mut(), f3, "f3");
        let work = route.add_output(NodeKind::log("work")).unwrap();
        described(route.tree_mut(), work, "work");

        let concerns = CrossCutting {
            intercepts: vec![ForeignNode::new(config.tree(), i1)],
            intercept_froms: vec![ForeignNode::new(config.tree(), f1)],
            intercept_send_to_endpoints: vec![ForeignNode::new(config.tree(), s1)],
            applied_configuration_ids: vec!["cfg".to_string()],
            ..Default::default()
        };
        prepare_route(&ctx, &mut route, &concerns).unwrap();

        assert_eq!(
            descriptions(&route, route.root()),
            vec!["s1", "f2", "f1", "i2", "i1", "work"]
        );
        assert_eq!(route.applied_route_configuration_ids(), &["cfg"]);
        let first = route.outputs()[0];
        assert_eq!(
            route.tree().header(first).route_configuration_id.as_deref(),
            Some("cfg")
        );
        assert_ne!(route.tree().header(first).index, config.tree().header(s1).index);
    }

    #[test]
    fn test_full_layout_with_saga() {
        let ctx = ctx();
        let mut config = RouteConfigurationDefinition::with_id(&ctx, "errors");
        let e2 = config.add(NodeKind::on_exception(["Global"])).unwrap();
        described(config.tree_mut(), e2, "e2");

        let mut route = RouteDefinition::from(&ctx, "direct:a");
        let tree = route.tree_mut();
        let root = tree.root();
        let log = tree.append(root, NodeKind::log("one")).unwrap();
        let e1 = tree.append(root, NodeKind::on_exception(["Local"])).unwrap();
        described(tree, e1, "e1");
        let saga = tree.append(root, NodeKind::saga()).unwrap();
        described(tree, saga, "saga");
        let intercept = tree.append(root, NodeKind::Intercept { on_when: None }).unwrap();
        described(tree, intercept, "intercept");
        let completion = tree.append(root, NodeKind::on_completion()).unwrap();
        described(tree, completion, "completion");
        let to = tree.append(root, NodeKind::to("mock:b")).unwrap();

        let concerns = CrossCutting {
            on_exceptions: vec![ForeignNode::new(config.tree(), e2)],
            ..Default::default()
        };
        prepare_route(&ctx, &mut route, &concerns).unwrap();

        assert_eq!(
            descriptions(&route, route.root()),
            vec!["e1", "e2", "intercept", "completion", "saga"]
        );
        assert_eq!(route.tree().outputs(saga), &[log, to]);
        assert!(route.tree().kind(e1).is_route_scoped());
        let global = route.outputs()[1];
        assert!(!route.tree().kind(global).is_route_scoped());
    }

    #[test]
    fn test_route_on_completion_overrides_global() {
        let ctx = ctx();
        let mut config = RouteConfigurationDefinition::new(&ctx);
        let global = config.add(NodeKind::on_completion()).unwrap();
        described(config.tree_mut(), global, "global");
        let concerns = CrossCutting {
            on_completions: vec![ForeignNode::new(config.tree(), global)],
            ..Default::default()
        };

        let mut own = RouteDefinition::from(&ctx, "direct:a");
        let local = own.add_output(NodeKind::on_completion()).unwrap();
        described(own.tree_mut(), local, "local");
        own.add_output(NodeKind::to("mock:a")).unwrap();
        prepare_route(&ctx, &mut own, &concerns).unwrap();
        assert_eq!(descriptions(&own, own.root()), vec!["local", "to"]);

        let mut plain = RouteDefinition::from(&ctx, "direct:b");
        plain.add_output(NodeKind::to("mock:b")).unwrap();
        prepare_route(&ctx, &mut plain, &concerns).unwrap();
        assert_eq!(descriptions(&plain, plain.root()), vec!["global", "to"]);
        let copied = plain.outputs()[0];
        assert!(!plain.tree().kind(copied).is_route_scoped());
    }

    #[test]
    fn test_saga_inside_transacted_keeps_own_outputs_last() {
        let ctx = ctx();
        let mut route = RouteDefinition::from(&ctx, "direct:a");
        let tree = route.tree_mut();
        let root = tree.root();
        let transacted = tree.append(root, NodeKind::Transacted { policy: None }).unwrap();
        let saga = tree.append(root, NodeKind::saga()).unwrap();
        let inner = tree.append(saga, NodeKind::to("mock:inner")).unwrap();
        let log = tree.append(root, NodeKind::log("x")).unwrap();

        prepare_route(&ctx, &mut route, &CrossCutting::default()).unwrap();
        assert_eq!(route.outputs(), &[transacted]);
        assert_eq!(route.tree().outputs(transacted), &[saga]);
        assert_eq!(route.tree().outputs(saga), &[log, inner]);
        assert_eq!(route.tree().parent(log), Some(saga));
    }

    #[test]
    fn test_two_sagas_fail_and_restore_route() {
        let ctx = ctx();
        let mut route = RouteDefinition::from(&ctx, "direct:a");
        route.add_output(NodeKind::saga()).unwrap();
        route.add_output(NodeKind::log("x")).unwrap();
        route.add_output(NodeKind::saga()).unwrap();
        let authored = route.outputs().to_vec();

        let err = prepare_route(&ctx, &mut route, &CrossCutting::default()).unwrap_err();
        assert!(matches!(err, ModelError::MultipleSagas { .. }));
        assert!(!route.is_prepared());
        assert_eq!(route.outputs(), authored.as_slice());

        let mut transacted = RouteDefinition::from(&ctx, "direct:b");
        transacted.add_output(NodeKind::Transacted { policy: None }).unwrap();
        transacted.add_output(NodeKind::Transacted { policy: None }).unwrap();
        let err = prepare_route(&ctx, &mut transacted, &CrossCutting::default()).unwrap_err();
        assert!(matches!(err, ModelError::MultipleTransacted { .. }));
    }

    #[test]
    fn test_intercept_from_resolves_references_and_parameters() {
        let ctx = ModelContext::builder()
            .counter(Arc::new(NodeCounter::new()))
            .endpoint("orders", "jms:queue:orders")
            .build();
        let intercept = |uri: &str| NodeKind::InterceptFrom {
            uri: Some(uri.to_string()),
            on_when: None,
        };

        let mut by_ref = RouteDefinition::from(&ctx, "ref:orders");
        by_ref.add_output(intercept("jms:*")).unwrap();
        by_ref.add_output(intercept("ref:orders")).unwrap();
        by_ref.add_output(intercept("ref:other")).unwrap();
        by_ref.add_output(NodeKind::log("x")).unwrap();
        prepare_route(&ctx, &mut by_ref, &CrossCutting::default()).unwrap();
        let kept: Vec<_> = by_ref
            .outputs()
            .iter()
            .filter_map(|&n| by_ref.tree().kind(n).endpoint_uri())
            .collect();
        assert_eq!(kept, vec!["ref:orders", "jms:*"]);

        let mut templated = RouteDefinition::from(&ctx, "jms:{{queue}}");
        templated.template_parameters =
            BTreeMap::from([("queue".to_string(), "orders".to_string())]);
        templated.add_output(intercept("jms:orders")).unwrap();
        templated.add_output(NodeKind::log("x")).unwrap();
        prepare_route(&ctx, &mut templated, &CrossCutting::default()).unwrap();
        assert_eq!(templated.outputs().len(), 2);

        let mut missing = RouteDefinition::from(&ctx, "ref:missing");
        missing.add_output(intercept("jms:*")).unwrap();
        let err = prepare_route(&ctx, &mut missing, &CrossCutting::default()).unwrap_err();
        assert_eq!(err, ModelError::unresolved("endpoint", "missing"));
    }

    #[test]
    fn test_error_handler_inheritance() {
        let ctx = ModelContext::builder()
            .counter(Arc::new(NodeCounter::new()))
            .error_handler(ErrorHandlerDefinition::dead_letter_channel("log:dead"))
            .build();

        let mut inherited = RouteDefinition::from(&ctx, "direct:a");
        inherited.add_output(NodeKind::log("x")).unwrap();
        prepare_route(&ctx, &mut inherited, &CrossCutting::default()).unwrap();
        assert_eq!(
            inherited.error_handler(),
            Some(&ErrorHandlerDefinition::dead_letter_channel("log:dead"))
        );
        assert!(inherited.is_context_scoped_error_handler());

        let mut configured = RouteDefinition::from(&ctx, "direct:b");
        configured.add_output(NodeKind::log("x")).unwrap();
        let concerns = CrossCutting {
            error_handler: Some(ErrorHandlerDefinition::NoErrorHandler),
            ..Default::default()
        };
        prepare_route(&ctx, &mut configured, &concerns).unwrap();
        assert_eq!(
            configured.error_handler(),
            Some(&ErrorHandlerDefinition::NoErrorHandler)
        );

        let mut own = RouteDefinition::from(&ctx, "direct:c");
        own.set_error_handler(ErrorHandlerDefinition::default());
        own.add_output(NodeKind::log("x")).unwrap();
        prepare_route(&ctx, &mut own, &concerns).unwrap();
        assert_eq!(own.error_handler(), Some(&ErrorHandlerDefinition::default()));
    }

    #[test]
    fn test_reset_prepare_restores_authored_tree() {
        let ctx = ctx();
        let mut config = RouteConfigurationDefinition::with_id(&ctx, "cfg");
        let global = config.add(NodeKind::on_exception(["Any"])).unwrap();
        let concerns = CrossCutting {
            on_exceptions: vec![ForeignNode::new(config.tree(), global)],
            applied_configuration_ids: vec!["cfg".to_string()],
            ..Default::default()
        };

        let mut route = RouteDefinition::from(&ctx, "direct:a");
        let log = route.add_output(NodeKind::log("x")).unwrap();
        prepare_route(&ctx, &mut route, &concerns).unwrap();
        assert_eq!(route.outputs().len(), 2);

        route.reset_prepare();
        assert!(!route.is_prepared());
        assert_eq!(route.outputs(), &[log]);
        assert!(route.applied_route_configuration_ids().is_empty());

        assert!(prepare_route(&ctx, &mut route, &concerns).unwrap());
        assert_eq!(route.outputs().len(), 2);
        assert_eq!(route.outputs()[1], log);
    }

    #[test]
    fn test_prepare_rejects_nested_top_level_node() {
        let ctx = ctx();
        let mut route = RouteDefinition::from(&ctx, "direct:a");
        let split = route
            .add_output(NodeKind::split(ExpressionDefinition::body().into()))
            .unwrap();
        let tree = route.tree_mut();
        let stray = tree.create(NodeKind::on_completion());
        tree.replace_outputs(split, vec![stray]);

        let err = prepare_route(&ctx, &mut route, &CrossCutting::default()).unwrap_err();
        assert!(matches!(err, ModelError::TopLevelOnly { .. }));
        assert!(!route.is_prepared());
    }

    #[test]
    fn test_builder_route_prepares() {
        let ctx = ctx();
        let mut route = RouteBuilder::from(&ctx, "direct:start")
            .on_exception(["IoException"])
            .handled(ExpressionDefinition::constant("true"))
            .to("mock:error")
            .end()
            .choice()
            .when(ExpressionDefinition::simple("${header.vip}"))
            .to("mock:vip")
            .otherwise()
            .to("mock:std")
            .end()
            .build()
            .unwrap();
        prepare_route(&ctx, &mut route, &CrossCutting::default()).unwrap();
        assert_eq!(descriptions(&route, route.root()), vec!["onException", "choice"]);
        assert!(helper::has_outputs(route.tree(), route.outputs(), true));
    }
}
