use routebuilder::prelude::*;

const ROUTES: &str = r#"
- route-configuration:
    id: errors
    error-handler:
      dead-letter-channel:
        dead-letter-uri: jms:queue:dead
    on-exception:
      - exceptions: [ValidationError]
        handled: { constant: "true" }
        steps:
          - log: "rejected ${body}"
- route:
    id: orders
    from: "jms:queue:{{orders.queue}}"
    route-configuration-id: errors
    steps:
      - choice:
          when:
            - expression: { simple: "${header.priority} == 'high'" }
              steps:
                - to: jms:queue:express
          otherwise:
            steps:
              - to: jms:queue:standard
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Logger::init_tracing();
    let logger = Logger::new();

    let ctx = ModelContext::builder()
        .name("orders-demo")
        .property("orders.queue", "incoming")
        .build();
    let registry = shared(ModelRegistry::new(ctx));

    let document = RoutesLoader::from_yaml_str(ROUTES)?;
    RoutesLoader::validate(&document)?;
    let builder: std::sync::Arc<dyn RoutesBuilder> =
        std::sync::Arc::new(YamlRoutesBuilder::new(document));
    let ids = add_routes_concurrently(&registry, vec![builder]).await?;
    logger.info(&format!("added routes: {}", ids.join(", ")));

    let registry = registry.lock().await;
    for route in registry.routes() {
        logger.log_route_summary(route);
        println!("{}", dump_route(route));
    }
    Ok(())
}
