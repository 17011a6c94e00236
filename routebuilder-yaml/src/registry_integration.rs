use crate::config::RoutesDocument;
use crate::loader::RoutesLoader;
use crate::parser::{ParsedRoutes, YamlRouteParser};
use anyhow::{Context, Result};
use routebuilder_context::ModelContext;
use routebuilder_core::{RouteConfigurationDefinition, RouteDefinition, RouteTemplateDefinition};
use routebuilder_registry::{RoutesBuilder, SharedRegistry};
use std::path::Path;
use tracing::info;

/// 基于路由文档的 RoutesBuilder
pub struct YamlRoutesBuilder {
    document: RoutesDocument,
    resource: Option<String>,
}

impl YamlRoutesBuilder {
    pub fn new(document: RoutesDocument) -> Self {
        Self {
            document,
            resource: None,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let document = RoutesLoader::from_file(&path)?;
        RoutesLoader::validate(&document)?;
        Ok(Self {
            document,
            resource: Some(path.as_ref().display().to_string()),
        })
    }

    pub fn document(&self) -> &RoutesDocument {
        &self.document
    }

    fn parser(&self, ctx: &ModelContext) -> YamlRouteParser {
        let parser = YamlRouteParser::new(ctx.clone());
        match &self.resource {
            Some(resource) => parser.with_resource(resource.clone()),
            None => parser,
        }
    }
}

impl RoutesBuilder for YamlRoutesBuilder {
    fn name(&self) -> &str {
        self.resource.as_deref().unwrap_or("yaml-routes")
    }

    fn route_configurations(
        &self,
        ctx: &ModelContext,
    ) -> routebuilder_core::Result<Vec<RouteConfigurationDefinition>> {
        let parser = self.parser(ctx);
        self.document
            .route_configurations()
            .map(|entry| parser.build_route_configuration(entry))
            .collect()
    }

    fn route_templates(
        &self,
        ctx: &ModelContext,
    ) -> routebuilder_core::Result<Vec<RouteTemplateDefinition>> {
        let parser = self.parser(ctx);
        self.document
            .route_templates()
            .map(|entry| parser.build_route_template(entry))
            .collect()
    }

    fn routes(&self, ctx: &ModelContext) -> routebuilder_core::Result<Vec<RouteDefinition>> {
        let parser = self.parser(ctx);
        self.document
            .routes()
            .map(|entry| parser.build_route(entry))
            .collect()
    }
}

/// 批量加载路由文件并注册到共享注册表。
///
/// 所有文件的路由配置和模板先注册，随后全部路由作为一个批次添加，
/// 因此文件顺序不影响配置匹配。返回添加的路由 id。
pub async fn load_routes_into_registry<P: AsRef<Path>>(
    registry: &SharedRegistry,
    paths: Vec<P>,
    max_concurrent: usize,
) -> Result<Vec<String>> {
    let documents = RoutesLoader::load_batch(paths, max_concurrent).await?;

    let mut registry = registry.lock().await;
    let ctx = registry.context().clone();
    let mut parsed = ParsedRoutes::default();
    for (path, document) in &documents {
        RoutesLoader::validate(document)
            .with_context(|| format!("Invalid routes file: {:?}", path))?;
        let parser = YamlRouteParser::new(ctx.clone()).with_resource(path.display().to_string());
        parsed.extend(parser.parse(document)?);
    }

    registry.add_route_configurations(parsed.configurations);
    for template in parsed.templates {
        registry.add_route_template(template);
    }
    let ids = registry
        .add_routes(parsed.routes)
        .with_context(|| "Failed to register loaded routes")?;
    info!(files = documents.len(), routes = ids.len(), "routes loaded into registry");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use routebuilder_context::NodeCounter;
    use routebuilder_registry::{shared, ModelRegistry};
    use std::sync::Arc;

    fn registry() -> ModelRegistry {
        ModelRegistry::new(
            ModelContext::builder()
                .counter(Arc::new(NodeCounter::new()))
                .build(),
        )
    }

    #[test]
    fn test_yaml_routes_builder_into_registry() {
        let document = RoutesLoader::from_yaml_str(
            r#"
- route-configuration:
    on-exception:
      - exceptions: [IoError]
        steps:
          - log: failed
- route:
    id: orders
    from: direct:orders
    steps:
      - to: mock:orders
"#,
        )
        .unwrap();
        let mut registry = registry();
        let ids = registry
            .add_routes_from(&YamlRoutesBuilder::new(document))
            .unwrap();
        assert_eq!(ids, vec!["orders"]);
        let route = registry.route("orders").unwrap();
        assert_eq!(route.outputs().len(), 2);
        assert_eq!(route.applied_route_configuration_ids(), &["<default>"]);
    }

    #[tokio::test]
    async fn test_load_routes_into_registry_orders_configurations_first() {
        let dir = std::env::temp_dir();
        let routes = dir.join(format!("routebuilder-{}-int-routes.yaml", std::process::id()));
        let configs = dir.join(format!("routebuilder-{}-int-configs.yaml", std::process::id()));
        std::fs::write(
            &routes,
            r#"
- route:
    id: billing
    from: direct:billing
    route-configuration-id: audit
    steps:
      - to: mock:billing
"#,
        )
        .unwrap();
        std::fs::write(
            &configs,
            r#"
- route-configuration:
    id: audit
    on-completion:
      - steps:
          - to: mock:audit
"#,
        )
        .unwrap();

        let registry = shared(registry());
        let ids = load_routes_into_registry(&registry, vec![routes.clone(), configs.clone()], 2)
            .await
            .unwrap();
        let _ = std::fs::remove_file(&routes);
        let _ = std::fs::remove_file(&configs);

        assert_eq!(ids, vec!["billing"]);
        let registry = registry.lock().await;
        let route = registry.route("billing").unwrap();
        assert_eq!(route.applied_route_configuration_ids(), &["audit"]);
    }
}
