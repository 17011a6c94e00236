use crate::config::{RouteEntry, RoutesDocument, StepEntry};
use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// 路由文档加载器，支持从文件或字符串加载
pub struct RoutesLoader;

impl RoutesLoader {
    /// 从 YAML 文件加载路由文档
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<RoutesDocument> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read YAML file: {:?}", path.as_ref()))?;
        Self::from_yaml_str(&content)
    }

    /// 从 YAML 字符串加载路由文档
    pub fn from_yaml_str(content: &str) -> Result<RoutesDocument> {
        serde_yaml::from_str(content).with_context(|| "Failed to parse YAML content")
    }

    /// 从 JSON 文件加载路由文档
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<RoutesDocument> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read JSON file: {:?}", path.as_ref()))?;
        Self::from_json_str(&content)
    }

    /// 从 JSON 字符串加载路由文档
    pub fn from_json_str(content: &str) -> Result<RoutesDocument> {
        serde_json::from_str(content).with_context(|| "Failed to parse JSON content")
    }

    /// Loads a file, choosing the format from its extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<RoutesDocument> {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            other => Err(anyhow!(
                "Unsupported routes file extension {:?}: {:?}",
                other,
                path.as_ref()
            )),
        }
    }

    /// 保存路由文档到 YAML 文件
    pub fn save_to_yaml<P: AsRef<Path>>(document: &RoutesDocument, path: P) -> Result<()> {
        let yaml_content = serde_yaml::to_string(document)
            .with_context(|| "Failed to serialize routes to YAML")?;
        fs::write(&path, yaml_content)
            .with_context(|| format!("Failed to write YAML file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// 保存路由文档到 JSON 文件
    pub fn save_to_json<P: AsRef<Path>>(document: &RoutesDocument, path: P) -> Result<()> {
        let json_content = serde_json::to_string_pretty(document)
            .with_context(|| "Failed to serialize routes to JSON")?;
        fs::write(&path, json_content)
            .with_context(|| format!("Failed to write JSON file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// 验证路由文档的基本有效性
    pub fn validate(document: &RoutesDocument) -> Result<()> {
        if document.entries.is_empty() {
            return Err(anyhow!("Routes document must contain at least one entry"));
        }

        let mut route_ids = HashSet::new();
        for (index, route) in document.routes().enumerate() {
            validate_route(route).with_context(|| format!("Invalid route #{index}"))?;
            if let Some(id) = &route.id {
                if !route_ids.insert(id.as_str()) {
                    return Err(anyhow!("Duplicate route ID: {}", id));
                }
            }
        }

        let mut configuration_ids = HashSet::new();
        for config in document.route_configurations() {
            if let Some(id) = &config.id {
                if !configuration_ids.insert(id.as_str()) {
                    return Err(anyhow!("Duplicate route configuration ID: {}", id));
                }
            }
        }

        let mut template_ids = HashSet::new();
        for template in document.route_templates() {
            if template.id.trim().is_empty() {
                return Err(anyhow!("Route template ID cannot be empty"));
            }
            if !template_ids.insert(template.id.as_str()) {
                return Err(anyhow!("Duplicate route template ID: {}", template.id));
            }
            validate_route(&template.route)
                .with_context(|| format!("Invalid route in template {}", template.id))?;
        }

        Ok(())
    }

    /// 并发加载多个路由文件，`max_concurrent` 限制同时读取的文件数
    pub async fn load_batch<P: AsRef<Path>>(
        paths: Vec<P>,
        max_concurrent: usize,
    ) -> Result<Vec<(PathBuf, RoutesDocument)>> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

        let handles: Vec<_> = paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref().to_path_buf();
                let semaphore = Arc::clone(&semaphore);
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| anyhow!("Failed to acquire semaphore: {}", e))?;
                    let content = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Failed to read routes file: {:?}", path))?;
                    let document = if path.extension().and_then(|e| e.to_str()) == Some("json") {
                        Self::from_json_str(&content)
                    } else {
                        Self::from_yaml_str(&content)
                    }
                    .with_context(|| format!("Failed to load routes file: {:?}", path))?;
                    debug!(path = ?path, entries = document.entries.len(), "routes file loaded");
                    Ok::<_, anyhow::Error>((path, document))
                })
            })
            .collect();

        let mut documents = Vec::with_capacity(handles.len());
        for handle in handles {
            let loaded = handle
                .await
                .map_err(|e| anyhow!("Routes loading task did not complete: {}", e))??;
            documents.push(loaded);
        }
        Ok(documents)
    }
}

fn validate_route(route: &RouteEntry) -> Result<()> {
    if route.from.trim().is_empty() {
        return Err(anyhow!("Route input (from) cannot be empty"));
    }
    if route.steps.is_empty() && route.rest.is_none() {
        warn!(route = route.id.as_deref().unwrap_or("<unnamed>"), "route has no steps");
    }

    let mut node_ids = HashSet::new();
    let mut pending: Vec<&StepEntry> = route.steps.iter().collect();
    while let Some(step) = pending.pop() {
        if let Some(id) = step.custom_id() {
            if !node_ids.insert(id) {
                return Err(anyhow!("Duplicate step ID: {}", id));
            }
        }
        pending.extend(step.children());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTES: &str = r#"
- route:
    id: orders
    from: direct:orders
    steps:
      - to: mock:orders
- route-configuration:
    id: errors
    on-exception:
      - exceptions: [IoError]
"#;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("routebuilder-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_load_from_yaml_str() {
        let document = RoutesLoader::from_yaml_str(ROUTES).unwrap();
        assert_eq!(document.entries.len(), 2);
        assert_eq!(document.routes().count(), 1);
        assert_eq!(document.route_configurations().count(), 1);
        assert!(RoutesLoader::validate(&document).is_ok());
    }

    #[test]
    fn test_load_from_json_str() {
        let json = r#"[
            {"route": {"id": "a", "from": "direct:a", "steps": [{"log": "hello"}]}}
        ]"#;
        let document = RoutesLoader::from_json_str(json).unwrap();
        let route = document.routes().next().unwrap();
        assert_eq!(route.id.as_deref(), Some("a"));
        assert_eq!(route.steps[0].name(), "log");
    }

    #[test]
    fn test_validate_duplicate_route_id() {
        let document = RoutesLoader::from_yaml_str(
            r#"
- route: { id: a, from: "direct:a" }
- route: { id: a, from: "direct:b" }
"#,
        )
        .unwrap();
        let err = RoutesLoader::validate(&document).unwrap_err();
        assert!(err.to_string().contains("Duplicate route ID: a"));
    }

    #[test]
    fn test_validate_duplicate_step_id() {
        let document = RoutesLoader::from_yaml_str(
            r#"
- route:
    from: direct:a
    steps:
      - to: { uri: "mock:a", id: out }
      - filter:
          expression: { simple: "${body}" }
          steps:
            - to: { uri: "mock:b", id: out }
"#,
        )
        .unwrap();
        let err = RoutesLoader::validate(&document).unwrap_err();
        assert!(format!("{err:#}").contains("Duplicate step ID: out"));
    }

    #[test]
    fn test_validate_empty_from() {
        let document = RoutesLoader::from_yaml_str("- route: { from: \"\" }").unwrap();
        assert!(RoutesLoader::validate(&document).is_err());
    }

    #[test]
    fn test_save_and_reload_yaml() {
        let document = RoutesLoader::from_yaml_str(ROUTES).unwrap();
        let path = temp_path("save.yaml");
        RoutesLoader::save_to_yaml(&document, &path).unwrap();
        let reloaded = RoutesLoader::from_file(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(reloaded, document);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(RoutesLoader::from_file("routes.xml").is_err());
    }

    #[tokio::test]
    async fn test_load_batch_keeps_order() {
        let yaml = temp_path("batch.yaml");
        let json = temp_path("batch.json");
        fs::write(&yaml, ROUTES).unwrap();
        fs::write(
            &json,
            r#"[{"route": {"id": "b", "from": "direct:b"}}]"#,
        )
        .unwrap();

        let loaded = RoutesLoader::load_batch(vec![yaml.clone(), json.clone()], 1)
            .await
            .unwrap();
        let _ = fs::remove_file(&yaml);
        let _ = fs::remove_file(&json);

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].0, yaml);
        assert_eq!(loaded[1].1.routes().next().unwrap().id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_load_batch_reports_missing_file() {
        let err = RoutesLoader::load_batch(vec![temp_path("missing.yaml")], 2)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read routes file"));
    }
}
