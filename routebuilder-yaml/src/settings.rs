use anyhow::{Context, Result};
use routebuilder_context::{ContextConfig, ModelContext};
use std::fs;
use std::path::Path;

/// 上下文配置加载器
pub struct SettingsLoader;

impl SettingsLoader {
    pub fn from_yaml_str(content: &str) -> Result<ContextConfig> {
        serde_yaml::from_str(content).with_context(|| "Failed to parse context settings YAML")
    }

    pub fn from_json_str(content: &str) -> Result<ContextConfig> {
        serde_json::from_str(content).with_context(|| "Failed to parse context settings JSON")
    }

    /// Reads settings from a `.json`, `.yaml` or `.yml` file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ContextConfig> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// 加载配置并创建上下文
    pub fn context_from_file<P: AsRef<Path>>(path: P) -> Result<ModelContext> {
        Ok(ModelContext::from_config(Self::from_file(path)?))
    }

    pub fn context_from_yaml_str(content: &str) -> Result<ModelContext> {
        Ok(ModelContext::from_config(Self::from_yaml_str(content)?))
    }
}
