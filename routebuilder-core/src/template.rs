use crate::error::{ModelError, Result};
use crate::route::RouteDefinition;
use routebuilder_context::replace_placeholders;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;

/// 模板参数定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TemplateParameterDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl TemplateParameterDefinition {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            default_value: None,
            required: None,
        }
    }

    pub fn optional(name: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            default_value: Some(default_value.into()),
            required: Some(false),
        }
    }

    /// Parameters are required unless explicitly marked otherwise
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(true)
    }
}

/// How a template-local bean is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BeanSource {
    Class { type_name: String },
    Script { language: String, script: String },
    Supplier { reference: String },
}

/// 模板内的本地 bean 声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TemplateBeanDefinition {
    pub name: String,
    pub source: BeanSource,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// A parameterized route from which concrete routes are instantiated
#[derive(Debug, Clone)]
pub struct RouteTemplateDefinition {
    pub id: String,
    pub description: Option<String>,
    pub parameters: Vec<TemplateParameterDefinition>,
    pub beans: Vec<TemplateBeanDefinition>,
    pub route: RouteDefinition,
}

impl RouteTemplateDefinition {
    pub fn new(id: impl Into<String>, route: RouteDefinition) -> Self {
        Self {
            id: id.into(),
            description: None,
            parameters: Vec::new(),
            beans: Vec::new(),
            route,
        }
    }

    pub fn parameter(mut self, parameter: TemplateParameterDefinition) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn bean(mut self, bean: TemplateBeanDefinition) -> Self {
        self.beans.push(bean);
        self
    }

    /// Supplied values merged over declared defaults.
    ///
    /// Every required parameter without a default must be supplied; all
    /// missing names are reported together.
    pub fn resolve_parameters(
        &self,
        supplied: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>> {
        let missing: Vec<String> = self
            .parameters
            .iter()
            .filter(|p| {
                p.is_required()
                    && p.default_value.is_none()
                    && !supplied.contains_key(&p.name)
            })
            .map(|p| p.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::MissingTemplateParameters {
                template: self.id.clone(),
                parameters: missing,
            });
        }

        let mut merged: BTreeMap<String, String> = self
            .parameters
            .iter()
            .filter_map(|p| p.default_value.clone().map(|v| (p.name.clone(), v)))
            .collect();
        merged.extend(supplied.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(merged)
    }

    /// Creates a fresh route from the template.
    ///
    /// The template tree is deep copied, template parameter tokens are
    /// substituted everywhere in it, and local beans are copied along.
    /// Route configuration ids are left as is; they are resolved later with
    /// the parameters as a local property overlay.
    pub fn instantiate(&self, supplied: &BTreeMap<String, String>) -> Result<RouteDefinition> {
        let parameters = self.resolve_parameters(supplied)?;

        let mut route = self.route.clone();
        route.reset_prepare();
        let mut tree = route.tree().deep_copy();

        let root = tree.root();
        for node in tree.descendants(root) {
            tree.kind_mut(node)
                .for_each_text_mut(&mut |text| *text = substitute(text, &parameters));
            let header = tree.header_mut(node);
            for text in header.id.iter_mut().chain(header.description.iter_mut()) {
                *text = substitute(text, &parameters);
            }
        }
        route.replace_tree(tree);

        if let Some(input) = route.input_mut() {
            input.uri = substitute(&input.uri, &parameters);
        }

        route.local_beans = self
            .beans
            .iter()
            .map(|bean| {
                let mut bean = bean.clone();
                bean.name = substitute(&bean.name, &parameters);
                for value in bean.properties.values_mut() {
                    *value = substitute(value, &parameters);
                }
                bean
            })
            .collect();
        route.template_id = Some(self.id.clone());
        route.template_parameters = parameters;

        tracing::debug!(template = %self.id, nodes = route.tree().len(), "route template instantiated");
        Ok(route)
    }
}

/// Replaces `{{name}}` tokens whose name is a template parameter; all other
/// tokens are left for the context property resolver.
pub fn substitute(text: &str, parameters: &BTreeMap<String, String>) -> String {
    let replaced = replace_placeholders(text, |token| {
        let (key, _) = token.key_and_default();
        Ok::<_, Infallible>(parameters.get(key).cloned())
    });
    match replaced {
        Ok(text) => text,
        Err(never) => match never {},
    }
}
