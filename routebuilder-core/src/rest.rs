use crate::pattern::normalize_uri;
use serde::{Deserialize, Serialize};

/// One HTTP verb of a REST service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VerbDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// REST service whose verbs are turned into routes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RestDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub verbs: Vec<VerbDefinition>,
}

impl RestDefinition {
    /// Uri of the route consuming `verb`, e.g. `rest:get:/users:/{id}`
    pub fn build_from_uri(&self, verb: &VerbDefinition) -> String {
        let path = match (&self.path, &verb.path) {
            (Some(base), Some(sub)) => format!("{base}:{sub}"),
            (Some(base), None) => base.clone(),
            (None, Some(sub)) => sub.clone(),
            (None, None) => String::new(),
        };
        format!("rest:{}:{}", verb.method.to_lowercase(), path)
    }

    /// Most specific verb whose uri prefixes `endpoint_uri`
    pub fn find_verb_definition(&self, endpoint_uri: &str) -> Option<&VerbDefinition> {
        let endpoint_uri = normalize_uri(endpoint_uri);
        let mut found: Option<(&VerbDefinition, usize)> = None;
        for verb in &self.verbs {
            let verb_uri = normalize_uri(&self.build_from_uri(verb));
            let longer = found.map_or(true, |(_, len)| verb_uri.len() > len);
            if endpoint_uri.starts_with(&verb_uri) && longer {
                found = Some((verb, verb_uri.len()));
            }
        }
        found.map(|(verb, _)| verb)
    }
}
