//! Property placeholder resolution.
//!
//! Text may contain `{{key}}`, `{{key:default}}`, `{{?key}}` (empty when the
//! key is absent) and `{{env:NAME}}` / `{{env:NAME:default}}` tokens. Values
//! are themselves resolved, so a property can refer to another property.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

const PREFIX: &str = "{{";
const MAX_NESTING: usize = 32;

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{(\??)([^{}]*)\}\}").expect("placeholder pattern is a valid regex")
    })
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PropertiesError {
    #[error("Property with key [{0}] not found in properties")]
    NotFound(String),

    #[error("Circular reference detected while resolving property [{0}]")]
    Circular(String),

    #[error("Unterminated placeholder in [{0}]")]
    Unterminated(String),
}

/// Placeholder resolver backed by the context's property table
#[derive(Debug, Clone, Default)]
pub struct PropertiesComponent {
    properties: BTreeMap<String, String>,
}

impl PropertiesComponent {
    pub fn new(properties: BTreeMap<String, String>) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Resolves every placeholder in `text` against the context properties
    pub fn resolve(&self, text: &str) -> Result<String, PropertiesError> {
        resolve_text(text, &|key| self.get(key).map(str::to_string), 0)
    }

    /// Opens a scope where `local` properties shadow the context ones.
    ///
    /// Route template parameters are exposed this way while a route's
    /// configuration ids or intercept patterns are resolved. The overlay is
    /// gone once the scope is dropped.
    pub fn local_scope<'a>(
        &'a self,
        local: &'a BTreeMap<String, String>,
    ) -> PropertyScope<'a> {
        PropertyScope {
            component: self,
            local,
        }
    }
}

/// Borrowed view of the context properties with a local overlay on top
#[derive(Debug, Clone, Copy)]
pub struct PropertyScope<'a> {
    component: &'a PropertiesComponent,
    local: &'a BTreeMap<String, String>,
}

impl PropertyScope<'_> {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.local
            .get(key)
            .map(String::as_str)
            .or_else(|| self.component.get(key))
    }

    pub fn resolve(&self, text: &str) -> Result<String, PropertiesError> {
        resolve_text(text, &|key| self.get(key).map(str::to_string), 0)
    }
}

/// One `{{...}}` token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// `{{?key}}` form
    pub optional: bool,
    /// Token body without the `?` marker, e.g. `key:default` or `env:NAME`
    pub body: &'a str,
}

impl<'a> Placeholder<'a> {
    /// Key and default value, split at the first `:`
    pub fn key_and_default(&self) -> (&'a str, Option<&'a str>) {
        split_default(self.body)
    }
}

/// Whether `text` contains at least one placeholder token
pub fn has_placeholder(text: &str) -> bool {
    placeholder_regex().is_match(text)
}

/// Whether `text` has a `{{` that no `}}` closes
pub fn has_unterminated_placeholder(text: &str) -> bool {
    let mut last = 0;
    for token in placeholder_regex().find_iter(text) {
        if text[last..token.start()].contains(PREFIX) {
            return true;
        }
        last = token.end();
    }
    text[last..].contains(PREFIX)
}

/// Rewrites every placeholder token of `text` with what `replace` returns.
///
/// `Ok(None)` keeps the token as written. Unterminated `{{` is plain text
/// here; callers that must reject it check [`has_unterminated_placeholder`].
pub fn replace_placeholders<E>(
    text: &str,
    mut replace: impl FnMut(Placeholder<'_>) -> Result<Option<String>, E>,
) -> Result<String, E> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in placeholder_regex().captures_iter(text) {
        let (Some(whole), Some(marker), Some(body)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        let token = Placeholder {
            optional: !marker.as_str().is_empty(),
            body: body.as_str(),
        };
        match replace(token)? {
            Some(value) => out.push_str(&value),
            None => out.push_str(whole.as_str()),
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn resolve_text(
    text: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    depth: usize,
) -> Result<String, PropertiesError> {
    if !text.contains(PREFIX) {
        return Ok(text.to_string());
    }
    if has_unterminated_placeholder(text) {
        return Err(PropertiesError::Unterminated(text.to_string()));
    }
    replace_placeholders(text, |token| resolve_token(token, lookup, depth).map(Some))
}

fn resolve_token(
    token: Placeholder<'_>,
    lookup: &dyn Fn(&str) -> Option<String>,
    depth: usize,
) -> Result<String, PropertiesError> {
    let (key, default, value) = if let Some(env) = token.body.strip_prefix("env:") {
        let (name, default) = split_default(env);
        let value = std::env::var(name).ok();
        (token.body, default, value)
    } else {
        let (key, default) = token.key_and_default();
        (key, default, lookup(key))
    };

    match value {
        Some(value) => {
            if depth >= MAX_NESTING {
                return Err(PropertiesError::Circular(key.to_string()));
            }
            resolve_text(&value, lookup, depth + 1)
        }
        None => match default {
            Some(default) => Ok(default.to_string()),
            None if token.optional => Ok(String::new()),
            None => Err(PropertiesError::NotFound(key.to_string())),
        },
    }
}

fn split_default(token: &str) -> (&str, Option<&str>) {
    match token.split_once(':') {
        Some((key, default)) => (key, Some(default)),
        None => (token, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component() -> PropertiesComponent {
        let mut props = BTreeMap::new();
        props.insert("greeting".to_string(), "hello".to_string());
        props.insert("target".to_string(), "{{greeting}}-world".to_string());
        props.insert("loop".to_string(), "{{loop}}".to_string());
        PropertiesComponent::new(props)
    }

    #[test]
    fn test_resolves_plain_and_nested_keys() {
        let props = component();
        assert_eq!(props.resolve("say {{greeting}}").unwrap(), "say hello");
        assert_eq!(props.resolve("{{target}}").unwrap(), "hello-world");
        assert_eq!(props.resolve("no tokens").unwrap(), "no tokens");
    }

    #[test]
    fn test_defaults_and_optional_keys() {
        let props = component();
        assert_eq!(props.resolve("{{missing:fallback}}").unwrap(), "fallback");
        assert_eq!(props.resolve("a{{?missing}}b").unwrap(), "ab");
        assert_eq!(
            props.resolve("{{missing}}"),
            Err(PropertiesError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_circular_reference_is_reported() {
        let props = component();
        assert!(matches!(
            props.resolve("{{loop}}"),
            Err(PropertiesError::Circular(_))
        ));
    }

    #[test]
    fn test_unterminated_placeholder() {
        let props = component();
        assert!(matches!(
            props.resolve("{{greeting"),
            Err(PropertiesError::Unterminated(_))
        ));
    }

    #[test]
    fn test_local_scope_shadows_context_properties() {
        let props = component();
        let mut local = BTreeMap::new();
        local.insert("greeting".to_string(), "hi".to_string());
        {
            let scope = props.local_scope(&local);
            assert_eq!(scope.resolve("{{greeting}}").unwrap(), "hi");
            assert_eq!(scope.resolve("{{target}}").unwrap(), "hi-world");
        }
        assert_eq!(props.resolve("{{greeting}}").unwrap(), "hello");
    }

    #[test]
    fn test_env_default() {
        let props = component();
        assert_eq!(
            props
                .resolve("{{env:ROUTEBUILDER_SURELY_UNSET_VAR:none}}")
                .unwrap(),
            "none"
        );
    }

    #[test]
    fn test_has_placeholder() {
        assert!(has_placeholder("direct:{{name}}"));
        assert!(!has_placeholder("direct:name"));
        assert!(!has_placeholder("{{open"));
    }

    #[test]
    fn test_unterminated_detection() {
        assert!(has_unterminated_placeholder("{{open"));
        assert!(has_unterminated_placeholder("{{a}} then {{b"));
        assert!(has_unterminated_placeholder("{{a{{b}}"));
        assert!(!has_unterminated_placeholder("{{a}}{{b}}"));
        assert!(!has_unterminated_placeholder("plain"));
        let props = component();
        assert!(matches!(
            props.resolve("{{greeting}} {{target"),
            Err(PropertiesError::Unterminated(_))
        ));
    }

    #[test]
    fn test_replace_placeholders_keeps_unknown_tokens() {
        let replaced: Result<String, PropertiesError> =
            replace_placeholders("a{{x}}b{{?y:1}}c{{z", |token| {
                Ok(match token.key_and_default() {
                    ("x", _) => Some("X".to_string()),
                    ("y", default) if token.optional => default.map(str::to_string),
                    _ => None,
                })
            });
        assert_eq!(replaced.unwrap(), "aXb1c{{z");
    }
}
