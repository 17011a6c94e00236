use serde::{Deserialize, Serialize};
use std::fmt;

/// Language-agnostic expression: a language name plus the expression text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExpressionDefinition {
    pub language: String,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<bool>,
}

impl ExpressionDefinition {
    pub fn new(language: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            expression: expression.into(),
            result_type: None,
            trim: None,
        }
    }

    pub fn simple(expression: impl Into<String>) -> Self {
        Self::new("simple", expression)
    }

    pub fn constant(value: impl Into<String>) -> Self {
        Self::new("constant", value)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new("header", name)
    }

    pub fn exchange_property(name: impl Into<String>) -> Self {
        Self::new("exchangeProperty", name)
    }

    pub fn body() -> Self {
        Self::new("simple", "${body}")
    }

    pub fn with_result_type(mut self, result_type: impl Into<String>) -> Self {
        self.result_type = Some(result_type.into());
        self
    }
}

impl fmt::Display for ExpressionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{{}}}", self.language, self.expression)
    }
}

/// Expression still being assembled by a fluent builder.
///
/// A node opened without an expression (`split()`, `aggregate()`, `when()`)
/// carries a clause; the clause is bound into the node's expression when the
/// first child is attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressionClause {
    expression_type: Option<ExpressionDefinition>,
}

impl ExpressionClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expression_type(&self) -> Option<&ExpressionDefinition> {
        self.expression_type.as_ref()
    }

    pub fn set_expression_type(&mut self, expression: ExpressionDefinition) {
        self.expression_type = Some(expression);
    }
}

/// Expression slot on a node: either a concrete expression or a pending clause
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpressionHolder {
    expression: Option<ExpressionDefinition>,
    #[serde(skip)]
    clause: Option<ExpressionClause>,
}

impl From<ExpressionDefinition> for ExpressionHolder {
    fn from(expression: ExpressionDefinition) -> Self {
        Self {
            expression: Some(expression),
            clause: None,
        }
    }
}

impl ExpressionHolder {
    /// Holder waiting for a fluent clause to be completed
    pub fn pending() -> Self {
        Self {
            expression: None,
            clause: Some(ExpressionClause::new()),
        }
    }

    /// Concrete expression, falling back to a completed but unbound clause
    pub fn get(&self) -> Option<&ExpressionDefinition> {
        self.expression
            .as_ref()
            .or_else(|| self.clause.as_ref().and_then(|c| c.expression_type()))
    }

    pub fn set(&mut self, expression: ExpressionDefinition) {
        self.expression = Some(expression);
        self.clause = None;
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    pub fn clause_mut(&mut self) -> Option<&mut ExpressionClause> {
        self.clause.as_mut()
    }

    pub fn has_pending_clause(&self) -> bool {
        self.clause.is_some()
    }

    /// Rebinds a completed clause as the concrete expression.
    ///
    /// Returns true when a rebinding happened.
    pub fn bind_clause(&mut self) -> bool {
        let completed = self
            .clause
            .as_ref()
            .is_some_and(|c| c.expression_type().is_some());
        if completed {
            self.expression = self
                .clause
                .take()
                .and_then(|c| c.expression_type);
        }
        completed
    }

    pub(crate) fn expression_text_mut(&mut self) -> Option<&mut String> {
        self.expression.as_mut().map(|e| &mut e.expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_language_braces() {
        assert_eq!(
            ExpressionDefinition::simple("${body} > 5").to_string(),
            "simple{${body} > 5}"
        );
    }

    #[test]
    fn test_clause_binding() {
        let mut holder = ExpressionHolder::pending();
        assert!(!holder.is_set());
        assert!(!holder.bind_clause());

        holder
            .clause_mut()
            .unwrap()
            .set_expression_type(ExpressionDefinition::header("id"));
        assert_eq!(holder.get(), Some(&ExpressionDefinition::header("id")));
        assert!(holder.bind_clause());
        assert!(!holder.has_pending_clause());
        assert_eq!(holder.get(), Some(&ExpressionDefinition::header("id")));
    }

    #[test]
    fn test_holder_serializes_as_plain_expression() {
        let holder = ExpressionHolder::from(ExpressionDefinition::simple("${body}"));
        let json = serde_json::to_value(&holder).unwrap();
        assert_eq!(json["language"], "simple");
        assert_eq!(json["expression"], "${body}");
    }
}
