// =============================================================================
// Type-Safe SPARQL Bindings
// =============================================================================
// Store-independent result rows and typed accessors over them

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when extracting typed bindings
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindingError {
    #[error("Variable '{0}' not found in bindings")]
    NotFound(String),

    #[error("Expected {expected} for '{var}', got {actual}")]
    TypeMismatch {
        var: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to convert '{var}' to {target_type}: {reason}")]
    ConversionFailed {
        var: String,
        target_type: String,
        reason: String,
    },
}

/// Typed value of one bound variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    #[serde(rename = "uri")]
    IRI(String),
    Literal(String),
    TypedLiteral { value: String, datatype: String },
    LangLiteral { value: String, language: String },
    BlankNode(String),
}

impl TypedValue {
    pub fn iri(value: impl Into<String>) -> Self {
        TypedValue::IRI(value.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        TypedValue::Literal(value.into())
    }

    /// Lexical form, IRI text or blank node label
    pub fn as_str(&self) -> &str {
        match self {
            TypedValue::IRI(s)
            | TypedValue::Literal(s)
            | TypedValue::TypedLiteral { value: s, .. }
            | TypedValue::LangLiteral { value: s, .. }
            | TypedValue::BlankNode(s) => s,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, TypedValue::IRI(_))
    }

    pub fn language(&self) -> Option<&str> {
        match self {
            TypedValue::LangLiteral { language, .. } => Some(language),
            _ => None,
        }
    }

    fn type_name(&self) -> String {
        match self {
            TypedValue::IRI(_) => "IRI".to_string(),
            TypedValue::BlankNode(_) => "BlankNode".to_string(),
            TypedValue::Literal(_) => "Literal".to_string(),
            TypedValue::TypedLiteral { datatype, .. } => format!("Literal<{}>", datatype),
            TypedValue::LangLiteral { language, .. } => format!("Literal@{}", language),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// QueryRow
// =============================================================================

/// One solution of a SELECT query: variable name to bound value.
///
/// Unbound variables are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRow {
    bindings: IndexMap<String, TypedValue>,
}

impl QueryRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for stores and tests
    pub fn with(mut self, var: &str, value: TypedValue) -> Self {
        self.insert(var, value);
        self
    }

    pub fn insert(&mut self, var: &str, value: TypedValue) {
        self.bindings.insert(var.trim_start_matches(['?', '$']).to_string(), value);
    }

    pub fn get(&self, var: &str) -> Option<&TypedValue> {
        self.bindings.get(var)
    }

    /// Lexical value of a bound variable
    pub fn value(&self, var: &str) -> Option<&str> {
        self.get(var).map(TypedValue::as_str)
    }

    pub fn contains(&self, var: &str) -> bool {
        self.bindings.contains_key(var)
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<(String, TypedValue)> for QueryRow {
    fn from_iter<I: IntoIterator<Item = (String, TypedValue)>>(iter: I) -> Self {
        let mut row = QueryRow::new();
        for (var, value) in iter {
            row.insert(&var, value);
        }
        row
    }
}

// =============================================================================
// TypedBinding
// =============================================================================

/// Type-safe binding extractor for a query row
pub struct TypedBinding<'a> {
    row: &'a QueryRow,
}

impl<'a> TypedBinding<'a> {
    pub fn new(row: &'a QueryRow) -> Self {
        Self { row }
    }

    pub fn get_value(&self, var: &str) -> Result<&'a TypedValue, BindingError> {
        self.row
            .get(var)
            .ok_or_else(|| BindingError::NotFound(var.to_string()))
    }

    /// Extract IRI as string
    pub fn get_iri(&self, var: &str) -> Result<String, BindingError> {
        match self.get_value(var)? {
            TypedValue::IRI(iri) => Ok(iri.clone()),
            other => Err(BindingError::TypeMismatch {
                var: var.to_string(),
                expected: "IRI".to_string(),
                actual: other.type_name(),
            }),
        }
    }

    /// Extract optional IRI
    pub fn get_iri_opt(&self, var: &str) -> Result<Option<String>, BindingError> {
        match self.row.get(var) {
            None => Ok(None),
            Some(_) => self.get_iri(var).map(Some),
        }
    }

    /// Extract literal lexical form, whatever its datatype or language
    pub fn get_literal(&self, var: &str) -> Result<String, BindingError> {
        match self.get_value(var)? {
            TypedValue::Literal(value)
            | TypedValue::TypedLiteral { value, .. }
            | TypedValue::LangLiteral { value, .. } => Ok(value.clone()),
            other => Err(BindingError::TypeMismatch {
                var: var.to_string(),
                expected: "Literal".to_string(),
                actual: other.type_name(),
            }),
        }
    }

    /// Extract optional literal
    pub fn get_literal_opt(&self, var: &str) -> Result<Option<String>, BindingError> {
        match self.row.get(var) {
            None => Ok(None),
            Some(_) => self.get_literal(var).map(Some),
        }
    }

    /// Lexical value of any bound term
    pub fn get_string_opt(&self, var: &str) -> Option<String> {
        self.row.value(var).map(str::to_string)
    }

    /// Extract a float/decimal literal
    pub fn get_float(&self, var: &str) -> Result<f64, BindingError> {
        let raw = self.get_literal(var)?;
        raw.trim()
            .parse::<f64>()
            .map_err(|e| BindingError::ConversionFailed {
                var: var.to_string(),
                target_type: "f64".to_string(),
                reason: e.to_string(),
            })
    }

    /// Extract float with default value if unbound or unparsable
    pub fn get_float_or(&self, var: &str, default: f64) -> f64 {
        self.get_float(var).unwrap_or(default)
    }

    /// Extract boolean
    pub fn get_boolean(&self, var: &str) -> Result<bool, BindingError> {
        match self.get_literal(var)?.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(BindingError::ConversionFailed {
                var: var.to_string(),
                target_type: "bool".to_string(),
                reason: format!("Invalid boolean value: {}", other),
            }),
        }
    }
}
