//! Validation of candidate resources against stored data
//!
//! Findings are returned as values, never raised: a [`ValidationSeverity::Violation`]
//! blocks saving, an [`ValidationSeverity::Info`] is advisory.

pub mod duplicates;

pub use duplicates::{DuplicateResult, DuplicateValidator, IdentifierRepository, VersionRecord, DEFAULT_MAX_DEPTH};

use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
pub enum ValidationSeverity {
    Info,
    Warning,
    Violation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultType {
    Duplicate,
}

/// One finding about one property value of one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResultProperty {
    /// Entity that owns the property
    pub node: String,
    /// Property predicate
    pub path: String,
    pub value: String,
    pub message: String,
    pub severity: ValidationSeverity,
    pub result_type: ResultType,
}

impl ValidationResultProperty {
    pub fn duplicate(
        node: impl Into<String>,
        path: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
        severity: ValidationSeverity,
    ) -> Self {
        Self {
            node: node.into(),
            path: path.into(),
            value: value.into(),
            message: message.into(),
            severity,
            result_type: ResultType::Duplicate,
        }
    }

    pub fn is_violation(&self) -> bool {
        self.severity == ValidationSeverity::Violation
    }
}

/// True when any finding blocks saving
pub fn has_violations(results: &[ValidationResultProperty]) -> bool {
    results.iter().any(ValidationResultProperty::is_violation)
}
