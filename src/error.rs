//! Error taxonomy for the registry graph engine
//!
//! This module provides:
//! - `RegistryError`, the error returned by every public operation
//! - `ErrorCode`, a stable numeric code with a metrics category
//! - conversions from query-safety and store failures
//!
//! Ambiguous source data (shape groups without a path, duplicate keys) is
//! never an error: it is logged and surfaced as a `SchemaNotice` instead.

use crate::sparql::SparqlSecurityError;
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Stable error codes for callers that translate errors into responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    /// An input expected to be an absolute URI failed validation
    InvalidFormat = -32001,
    /// A configuration, type or taxonomy does not exist
    EntityNotFound = -32002,
    /// A graph is still referenced and cannot be removed
    GraphReferenced = -32003,
    /// The triple store could not execute a query
    StoreUnavailable = -32004,
    /// Process configuration is invalid
    Configuration = -32005,
}

impl ErrorCode {
    /// Get the integer code
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Check if this error type is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::StoreUnavailable)
    }

    /// Get the error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::InvalidFormat => "client_error",
            ErrorCode::EntityNotFound => "resource_not_found",
            ErrorCode::GraphReferenced => "conflict",
            ErrorCode::StoreUnavailable => "store_error",
            ErrorCode::Configuration => "configuration_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

// =============================================================================
// REGISTRY ERROR
// =============================================================================

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid format for '{value}': {reason}")]
    InvalidFormat { value: String, reason: String },

    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: &'static str, id: String },

    #[error("Graph {0} is referenced by a graph configuration")]
    GraphReferenced(String),

    #[error("Triple store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

impl RegistryError {
    pub fn invalid_format(value: impl Into<String>, reason: impl Into<String>) -> Self {
        RegistryError::InvalidFormat {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        RegistryError::EntityNotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            RegistryError::EntityNotFound { .. } => ErrorCode::EntityNotFound,
            RegistryError::GraphReferenced(_) => ErrorCode::GraphReferenced,
            RegistryError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            RegistryError::Configuration(_) => ErrorCode::Configuration,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::EntityNotFound { .. })
    }
}

impl From<SparqlSecurityError> for RegistryError {
    fn from(error: SparqlSecurityError) -> Self {
        match error {
            SparqlSecurityError::InvalidIri(value)
            | SparqlSecurityError::InvalidScheme(value)
            | SparqlSecurityError::RelativeUri(value) => {
                RegistryError::invalid_format(value, "expected an absolute URI")
            }
            SparqlSecurityError::InvalidLanguageTag(value) => {
                RegistryError::invalid_format(value, "expected a BCP 47 language tag")
            }
            SparqlSecurityError::InvalidLiteral(value) => {
                RegistryError::invalid_format(value, "literal cannot be embedded in a query")
            }
            SparqlSecurityError::UnboundParameter(name) => {
                RegistryError::invalid_format(name, "query parameter was never bound")
            }
        }
    }
}
