//! SPARQL query construction and result handling
//!
//! This module provides:
//! - SPARQL injection prevention (IRI validation, literal escaping)
//! - Parameterized query templates with graph-set substitution
//! - Store-independent typed result rows
//! - Projection of flat rows into entities

// Security and injection prevention
pub mod injection_prevention;

pub mod query_builder;
pub mod result_mapper;
pub mod typed_binding;

pub use injection_prevention::{IriValidator, SafeLiteralBuilder, SparqlSanitizer, SparqlSecurityError};
pub use query_builder::{ParameterizedQuery, QueryKind, SparqlQuery};
pub use result_mapper::ResultProjector;
pub use typed_binding::{BindingError, QueryRow, TypedBinding, TypedValue};

/// SPARQL security result type
pub type SparqlSecurityResult<T> = Result<T, SparqlSecurityError>;
