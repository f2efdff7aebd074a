//! Triple-store query interface
//!
//! The engine never talks to a concrete database directly. Everything goes
//! through [`TripleStore`], which runs a finished [`SparqlQuery`] and hands
//! back store-independent rows or triples.

pub mod oxigraph;

pub use self::oxigraph::OxigraphStore;

use crate::sparql::{QueryRow, SparqlQuery, TypedValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("failed to load data: {0}")]
    Load(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One statement returned by a CONSTRUCT query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: TypedValue,
    pub predicate: String,
    pub object: TypedValue,
}

/// Read-only query capability consumed by every repository.
pub trait TripleStore {
    /// Run a SELECT query.
    fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryRow>, StoreError>;

    /// Run a CONSTRUCT query.
    fn construct(&self, query: &SparqlQuery) -> Result<Vec<Triple>, StoreError>;
}

impl<T: TripleStore + ?Sized> TripleStore for &T {
    fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryRow>, StoreError> {
        (**self).select(query)
    }

    fn construct(&self, query: &SparqlQuery) -> Result<Vec<Triple>, StoreError> {
        (**self).construct(query)
    }
}

impl<T: TripleStore + ?Sized> TripleStore for Arc<T> {
    fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryRow>, StoreError> {
        (**self).select(query)
    }

    fn construct(&self, query: &SparqlQuery) -> Result<Vec<Triple>, StoreError> {
        (**self).construct(query)
    }
}
