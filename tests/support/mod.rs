#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use registry_graph::graph::{ConfigurationHistory, GraphConfiguration, GraphRole};
use registry_graph::sparql::{QueryRow, SparqlQuery, TypedValue};
use registry_graph::store::{StoreError, Triple, TripleStore};

pub const CONFIG_ID: &str = "https://pid.example.org/config/1";
pub const METADATA_GRAPH: &str = "https://pid.example.org/graph/metadata";
pub const SHACL_GRAPH: &str = "https://pid.example.org/graph/shacl";
pub const ONTOLOGY_GRAPH: &str = "https://pid.example.org/graph/ontology";

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Single configuration over the fixture graphs
pub fn history() -> ConfigurationHistory {
    ConfigurationHistory::from_unordered(vec![
        GraphConfiguration::new(CONFIG_ID, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())
            .with_graph(GraphRole::Metadata, METADATA_GRAPH)
            .with_graph(GraphRole::ShapeConstraints, SHACL_GRAPH)
            .with_graph(GraphRole::EnterpriseOntology, ONTOLOGY_GRAPH),
    ])
}

struct Rule {
    needles: Vec<String>,
    rows: Vec<QueryRow>,
}

/// Answers each query with the rows of the first rule whose needles all
/// occur in the query text, and records every query it receives.
#[derive(Default)]
pub struct ScriptedStore {
    rules: Vec<Rule>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, needles: &[&str], rows: Vec<QueryRow>) -> Self {
        self.rules.push(Rule {
            needles: needles.iter().map(|n| n.to_string()).collect(),
            rows,
        });
        self
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

impl TripleStore for ScriptedStore {
    fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryRow>, StoreError> {
        let text = query.as_str();
        self.queries.lock().push(text.to_string());
        Ok(self
            .rules
            .iter()
            .find(|rule| rule.needles.iter().all(|needle| text.contains(needle.as_str())))
            .map(|rule| rule.rows.clone())
            .unwrap_or_default())
    }

    fn construct(&self, query: &SparqlQuery) -> Result<Vec<Triple>, StoreError> {
        self.queries.lock().push(query.as_str().to_string());
        Ok(Vec::new())
    }
}

/// Fails every query
pub struct DownStore;

impl TripleStore for DownStore {
    fn select(&self, _query: &SparqlQuery) -> Result<Vec<QueryRow>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn construct(&self, _query: &SparqlQuery) -> Result<Vec<Triple>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

// =============================================================================
// Row builders
// =============================================================================

pub fn iri(value: &str) -> TypedValue {
    TypedValue::iri(value)
}

pub fn lit(value: &str) -> TypedValue {
    TypedValue::literal(value)
}

/// One row of a schema query for a shape node
pub fn shape_row(shape: &str, predicate: &str, value: TypedValue) -> QueryRow {
    QueryRow::new()
        .with("shape", TypedValue::BlankNode(shape.into()))
        .with("shapeProperty", iri(predicate))
        .with("shapeValue", value)
}

pub fn spo(subject: &str, predicate: &str, object: TypedValue) -> QueryRow {
    QueryRow::new()
        .with("subject", iri(subject))
        .with("predicate", iri(predicate))
        .with("object", object)
}
