//! In-memory [`TripleStore`] backed by oxigraph

use super::{StoreError, Triple, TripleStore};
use crate::graph::management::GraphManagementRepository;
use crate::sparql::{QueryKind, QueryRow, SparqlQuery, TypedValue};
use oxigraph::io::RdfFormat;
use oxigraph::model::{NamedNode, Term};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use std::path::Path;
use std::time::Instant;

pub struct OxigraphStore {
    store: Store,
}

impl OxigraphStore {
    pub fn new() -> Result<Self, StoreError> {
        let store = Store::new().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { store })
    }

    /// Load RDF text in the given format.
    pub fn load_str(&self, format: RdfFormat, content: &str) -> Result<(), StoreError> {
        self.store
            .load_from_reader(format, content.as_bytes())
            .map_err(|e| StoreError::Load(e.to_string()))
    }

    /// Load a Turtle, TriG, N-Triples or N-Quads file, picking the format
    /// from the file extension.
    pub fn load_file(&self, path: &Path) -> Result<(), StoreError> {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(RdfFormat::from_extension)
            .ok_or_else(|| {
                StoreError::Load(format!("unknown RDF format for {}", path.display()))
            })?;

        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Load(format!("{}: {}", path.display(), e)))?;

        self.load_str(format, &content)?;
        tracing::info!(path = %path.display(), ?format, "loaded RDF file");
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.store
            .len()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn check_kind(query: &SparqlQuery, expected: QueryKind) -> Result<(), StoreError> {
        if query.kind() != expected {
            return Err(StoreError::Query(format!(
                "expected a {:?} query, got {:?}",
                expected,
                query.kind()
            )));
        }
        Ok(())
    }
}

impl TripleStore for OxigraphStore {
    fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryRow>, StoreError> {
        let start = Instant::now();

        Self::check_kind(query, QueryKind::Select)?;

        #[allow(deprecated)]
        let results = self
            .store
            .query(query.as_str())
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let rows = match results {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| StoreError::Query(e.to_string()))?;
                    let row: QueryRow = solution
                        .iter()
                        .map(|(var, term)| (var.as_str().to_string(), term_to_typed_value(term)))
                        .collect();
                    rows.push(row);
                }
                rows
            }
            _ => return Err(StoreError::Query("query did not return solutions".to_string())),
        };

        tracing::debug!(
            query_len = query.len(),
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "select executed"
        );
        Ok(rows)
    }

    fn construct(&self, query: &SparqlQuery) -> Result<Vec<Triple>, StoreError> {
        let start = Instant::now();

        Self::check_kind(query, QueryKind::Construct)?;

        #[allow(deprecated)]
        let results = self
            .store
            .query(query.as_str())
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let triples = match results {
            QueryResults::Graph(graph) => {
                let mut triples = Vec::new();
                for triple in graph {
                    let triple = triple.map_err(|e| StoreError::Query(e.to_string()))?;
                    let subject: Term = triple.subject.into();
                    triples.push(Triple {
                        subject: term_to_typed_value(&subject),
                        predicate: triple.predicate.as_str().to_string(),
                        object: term_to_typed_value(&triple.object),
                    });
                }
                triples
            }
            _ => return Err(StoreError::Query("query did not return a graph".to_string())),
        };

        tracing::debug!(
            query_len = query.len(),
            triples = triples.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "construct executed"
        );
        Ok(triples)
    }
}

impl GraphManagementRepository for OxigraphStore {
    fn named_graphs(&self) -> Result<Vec<String>, StoreError> {
        let mut graphs = Vec::new();
        for graph in self.store.named_graphs() {
            let graph = graph.map_err(|e| StoreError::Unavailable(e.to_string()))?;
            let term: Term = graph.into();
            if let Term::NamedNode(node) = term {
                graphs.push(node.as_str().to_string());
            }
        }
        graphs.sort();
        Ok(graphs)
    }

    fn remove_graph(&self, graph: &str) -> Result<(), StoreError> {
        let node = NamedNode::new(graph).map_err(|e| StoreError::Query(e.to_string()))?;
        self.store
            .remove_named_graph(node.as_ref())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

/// Convert an oxigraph term into a store-independent value
fn term_to_typed_value(term: &Term) -> TypedValue {
    match term {
        Term::NamedNode(node) => TypedValue::IRI(node.as_str().to_string()),
        Term::BlankNode(node) => TypedValue::BlankNode(node.as_str().to_string()),
        Term::Literal(lit) => {
            let value = lit.value().to_string();
            if let Some(language) = lit.language() {
                return TypedValue::LangLiteral {
                    value,
                    language: language.to_string(),
                };
            }

            match lit.datatype().as_str() {
                "http://www.w3.org/2001/XMLSchema#string" => TypedValue::Literal(value),
                datatype => TypedValue::TypedLiteral {
                    value,
                    datatype: datatype.to_string(),
                },
            }
        }
        #[allow(unreachable_patterns)]
        other => TypedValue::Literal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::ParameterizedQuery;

    const DATA: &str = r#"
        @prefix ex: <http://example.org/> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        ex:a rdfs:label "A"@en ; ex:count 3 ; ex:next ex:b .
    "#;

    fn store() -> OxigraphStore {
        let store = OxigraphStore::new().unwrap();
        store.load_str(RdfFormat::Turtle, DATA).unwrap();
        store
    }

    #[test]
    fn select_converts_terms() {
        let store = store();
        let query = ParameterizedQuery::select("SELECT ?p ?o WHERE { @s ?p ?o }")
            .uri("s", "http://example.org/a")
            .build()
            .unwrap();

        let rows = store.select(&query).unwrap();
        assert_eq!(rows.len(), 3);

        let values: Vec<_> = rows.iter().filter_map(|row| row.get("o")).cloned().collect();
        assert!(values.contains(&TypedValue::LangLiteral {
            value: "A".into(),
            language: "en".into()
        }));
        assert!(values.contains(&TypedValue::iri("http://example.org/b")));
        assert!(values.contains(&TypedValue::TypedLiteral {
            value: "3".into(),
            datatype: "http://www.w3.org/2001/XMLSchema#integer".into()
        }));
    }

    #[test]
    fn construct_returns_triples() {
        let store = store();
        let query = ParameterizedQuery::construct("CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p ?o }")
            .build()
            .unwrap();
        let triples = store.construct(&query).unwrap();
        assert_eq!(triples.len(), 3);
    }

    #[test]
    fn query_kind_mismatch_is_rejected() {
        let store = store();
        let query = ParameterizedQuery::construct("CONSTRUCT WHERE { ?s ?p ?o }")
            .build()
            .unwrap();
        assert!(matches!(store.select(&query), Err(StoreError::Query(_))));
    }

    #[test]
    fn malformed_sparql_is_a_query_error() {
        let store = store();
        let query = ParameterizedQuery::select("SELECT WHERE {").build().unwrap();
        assert!(matches!(store.select(&query), Err(StoreError::Query(_))));
    }

    #[test]
    fn named_graphs_can_be_removed() {
        let store = OxigraphStore::new().unwrap();
        store
            .load_str(
                RdfFormat::TriG,
                "<http://g/1> { <http://s> <http://p> <http://o> . }\n<http://g/2> { <http://s> <http://p> <http://o> . }",
            )
            .unwrap();

        assert_eq!(store.named_graphs().unwrap(), vec!["http://g/1", "http://g/2"]);
        store.remove_graph("http://g/1").unwrap();
        assert_eq!(store.named_graphs().unwrap(), vec!["http://g/2"]);
    }
}
