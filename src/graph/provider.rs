//! Configuration history stored as RDF in a configuration graph

use super::{ConfigurationHistory, GraphConfiguration, GraphConfigurationProvider, GraphRole};
use crate::error::Result;
use crate::sparql::{ParameterizedQuery, ResultProjector, TypedBinding};
use crate::store::TripleStore;
use crate::vocab::registry;
use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use strum::IntoEnumIterator;

const CONFIGURATION_QUERY: &str = r#"
SELECT ?config ?start ?predicate ?graph
@from
WHERE {
    ?config a @configurationType ;
            @startDateTime ?start .
    OPTIONAL {
        ?config ?predicate ?graph .
        @rolePredicates
    }
}
"#;

/// Reads `MetadataGraphConfiguration` entities out of one named graph.
///
/// Nothing is cached here; every lookup reads the store again.
pub struct StoreConfigurationProvider<S> {
    store: S,
    configuration_graph: String,
}

impl<S: TripleStore> StoreConfigurationProvider<S> {
    pub fn new(store: S, configuration_graph: impl Into<String>) -> Self {
        Self {
            store,
            configuration_graph: configuration_graph.into(),
        }
    }

    pub fn configuration_graph(&self) -> &str {
        &self.configuration_graph
    }

    fn load(&self) -> Result<Vec<GraphConfiguration>> {
        let query = ParameterizedQuery::select(CONFIGURATION_QUERY)
            .graphs("from", [self.configuration_graph.as_str()])
            .uri("configurationType", registry::METADATA_GRAPH_CONFIGURATION)
            .uri("startDateTime", registry::HAS_START_DATE_TIME)
            .values("rolePredicates", "predicate", GraphRole::iter().map(|r| r.predicate()))
            .build()?;

        let rows = self.store.select(&query)?;
        let mut configurations: IndexMap<String, GraphConfiguration> = IndexMap::new();

        for (config_id, rows) in ResultProjector::group_by(&rows, "config") {
            let Some(start) = rows
                .iter()
                .find_map(|row| row.value("start"))
                .and_then(parse_start_date_time)
            else {
                tracing::warn!(config_id = %config_id, "skipping graph configuration without a valid start time");
                continue;
            };

            let mut configuration = GraphConfiguration::new(config_id.clone(), start);
            for row in rows {
                let binding = TypedBinding::new(row);
                let (Ok(Some(predicate)), Ok(Some(graph))) =
                    (binding.get_iri_opt("predicate"), binding.get_iri_opt("graph"))
                else {
                    continue;
                };
                if let Some(role) = GraphRole::from_predicate(&predicate) {
                    configuration.add_graph(role, graph);
                }
            }
            configurations.insert(config_id, configuration);
        }

        tracing::debug!(
            configuration_graph = %self.configuration_graph,
            count = configurations.len(),
            "loaded graph configurations"
        );
        Ok(configurations.into_values().collect())
    }
}

impl<S: TripleStore> GraphConfigurationProvider for StoreConfigurationProvider<S> {
    fn history(&self) -> Result<ConfigurationHistory> {
        Ok(ConfigurationHistory::from_unordered(self.load()?))
    }
}

/// Parse `xsd:dateTime` text; values without an offset are read as UTC.
pub fn parse_start_date_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
