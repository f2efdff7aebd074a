//! Named graph overview and guarded deletion

use super::GraphConfigurationProvider;
use crate::error::{RegistryError, Result};
use crate::sparql::IriValidator;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Store-level graph operations
pub trait GraphManagementRepository {
    /// Every named graph IRI in the store
    fn named_graphs(&self) -> std::result::Result<Vec<String>, StoreError>;

    fn remove_graph(&self, graph: &str) -> std::result::Result<(), StoreError>;
}

impl<T: GraphManagementRepository + ?Sized> GraphManagementRepository for &T {
    fn named_graphs(&self) -> std::result::Result<Vec<String>, StoreError> {
        (**self).named_graphs()
    }

    fn remove_graph(&self, graph: &str) -> std::result::Result<(), StoreError> {
        (**self).remove_graph(graph)
    }
}

impl<T: GraphManagementRepository + ?Sized> GraphManagementRepository for std::sync::Arc<T> {
    fn named_graphs(&self) -> std::result::Result<Vec<String>, StoreError> {
        (**self).named_graphs()
    }

    fn remove_graph(&self, graph: &str) -> std::result::Result<(), StoreError> {
        (**self).remove_graph(graph)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum GraphStatus {
    /// Used by the current configuration
    Active,
    /// Only used by older configurations
    Historic,
    Unreferenced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphOverview {
    pub name: String,
    pub status: GraphStatus,
    /// Start of the configuration that references the graph
    pub start_date_time: Option<DateTime<Utc>>,
}

pub struct GraphManager<R, P> {
    repository: R,
    provider: P,
    configuration_graph: Option<String>,
}

impl<R, P> GraphManager<R, P>
where
    R: GraphManagementRepository,
    P: GraphConfigurationProvider,
{
    pub fn new(repository: R, provider: P) -> Self {
        Self {
            repository,
            provider,
            configuration_graph: None,
        }
    }

    /// The graph holding configurations is always active.
    pub fn with_configuration_graph(mut self, graph: impl Into<String>) -> Self {
        self.configuration_graph = Some(graph.into());
        self
    }

    /// Classify every named graph in the store.
    pub fn graphs(&self) -> Result<Vec<GraphOverview>> {
        let names = self.repository.named_graphs()?;
        let history = self.provider.history()?;
        let current = history.current();

        let overview = names
            .into_iter()
            .map(|name| {
                let in_current = current.is_some_and(|c| c.references(&name));
                let is_configuration_graph = self.configuration_graph.as_deref() == Some(name.as_str());

                if in_current || is_configuration_graph {
                    let start_date_time = current.map(|c| c.start_date_time);
                    return GraphOverview {
                        name,
                        status: GraphStatus::Active,
                        start_date_time,
                    };
                }

                match history.historic().find(|c| c.references(&name)) {
                    Some(historic) => GraphOverview {
                        name,
                        status: GraphStatus::Historic,
                        start_date_time: Some(historic.start_date_time),
                    },
                    None => GraphOverview {
                        name,
                        status: GraphStatus::Unreferenced,
                        start_date_time: None,
                    },
                }
            })
            .collect();

        Ok(overview)
    }

    /// Delete a graph that no configuration references.
    pub fn delete_graph(&self, graph: &str) -> Result<()> {
        IriValidator::require_absolute(graph)?;

        let overview = self.graphs()?;
        let entry = overview
            .iter()
            .find(|g| g.name == graph)
            .ok_or_else(|| RegistryError::not_found("graph", graph))?;

        if entry.status != GraphStatus::Unreferenced {
            return Err(RegistryError::GraphReferenced(graph.to_string()));
        }

        self.repository.remove_graph(graph)?;
        tracing::info!(graph, "deleted unreferenced graph");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConfigurationHistory, GraphConfiguration, GraphRole};
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use parking_lot::Mutex;

    struct FakeGraphs {
        graphs: Mutex<Vec<String>>,
    }

    impl FakeGraphs {
        fn new(graphs: &[&str]) -> Self {
            Self {
                graphs: Mutex::new(graphs.iter().map(|g| g.to_string()).collect()),
            }
        }
    }

    impl GraphManagementRepository for FakeGraphs {
        fn named_graphs(&self) -> std::result::Result<Vec<String>, StoreError> {
            Ok(self.graphs.lock().clone())
        }

        fn remove_graph(&self, graph: &str) -> std::result::Result<(), StoreError> {
            self.graphs.lock().retain(|g| g != graph);
            Ok(())
        }
    }

    fn history() -> ConfigurationHistory {
        ConfigurationHistory::from_unordered(vec![
            GraphConfiguration::new("urn:config:1", Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
                .with_graph(GraphRole::Metadata, "http://g/metadata/1")
                .with_graph(GraphRole::Metadata, "http://g/shared"),
            GraphConfiguration::new("urn:config:2", Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap())
                .with_graph(GraphRole::Metadata, "http://g/metadata/2")
                .with_graph(GraphRole::ShapeConstraints, "http://g/shared"),
        ])
    }

    fn manager(repo: &FakeGraphs) -> GraphManager<&FakeGraphs, ConfigurationHistory> {
        GraphManager::new(repo, history()).with_configuration_graph("http://g/config")
    }

    #[test]
    fn graphs_are_classified() {
        let repo = FakeGraphs::new(&[
            "http://g/config",
            "http://g/metadata/1",
            "http://g/metadata/2",
            "http://g/orphan",
            "http://g/shared",
        ]);
        let overview = manager(&repo).graphs().unwrap();
        let status: Vec<_> = overview.iter().map(|g| (g.name.as_str(), g.status)).collect();

        assert_eq!(
            status,
            vec![
                ("http://g/config", GraphStatus::Active),
                ("http://g/metadata/1", GraphStatus::Historic),
                ("http://g/metadata/2", GraphStatus::Active),
                ("http://g/orphan", GraphStatus::Unreferenced),
                ("http://g/shared", GraphStatus::Active),
            ]
        );
        assert_eq!(overview[3].start_date_time, None);
    }

    #[test]
    fn delete_requires_unreferenced_graph() {
        let repo = FakeGraphs::new(&["http://g/metadata/1", "http://g/orphan"]);
        let manager = manager(&repo);

        assert_matches!(
            manager.delete_graph("http://g/metadata/1"),
            Err(RegistryError::GraphReferenced(_))
        );
        assert_matches!(
            manager.delete_graph("http://g/unknown"),
            Err(RegistryError::EntityNotFound { .. })
        );
        assert_matches!(
            manager.delete_graph("not a uri"),
            Err(RegistryError::InvalidFormat { .. })
        );

        manager.delete_graph("http://g/orphan").unwrap();
        assert_eq!(repo.named_graphs().unwrap(), vec!["http://g/metadata/1".to_string()]);
    }
}
