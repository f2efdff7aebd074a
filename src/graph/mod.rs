//! Time-versioned graph configurations and graph selection
//!
//! A [`GraphConfiguration`] maps each [`GraphRole`] to the named graphs that
//! play it. Configurations form an append-only history ordered by start time;
//! the latest one is current and every other one is historic.
//!
//! [`GraphSelector`] resolves "current or explicit id" exactly once and hands
//! out a [`ResolvedGraphs`] value that query builders bind from.

pub mod management;
pub mod provider;

pub use management::{GraphManagementRepository, GraphManager, GraphOverview, GraphStatus};
pub use provider::StoreConfigurationProvider;

use crate::error::{RegistryError, Result};
use crate::sparql::ParameterizedQuery;
use crate::vocab::registry;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

// =============================================================================
// Roles and configurations
// =============================================================================

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GraphRole {
    Metadata,
    ShapeConstraints,
    EnterpriseOntology,
    ConsumerGroup,
}

impl GraphRole {
    /// Predicate linking a stored configuration to graphs of this role
    pub fn predicate(&self) -> &'static str {
        match self {
            GraphRole::Metadata => registry::HAS_METADATA_GRAPH,
            GraphRole::ShapeConstraints => registry::HAS_SHACL_CONSTRAINTS_GRAPH,
            GraphRole::EnterpriseOntology => registry::HAS_ECO_GRAPH,
            GraphRole::ConsumerGroup => registry::HAS_CONSUMER_GROUP_GRAPH,
        }
    }

    pub fn from_predicate(predicate: &str) -> Option<Self> {
        GraphRole::iter().find(|role| role.predicate() == predicate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfiguration {
    pub id: String,
    pub start_date_time: DateTime<Utc>,
    #[serde(default)]
    pub graphs: IndexMap<GraphRole, Vec<String>>,
}

impl GraphConfiguration {
    pub fn new(id: impl Into<String>, start_date_time: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            start_date_time,
            graphs: IndexMap::new(),
        }
    }

    pub fn with_graph(mut self, role: GraphRole, graph: impl Into<String>) -> Self {
        self.add_graph(role, graph);
        self
    }

    pub fn add_graph(&mut self, role: GraphRole, graph: impl Into<String>) {
        let graph = graph.into();
        let graphs = self.graphs.entry(role).or_default();
        if !graphs.contains(&graph) {
            graphs.push(graph);
        }
    }

    /// Graphs for one role; empty when the role is not configured
    pub fn graphs(&self, role: GraphRole) -> &[String] {
        self.graphs.get(&role).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every graph referenced by this configuration, any role
    pub fn all_graphs(&self) -> impl Iterator<Item = &str> {
        self.graphs.values().flatten().map(String::as_str)
    }

    pub fn references(&self, graph: &str) -> bool {
        self.all_graphs().any(|g| g == graph)
    }
}

// =============================================================================
// History
// =============================================================================

/// Append-only configuration history, ordered by start time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationHistory {
    configurations: Vec<GraphConfiguration>,
}

impl ConfigurationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from configurations in any order.
    ///
    /// Configurations are ordered by start time, then id. Of several sharing
    /// a start time only the smallest id is kept; repeated ids keep their
    /// earliest start. Skipped entries are logged.
    pub fn from_unordered(mut configurations: Vec<GraphConfiguration>) -> Self {
        configurations.sort_by(|a, b| {
            a.start_date_time
                .cmp(&b.start_date_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        let mut history = Self::new();
        for configuration in configurations {
            let id = configuration.id.clone();
            if let Err(err) = history.push(configuration) {
                tracing::warn!(config_id = %id, error = %err, "skipping graph configuration");
            }
        }
        history
    }

    /// Append a configuration that starts after the current one.
    pub fn push(&mut self, configuration: GraphConfiguration) -> Result<()> {
        if self.by_id(&configuration.id).is_some() {
            return Err(RegistryError::Configuration(format!(
                "graph configuration {} already exists",
                configuration.id
            )));
        }

        if let Some(current) = self.current() {
            if configuration.start_date_time <= current.start_date_time {
                return Err(RegistryError::Configuration(format!(
                    "graph configuration {} starts at {}, not after current configuration {} ({})",
                    configuration.id,
                    configuration.start_date_time,
                    current.id,
                    current.start_date_time
                )));
            }
        }

        self.configurations.push(configuration);
        Ok(())
    }

    pub fn current(&self) -> Option<&GraphConfiguration> {
        self.configurations.last()
    }

    pub fn by_id(&self, id: &str) -> Option<&GraphConfiguration> {
        self.configurations.iter().find(|c| c.id == id)
    }

    /// Historic configurations, newest first
    pub fn historic(&self) -> impl Iterator<Item = &GraphConfiguration> {
        let historic = self.configurations.len().saturating_sub(1);
        self.configurations[..historic].iter().rev()
    }

    pub fn is_current(&self, id: &str) -> bool {
        self.current().is_some_and(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GraphConfiguration> {
        self.configurations.iter()
    }
}

// =============================================================================
// Provider
// =============================================================================

/// Source of graph configurations.
pub trait GraphConfigurationProvider {
    /// Full history, oldest first
    fn history(&self) -> Result<ConfigurationHistory>;

    fn current_configuration(&self) -> Result<GraphConfiguration> {
        self.history()?
            .current()
            .cloned()
            .ok_or_else(|| RegistryError::not_found("graph configuration", "current"))
    }

    fn configuration_by_id(&self, id: &str) -> Result<GraphConfiguration> {
        self.history()?
            .by_id(id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found("graph configuration", id))
    }

    /// Graphs of one role in the current configuration
    fn graphs_for_role(&self, role: GraphRole) -> Result<Vec<String>> {
        Ok(self.current_configuration()?.graphs(role).to_vec())
    }
}

impl GraphConfigurationProvider for ConfigurationHistory {
    fn history(&self) -> Result<ConfigurationHistory> {
        Ok(self.clone())
    }

    fn current_configuration(&self) -> Result<GraphConfiguration> {
        self.current()
            .cloned()
            .ok_or_else(|| RegistryError::not_found("graph configuration", "current"))
    }

    fn configuration_by_id(&self, id: &str) -> Result<GraphConfiguration> {
        self.by_id(id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found("graph configuration", id))
    }
}

impl<T: GraphConfigurationProvider + ?Sized> GraphConfigurationProvider for &T {
    fn history(&self) -> Result<ConfigurationHistory> {
        (**self).history()
    }

    fn current_configuration(&self) -> Result<GraphConfiguration> {
        (**self).current_configuration()
    }

    fn configuration_by_id(&self, id: &str) -> Result<GraphConfiguration> {
        (**self).configuration_by_id(id)
    }
}

impl<T: GraphConfigurationProvider + ?Sized> GraphConfigurationProvider for std::sync::Arc<T> {
    fn history(&self) -> Result<ConfigurationHistory> {
        (**self).history()
    }

    fn current_configuration(&self) -> Result<GraphConfiguration> {
        (**self).current_configuration()
    }

    fn configuration_by_id(&self, id: &str) -> Result<GraphConfiguration> {
        (**self).configuration_by_id(id)
    }
}

// =============================================================================
// Selector
// =============================================================================

/// A configuration chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGraphs {
    configuration: GraphConfiguration,
    requested_id: Option<String>,
}

impl ResolvedGraphs {
    pub fn new(configuration: GraphConfiguration) -> Self {
        Self {
            configuration,
            requested_id: None,
        }
    }

    pub fn configuration(&self) -> &GraphConfiguration {
        &self.configuration
    }

    pub fn config_id(&self) -> &str {
        &self.configuration.id
    }

    /// Id the caller asked for, `None` when the current one was implied
    pub fn requested_id(&self) -> Option<&str> {
        self.requested_id.as_deref()
    }

    pub fn graphs(&self, role: GraphRole) -> &[String] {
        self.configuration.graphs(role)
    }

    /// Bind the graphs of `role` to a `FROM` placeholder.
    pub fn bind(&self, query: ParameterizedQuery, placeholder: &str, role: GraphRole) -> ParameterizedQuery {
        query.graphs(placeholder, self.graphs(role))
    }
}

pub struct GraphSelector<P> {
    provider: P,
}

impl<P: GraphConfigurationProvider> GraphSelector<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve the configuration for a request.
    ///
    /// `None` and blank ids select the current configuration; an unknown id is
    /// `EntityNotFound`.
    pub fn resolve(&self, config_id: Option<&str>) -> Result<ResolvedGraphs> {
        match config_id.map(str::trim).filter(|id| !id.is_empty()) {
            None => {
                let configuration = self.provider.current_configuration()?;
                tracing::debug!(config_id = %configuration.id, "resolved current graph configuration");
                Ok(ResolvedGraphs::new(configuration))
            }
            Some(id) => {
                let configuration = self.provider.configuration_by_id(id)?;
                tracing::debug!(config_id = %configuration.id, "resolved explicit graph configuration");
                Ok(ResolvedGraphs {
                    configuration,
                    requested_id: Some(id.to_string()),
                })
            }
        }
    }

    /// Graphs of one role for the current or an explicit configuration
    pub fn graphs_for_role(&self, role: GraphRole, config_id: Option<&str>) -> Result<Vec<String>> {
        Ok(self.resolve(config_id)?.graphs(role).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    fn history() -> ConfigurationHistory {
        ConfigurationHistory::from_unordered(vec![
            GraphConfiguration::new("urn:config:2", at(2021))
                .with_graph(GraphRole::Metadata, "urn:graph:metadata:2")
                .with_graph(GraphRole::ShapeConstraints, "urn:graph:shacl:2"),
            GraphConfiguration::new("urn:config:1", at(2020))
                .with_graph(GraphRole::Metadata, "urn:graph:metadata:1"),
        ])
    }

    #[test]
    fn latest_start_time_is_current() {
        let history = history();
        assert_eq!(history.current().unwrap().id, "urn:config:2");
        let historic: Vec<_> = history.historic().map(|c| c.id.as_str()).collect();
        assert_eq!(historic, vec!["urn:config:1"]);
    }

    #[test]
    fn history_is_append_only_in_time() {
        let mut history = history();
        let older = GraphConfiguration::new("urn:config:0", at(2019));
        assert_matches!(history.push(older), Err(RegistryError::Configuration(_)));

        let same_id = GraphConfiguration::new("urn:config:1", at(2030));
        assert_matches!(history.push(same_id), Err(RegistryError::Configuration(_)));

        assert!(history.push(GraphConfiguration::new("urn:config:3", at(2022))).is_ok());
        assert!(history.is_current("urn:config:3"));
    }

    #[test]
    fn equal_start_times_keep_the_smallest_id() {
        let history = ConfigurationHistory::from_unordered(vec![
            GraphConfiguration::new("urn:config:b", at(2021)).with_graph(GraphRole::Metadata, "urn:graph:b"),
            GraphConfiguration::new("urn:config:0", at(2020)),
            GraphConfiguration::new("urn:config:a", at(2021)).with_graph(GraphRole::Metadata, "urn:graph:a"),
        ]);

        assert_eq!(history.len(), 2);
        assert!(history.is_current("urn:config:a"));
        assert_eq!(history.current().unwrap().graphs(GraphRole::Metadata), ["urn:graph:a"]);
        assert!(history.by_id("urn:config:b").is_none());

        let mut strict = ConfigurationHistory::new();
        strict.push(GraphConfiguration::new("urn:config:a", at(2021))).unwrap();
        assert_matches!(
            strict.push(GraphConfiguration::new("urn:config:b", at(2021))),
            Err(RegistryError::Configuration(_))
        );
    }

    #[test]
    fn repeated_ids_keep_the_earliest_start() {
        let history = ConfigurationHistory::from_unordered(vec![
            GraphConfiguration::new("urn:config:1", at(2022)),
            GraphConfiguration::new("urn:config:1", at(2020)),
            GraphConfiguration::new("urn:config:2", at(2021)),
        ]);

        let ids: Vec<_> = history.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["urn:config:1", "urn:config:2"]);
        assert_eq!(history.by_id("urn:config:1").unwrap().start_date_time, at(2020));
    }

    #[test]
    fn selector_resolves_current_for_none_and_blank() {
        let selector = GraphSelector::new(history());
        for id in [None, Some(""), Some("   ")] {
            let resolved = selector.resolve(id).unwrap();
            assert_eq!(resolved.config_id(), "urn:config:2");
            assert_eq!(resolved.requested_id(), None);
        }
    }

    #[test]
    fn selector_resolves_explicit_id() {
        let selector = GraphSelector::new(history());
        let graphs = selector
            .graphs_for_role(GraphRole::Metadata, Some("urn:config:1"))
            .unwrap();
        assert_eq!(graphs, vec!["urn:graph:metadata:1".to_string()]);

        let missing = selector.graphs_for_role(GraphRole::ShapeConstraints, Some("urn:config:1"));
        assert_eq!(missing.unwrap(), Vec::<String>::new());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let selector = GraphSelector::new(history());
        let err = selector.resolve(Some("missing-config")).unwrap_err();
        assert_matches!(err, RegistryError::EntityNotFound { ref id, .. } if id == "missing-config");
    }

    #[test]
    fn empty_history_has_no_current_configuration() {
        let selector = GraphSelector::new(ConfigurationHistory::new());
        assert!(selector.resolve(None).unwrap_err().is_not_found());
    }

    #[test]
    fn roles_round_trip_through_predicates() {
        for role in GraphRole::iter() {
            assert_eq!(GraphRole::from_predicate(role.predicate()), Some(role));
        }
        assert_eq!(GraphRole::ShapeConstraints.to_string(), "shape_constraints");
    }
}
