//! Controlled vocabularies linked by `skos:broader`

use crate::cache::Cache;
use crate::error::{RegistryError, Result};
use crate::graph::{GraphConfigurationProvider, GraphRole, GraphSelector, ResolvedGraphs};
use crate::hierarchy::{Hierarchy, HierarchyBuilder, TreeNode};
use crate::model::TaxonomyNode;
use crate::sparql::{IriValidator, ParameterizedQuery, ResultProjector, SparqlQuery};
use crate::store::TripleStore;

/// Taxonomies are shallow; this only stops malformed cyclic data.
pub const TAXONOMY_MAX_DEPTH: usize = 32;

const TAXONOMIES_BY_TYPE_QUERY: &str = r#"
SELECT DISTINCT ?subject ?predicate ?object
@fromMetadata
WHERE {
    ?subject a @taxonomyType .
    ?subject ?predicate ?object .
    FILTER(!isLiteral(?object) || lang(?object) IN (@language, ""))
}
ORDER BY ?subject
"#;

const TAXONOMIES_BY_ID_QUERY: &str = r#"
SELECT DISTINCT ?subject ?predicate ?object
@fromMetadata
WHERE {
    ?subject skos:broader* @taxonomyId .
    ?subject ?predicate ?object .
    FILTER(!isLiteral(?object) || lang(?object) IN (@language, ""))
}
ORDER BY ?subject
"#;

pub struct TaxonomyRepository<S, P> {
    store: S,
    selector: GraphSelector<P>,
    language: String,
}

impl<S, P> TaxonomyRepository<S, P>
where
    S: TripleStore,
    P: GraphConfigurationProvider,
{
    pub fn new(store: S, provider: P) -> Self {
        Self {
            store,
            selector: GraphSelector::new(provider),
            language: "en".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn resolve(&self, config_id: Option<&str>) -> Result<ResolvedGraphs> {
        self.selector.resolve(config_id)
    }

    /// Every node typed `taxonomy_type`
    pub fn taxonomies_in(&self, graphs: &ResolvedGraphs, taxonomy_type: &str) -> Result<Hierarchy<TaxonomyNode>> {
        IriValidator::require_absolute(taxonomy_type)?;
        let query = ParameterizedQuery::select(TAXONOMIES_BY_TYPE_QUERY);
        let query = graphs
            .bind(query, "fromMetadata", GraphRole::Metadata)
            .uri("taxonomyType", taxonomy_type)
            .literal("language", &self.language)
            .build()?;
        self.fetch(query)
    }

    /// `id` and every node below it
    pub fn taxonomies_below_in(&self, graphs: &ResolvedGraphs, id: &str) -> Result<Hierarchy<TaxonomyNode>> {
        IriValidator::require_absolute(id)?;
        let query = ParameterizedQuery::select(TAXONOMIES_BY_ID_QUERY);
        let query = graphs
            .bind(query, "fromMetadata", GraphRole::Metadata)
            .uri("taxonomyId", id)
            .literal("language", &self.language)
            .build()?;
        self.fetch(query)
    }

    fn fetch(&self, query: SparqlQuery) -> Result<Hierarchy<TaxonomyNode>> {
        let rows = self.store.select(&query)?;
        let entities = ResultProjector::project(&rows, "subject", "predicate", "object");
        tracing::debug!(nodes = entities.len(), "taxonomy nodes fetched");
        Ok(HierarchyBuilder::build(entities.into_iter().map(TaxonomyNode::from)))
    }
}

/// Cached taxonomy read models.
///
/// Each entry is keyed by the configuration that produced it.
pub struct TaxonomyService<S, P, C> {
    repository: TaxonomyRepository<S, P>,
    cache: C,
}

impl<S, P, C> TaxonomyService<S, P, C>
where
    S: TripleStore,
    P: GraphConfigurationProvider,
    C: Cache<Vec<TreeNode<TaxonomyNode>>>,
{
    pub fn new(repository: TaxonomyRepository<S, P>, cache: C) -> Self {
        Self { repository, cache }
    }

    /// Root nodes of `taxonomy_type`, each with its subtree
    pub fn taxonomies(&self, taxonomy_type: &str) -> Result<Vec<TreeNode<TaxonomyNode>>> {
        IriValidator::require_absolute(taxonomy_type)?;
        let graphs = self.repository.resolve(None)?;
        let key = format!("{}:type:{}", graphs.config_id(), taxonomy_type);

        self.cache.get_or_try_insert_with(&key, || {
            let hierarchy = self.repository.taxonomies_in(&graphs, taxonomy_type)?;
            Ok(hierarchy.forest(TAXONOMY_MAX_DEPTH))
        })
    }

    /// Subtree rooted at `id`
    pub fn taxonomy(&self, id: &str) -> Result<TreeNode<TaxonomyNode>> {
        IriValidator::require_absolute(id)?;
        let graphs = self.repository.resolve(None)?;
        let key = format!("{}:id:{}", graphs.config_id(), id);

        let found = self.cache.get_or_try_insert_with(&key, || {
            let hierarchy = self.repository.taxonomies_below_in(&graphs, id)?;
            let subtree: Vec<_> = hierarchy
                .select(Some(id))
                .into_iter()
                .map(|root| hierarchy.to_tree(root, TAXONOMY_MAX_DEPTH))
                .collect();
            if subtree.is_empty() {
                return Err(RegistryError::not_found("taxonomy", id));
            }
            Ok(subtree)
        })?;

        found
            .into_iter()
            .next()
            .ok_or_else(|| RegistryError::not_found("taxonomy", id))
    }

    /// Every node of `taxonomy_type` once, each with its subtree
    pub fn taxonomies_flat(&self, taxonomy_type: &str) -> Result<Vec<TreeNode<TaxonomyNode>>> {
        IriValidator::require_absolute(taxonomy_type)?;
        let graphs = self.repository.resolve(None)?;
        let key = format!("{}:list:type:{}", graphs.config_id(), taxonomy_type);

        self.cache.get_or_try_insert_with(&key, || {
            let hierarchy = self.repository.taxonomies_in(&graphs, taxonomy_type)?;
            Ok(hierarchy
                .ids()
                .map(|id| hierarchy.to_tree(id, TAXONOMY_MAX_DEPTH))
                .collect())
        })
    }
}
