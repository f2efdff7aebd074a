//! Entity type queries over the metadata, shape-constraint and ontology graphs

use crate::error::Result;
use crate::graph::{GraphConfigurationProvider, GraphRole, GraphSelector, ResolvedGraphs};
use crate::hierarchy::{Hierarchy, HierarchyBuilder, TreeNode};
use crate::model::TypeNode;
use crate::sparql::{IriValidator, ParameterizedQuery, ResultProjector, SparqlQuery, TypedBinding};
use crate::store::{Triple, TripleStore};
use crate::vocab::{dash, rdfs};

const ENTITY_TYPES_QUERY: &str = r#"
SELECT DISTINCT ?subject ?predicate ?object
@fromMetadata
@fromShacl
@fromOntology
WHERE {
    ?subject rdfs:subClassOf* @entityType .
    ?subject ?predicate ?object .
    FILTER(!isLiteral(?object) || lang(?object) IN (@language, ""))
}
ORDER BY ?subject
"#;

const PARENT_TYPES_QUERY: &str = r#"
SELECT DISTINCT ?type
@fromMetadata
@fromShacl
@fromOntology
WHERE {
    @entityType rdfs:subClassOf* ?type .
}
"#;

const LEAF_TYPES_QUERY: &str = r#"
SELECT DISTINCT ?type
@fromMetadata
@fromShacl
@fromOntology
WHERE {
    ?type rdfs:subClassOf* @entityType .
    FILTER NOT EXISTS { ?subClass rdfs:subClassOf ?type }
}
ORDER BY ?type
"#;

const INSTANTIABLE_TYPES_QUERY: &str = r#"
SELECT DISTINCT ?class
@fromMetadata
@fromOntology
WHERE {
    ?class rdfs:subClassOf* @entityType .
    ?class @abstract false .
}
ORDER BY ?class
"#;

const LABEL_QUERY: &str = r#"
SELECT ?label
@fromMetadata
WHERE {
    @subject @label ?label .
}
"#;

const SHAPE_GRAPH_QUERY: &str = r#"
CONSTRUCT { ?s ?p ?o }
@fromMetadata
@fromShacl
@fromOntology
WHERE {
    ?s ?p ?o .
}
"#;

/// Type-level lookups shared by the schema resolver, the validator and the CLI.
pub struct MetadataRepository<S, P> {
    store: S,
    selector: GraphSelector<P>,
    language: String,
}

impl<S, P> MetadataRepository<S, P>
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

    /// Language used to filter labels and descriptions
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn selector(&self) -> &GraphSelector<P> {
        &self.selector
    }

    /// Resolve "current or explicit" configuration once for a request
    pub fn resolve(&self, config_id: Option<&str>) -> Result<ResolvedGraphs> {
        self.selector.resolve(config_id)
    }

    /// Bind the metadata, shape-constraint and ontology graphs.
    fn scoped(&self, template: &str, graphs: &ResolvedGraphs) -> ParameterizedQuery {
        let query = ParameterizedQuery::select(template);
        let query = graphs.bind(query, "fromMetadata", GraphRole::Metadata);
        let query = graphs.bind(query, "fromShacl", GraphRole::ShapeConstraints);
        graphs.bind(query, "fromOntology", GraphRole::EnterpriseOntology)
    }

    fn select_values(&self, query: SparqlQuery, var: &str) -> Result<Vec<String>> {
        let rows = self.store.select(&query)?;
        Ok(ResultProjector::distinct_values(&rows, var))
    }

    // =========================================================================
    // Type hierarchy
    // =========================================================================

    /// Every subclass of `entity_type` (itself included) as a hierarchy arena.
    pub fn entity_types_in(&self, graphs: &ResolvedGraphs, entity_type: &str) -> Result<Hierarchy<TypeNode>> {
        IriValidator::require_absolute(entity_type)?;

        let query = self
            .scoped(ENTITY_TYPES_QUERY, graphs)
            .uri("entityType", entity_type)
            .literal("language", &self.language)
            .build()?;

        let rows = self.store.select(&query)?;
        let entities = ResultProjector::project(&rows, "subject", "predicate", "object");
        Ok(HierarchyBuilder::build(entities.into_iter().map(TypeNode::from)))
    }

    /// Direct subclasses of `entity_type`
    pub fn direct_subclasses_in(&self, graphs: &ResolvedGraphs, entity_type: &str) -> Result<Vec<TypeNode>> {
        let hierarchy = self.entity_types_in(graphs, entity_type)?;
        let Some(root) = hierarchy.find(entity_type) else {
            return Ok(Vec::new());
        };
        Ok(hierarchy
            .children(root)
            .iter()
            .map(|child| hierarchy.get(*child).clone())
            .collect())
    }

    /// Type hierarchy rooted at `entity_type` in the current configuration.
    ///
    /// `None` when the type has no data.
    pub fn entity_type_hierarchy(&self, entity_type: &str, max_depth: usize) -> Result<Option<TreeNode<TypeNode>>> {
        IriValidator::require_absolute(entity_type)?;
        let graphs = self.resolve(None)?;
        let hierarchy = self.entity_types_in(&graphs, entity_type)?;
        Ok(hierarchy
            .find(entity_type)
            .map(|root| hierarchy.to_tree(root, max_depth)))
    }

    /// `entity_type` and every class above it
    pub fn parent_entity_types(&self, entity_type: &str) -> Result<Vec<String>> {
        IriValidator::require_absolute(entity_type)?;
        let graphs = self.resolve(None)?;
        let query = self
            .scoped(PARENT_TYPES_QUERY, &graphs)
            .uri("entityType", entity_type)
            .build()?;
        self.select_values(query, "type")
    }

    /// Subclasses of `entity_type` that have no subclasses themselves
    pub fn leaf_entity_types(&self, entity_type: &str) -> Result<Vec<String>> {
        IriValidator::require_absolute(entity_type)?;
        let graphs = self.resolve(None)?;
        let query = self
            .scoped(LEAF_TYPES_QUERY, &graphs)
            .uri("entityType", entity_type)
            .build()?;
        self.select_values(query, "type")
    }

    /// Subclasses of `entity_type` marked `dash:abstract false`
    pub fn instantiable_entity_types(&self, entity_type: &str) -> Result<Vec<String>> {
        IriValidator::require_absolute(entity_type)?;
        let graphs = self.resolve(None)?;
        let query = ParameterizedQuery::select(INSTANTIABLE_TYPES_QUERY);
        let query = graphs.bind(query, "fromMetadata", GraphRole::Metadata);
        let query = graphs
            .bind(query, "fromOntology", GraphRole::EnterpriseOntology)
            .uri("entityType", entity_type)
            .uri("abstract", dash::ABSTRACT)
            .build()?;
        self.select_values(query, "class")
    }

    /// `rdfs:label` of an entity, empty when it has none
    pub fn entity_label(&self, id: &str) -> Result<String> {
        IriValidator::require_absolute(id)?;
        let graphs = self.resolve(None)?;
        let query = ParameterizedQuery::select(LABEL_QUERY);
        let query = graphs
            .bind(query, "fromMetadata", GraphRole::Metadata)
            .uri("subject", id)
            .uri("label", rdfs::LABEL)
            .build()?;

        let rows = self.store.select(&query)?;
        let preferred = rows
            .iter()
            .find(|row| row.get("label").and_then(|v| v.language()) == Some(self.language.as_str()))
            .or_else(|| rows.first());

        Ok(preferred
            .and_then(|row| TypedBinding::new(row).get_literal_opt("label").ok().flatten())
            .unwrap_or_default())
    }

    /// Every triple of the metadata, shape-constraint and ontology graphs
    pub fn shape_graph(&self, config_id: Option<&str>) -> Result<Vec<Triple>> {
        let graphs = self.resolve(config_id)?;
        let query = ParameterizedQuery::construct(SHAPE_GRAPH_QUERY);
        let query = graphs.bind(query, "fromMetadata", GraphRole::Metadata);
        let query = graphs.bind(query, "fromShacl", GraphRole::ShapeConstraints);
        let query = graphs
            .bind(query, "fromOntology", GraphRole::EnterpriseOntology)
            .build()?;
        Ok(self.store.construct(&query)?)
    }
}

/// Resolves the concrete types an identifier lookup is scoped to
pub trait InstantiableTypes {
    fn instantiable_entity_types(&self, entity_type: &str) -> Result<Vec<String>>;
}

impl<S, P> InstantiableTypes for MetadataRepository<S, P>
where
    S: TripleStore,
    P: GraphConfigurationProvider,
{
    fn instantiable_entity_types(&self, entity_type: &str) -> Result<Vec<String>> {
        MetadataRepository::instantiable_entity_types(self, entity_type)
    }
}

impl<T: InstantiableTypes + ?Sized> InstantiableTypes for &T {
    fn instantiable_entity_types(&self, entity_type: &str) -> Result<Vec<String>> {
        (**self).instantiable_entity_types(entity_type)
    }
}
