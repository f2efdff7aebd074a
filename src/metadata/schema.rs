//! Shape constraints to property definitions
//!
//! One schema query returns every `(shape, predicate, value)` row for the
//! shapes attached to an entity type and its superclasses, plus rows for
//! properties declared with `rdfs:domain` on those classes. Rows are grouped
//! per shape node, keyed by `sh:path`, and folded into [`MetadataProperty`]
//! values.
//!
//! Nested object editors pull in the schema of every direct subclass of the
//! referenced class. Those schemas are fetched breadth first from a work-list
//! that never visits a type twice, then assembled with a depth ceiling and a
//! per-path cycle guard.

use super::repository::{InstantiableTypes, MetadataRepository};
use crate::error::Result;
use crate::graph::{GraphConfigurationProvider, GraphRole, ResolvedGraphs};
use crate::model::{EntityValue, MetadataProperty, MetadataPropertyGroup, NestedMetadata, TypeNode};
use crate::sparql::{IriValidator, ParameterizedQuery, QueryRow, ResultProjector, TypedBinding};
use crate::store::TripleStore;
use crate::vocab::{owl, rdf, registry, shacl, topbraid};
use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_MAX_DEPTH: usize = 8;

const SCHEMA_QUERY: &str = r#"
SELECT *
@fromMetadata
@fromShacl
@fromOntology
@fromConsumerGroup
WHERE {
    {
        @entityType rdfs:subClassOf* ?resourceType .
        ?resourceType sh:property ?shape .
        ?shape ?shapeProperty ?shapeValue .
        FILTER(!isLiteral(?shapeValue) || lang(?shapeValue) IN (@language, ""))
        OPTIONAL {
            ?shape @editWidget @nestedObjectEditor .
            ?shape sh:class ?nested .
        }
        OPTIONAL {
            ?shapeValue rdf:type sh:PropertyGroup .
            BIND(?shapeValue AS ?group)
            OPTIONAL { ?shapeValue sh:order ?groupOrder }
            OPTIONAL {
                ?shapeValue rdfs:label ?groupLabel .
                FILTER(lang(?groupLabel) IN (@language, ""))
            }
            OPTIONAL { ?shapeValue tosh:editGroupDescription ?editGroupDescription }
            OPTIONAL { ?shapeValue tosh:viewGroupDescription ?viewGroupDescription }
        }
    }
    UNION
    {
        @entityType rdfs:subClassOf* ?resourceType .
        ?extraProperty rdfs:domain ?resourceType .
        ?extraProperty ?shapeProperty ?shapeValue .
        FILTER(!isLiteral(?shapeValue) || lang(?shapeValue) IN (@language, ""))
    }
}
"#;

/// Tolerated irregularities found while resolving a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum SchemaNotice {
    /// A shape without `sh:path` was dropped
    MissingPath { entity_type: String, shape: String },
    /// Two shapes share a path; the later one replaced the earlier one
    DuplicateKey { entity_type: String, key: String },
    /// Nested schemas below this type were not resolved
    NestingTruncated { entity_type: String, depth: usize },
    /// The type already appears above itself in the nesting path
    NestedCycle { entity_type: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSchema {
    pub properties: Vec<MetadataProperty>,
    pub notices: Vec<SchemaNotice>,
}

/// Schema of one type with nested object references still unresolved
#[derive(Debug, Clone, Default)]
struct FlatSchema {
    properties: Vec<MetadataProperty>,
    /// (property index, class named by `sh:class`)
    nested: Vec<(usize, String)>,
}

pub struct MetadataSchemaResolver<S, P> {
    repository: MetadataRepository<S, P>,
    max_depth: usize,
}

impl<S, P> MetadataSchemaResolver<S, P>
where
    S: TripleStore,
    P: GraphConfigurationProvider,
{
    pub fn new(repository: MetadataRepository<S, P>) -> Self {
        Self {
            repository,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn repository(&self) -> &MetadataRepository<S, P> {
        &self.repository
    }

    /// Property definitions for `entity_type`.
    ///
    /// Notices are logged and dropped; use [`Self::resolve_with_notices`] to
    /// keep them.
    pub fn resolve(&self, entity_type: &str, config_id: Option<&str>) -> Result<Vec<MetadataProperty>> {
        Ok(self.resolve_with_notices(entity_type, config_id)?.properties)
    }

    pub fn resolve_with_notices(&self, entity_type: &str, config_id: Option<&str>) -> Result<ResolvedSchema> {
        IriValidator::require_absolute(entity_type)?;
        let graphs = self.repository.resolve(config_id)?;

        tracing::info!(entity_type, config_id = %graphs.config_id(), "resolving metadata schema");
        self.resolve_in(&graphs, entity_type)
    }

    /// Resolve against an already selected configuration.
    pub fn resolve_in(&self, graphs: &ResolvedGraphs, entity_type: &str) -> Result<ResolvedSchema> {
        IriValidator::require_absolute(entity_type)?;

        let mut notices = Vec::new();
        let mut schemas: AHashMap<String, FlatSchema> = AHashMap::new();
        let mut subtypes: AHashMap<String, Vec<TypeNode>> = AHashMap::new();
        let mut visited: AHashSet<String> = AHashSet::new();
        let mut work: VecDeque<(String, usize)> = VecDeque::new();

        visited.insert(entity_type.to_string());
        work.push_back((entity_type.to_string(), 0));

        while let Some((current, depth)) = work.pop_front() {
            let schema = self.fetch_flat(graphs, &current, &mut notices)?;

            for (_, nested_class) in &schema.nested {
                if depth >= self.max_depth || subtypes.contains_key(nested_class) {
                    continue;
                }
                let classes = self.repository.direct_subclasses_in(graphs, nested_class)?;
                for class in &classes {
                    if visited.insert(class.id.clone()) {
                        work.push_back((class.id.clone(), depth + 1));
                    }
                }
                subtypes.insert(nested_class.clone(), classes);
            }

            schemas.insert(current, schema);
        }

        let mut path = Vec::new();
        let properties = self.assemble(entity_type, 0, &schemas, &subtypes, &mut path, &mut notices);

        for notice in &notices {
            tracing::info!(?notice, "schema notice");
        }

        Ok(ResolvedSchema { properties, notices })
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    fn fetch_flat(&self, graphs: &ResolvedGraphs, entity_type: &str, notices: &mut Vec<SchemaNotice>) -> Result<FlatSchema> {
        let query = ParameterizedQuery::select(SCHEMA_QUERY);
        let query = graphs.bind(query, "fromMetadata", GraphRole::Metadata);
        let query = graphs.bind(query, "fromShacl", GraphRole::ShapeConstraints);
        let query = graphs.bind(query, "fromOntology", GraphRole::EnterpriseOntology);
        let query = graphs
            .bind(query, "fromConsumerGroup", GraphRole::ConsumerGroup)
            .uri("entityType", entity_type)
            .literal("language", self.repository.language())
            .uri("editWidget", topbraid::EDIT_WIDGET)
            .uri("nestedObjectEditor", topbraid::NESTED_OBJECT_EDITOR)
            .build()?;

        let rows = self.repository.store().select(&query)?;
        tracing::debug!(entity_type, rows = rows.len(), "schema rows fetched");

        Ok(fold_rows(entity_type, &rows, notices))
    }

    // =========================================================================
    // Assemble
    // =========================================================================

    fn assemble(
        &self,
        entity_type: &str,
        depth: usize,
        schemas: &AHashMap<String, FlatSchema>,
        subtypes: &AHashMap<String, Vec<TypeNode>>,
        path: &mut Vec<String>,
        notices: &mut Vec<SchemaNotice>,
    ) -> Vec<MetadataProperty> {
        let Some(schema) = schemas.get(entity_type) else {
            return Vec::new();
        };

        let mut properties = schema.properties.clone();
        path.push(entity_type.to_string());

        for (index, nested_class) in &schema.nested {
            if depth >= self.max_depth {
                push_notice(
                    notices,
                    SchemaNotice::NestingTruncated {
                        entity_type: entity_type.to_string(),
                        depth,
                    },
                );
                continue;
            }

            let classes = subtypes.get(nested_class).map(Vec::as_slice).unwrap_or_default();
            let nested = classes
                .iter()
                .map(|class| {
                    let nested_properties = if path.contains(&class.id) {
                        push_notice(
                            notices,
                            SchemaNotice::NestedCycle {
                                entity_type: class.id.clone(),
                            },
                        );
                        Vec::new()
                    } else {
                        self.assemble(&class.id, depth + 1, schemas, subtypes, path, notices)
                    };

                    NestedMetadata {
                        key: class.id.clone(),
                        label: class.label.clone(),
                        description: class.description.clone(),
                        properties: nested_properties,
                    }
                })
                .collect();

            properties[*index].nested_metadata = nested;
        }

        path.pop();
        copy_distribution_schema(&mut properties);
        properties
    }
}

impl<S, P> InstantiableTypes for MetadataSchemaResolver<S, P>
where
    S: TripleStore,
    P: GraphConfigurationProvider,
{
    fn instantiable_entity_types(&self, entity_type: &str) -> Result<Vec<String>> {
        self.repository.instantiable_entity_types(entity_type)
    }
}

fn push_notice(notices: &mut Vec<SchemaNotice>, notice: SchemaNotice) {
    if !notices.contains(&notice) {
        tracing::warn!(?notice, "schema resolution degraded");
        notices.push(notice);
    }
}

// =============================================================================
// Folding
// =============================================================================

/// Group schema rows into one property per shape path.
fn fold_rows(entity_type: &str, rows: &[QueryRow], notices: &mut Vec<SchemaNotice>) -> FlatSchema {
    let (own, extra) = ResultProjector::partition(rows, "shape");

    let mut by_shape: IndexMap<&str, Vec<&QueryRow>> = IndexMap::new();
    for row in own {
        if let Some(shape) = row.value("shape") {
            by_shape.entry(shape).or_default().push(row);
        }
    }

    let mut by_key: IndexMap<String, Vec<&QueryRow>> = IndexMap::new();
    for (shape, group) in by_shape {
        let key = group.iter().find_map(|row| {
            (row.value("shapeProperty") == Some(shacl::PATH))
                .then(|| row.value("shapeValue"))
                .flatten()
        });

        let Some(key) = key else {
            notices.push(SchemaNotice::MissingPath {
                entity_type: entity_type.to_string(),
                shape: shape.to_string(),
            });
            tracing::info!(entity_type, shape, "dropping shape without sh:path");
            continue;
        };

        if by_key.insert(key.to_string(), group).is_some() {
            notices.push(SchemaNotice::DuplicateKey {
                entity_type: entity_type.to_string(),
                key: key.to_string(),
            });
            tracing::info!(entity_type, key, "duplicate metadata property, keeping the later shape");
        }
    }

    for row in extra {
        let Some(key) = row.value("extraProperty") else {
            continue;
        };
        if let Some(group) = by_key.get_mut(key) {
            group.push(row);
        }
    }

    let mut schema = FlatSchema::default();
    for (key, group) in by_key {
        let (property, nested) = fold_property(key, &group);
        if let Some(nested) = nested {
            schema.nested.push((schema.properties.len(), nested));
        }
        schema.properties.push(property);
    }
    schema
}

/// Fold the rows of one shape into a property, returning the nested class
/// when the shape uses a nested object editor.
fn fold_property(key: String, rows: &[&QueryRow]) -> (MetadataProperty, Option<String>) {
    let mut property = MetadataProperty::new(key.clone());
    property.set(registry::PID_URI, EntityValue::uri(key));
    let mut nested = None;

    for row in rows {
        let binding = TypedBinding::new(row);
        let (Some(predicate), Some(value)) = (row.value("shapeProperty"), row.get("shapeValue")) else {
            continue;
        };

        property.set(predicate, EntityValue::from(value));

        match predicate {
            topbraid::EDIT_WIDGET if value.as_str() == topbraid::NESTED_OBJECT_EDITOR => {
                if nested.is_none() {
                    nested = binding.get_string_opt("nested");
                }
            }
            shacl::GROUP => {
                if let Some(group) = property_group(&binding) {
                    property.set(shacl::GROUP, EntityValue::Group(group));
                }
            }
            _ => {}
        }
    }

    if property.value(shacl::PATH) == Some(rdf::TYPE) {
        property.set(shacl::RANGE, EntityValue::uri(owl::CLASS));
    }

    (property, nested)
}

fn property_group(binding: &TypedBinding<'_>) -> Option<MetadataPropertyGroup> {
    let key = binding.get_string_opt("group")?;
    Some(MetadataPropertyGroup {
        key,
        label: binding.get_string_opt("groupLabel"),
        order: binding.get_float_or("groupOrder", 0.0),
        edit_description: binding.get_string_opt("editGroupDescription"),
        view_description: binding.get_string_opt("viewGroupDescription"),
    })
}

/// `mainDistribution` is a restricted `distribution` and shares its schema.
fn copy_distribution_schema(properties: &mut [MetadataProperty]) {
    let Some(nested) = properties
        .iter()
        .find(|p| p.key == registry::DISTRIBUTION)
        .map(|p| p.nested_metadata.clone())
    else {
        return;
    };

    if let Some(main) = properties.iter_mut().find(|p| p.key == registry::MAIN_DISTRIBUTION) {
        main.nested_metadata = nested;
    }
}
