use crate::sparql::TypedValue;
use crate::vocab::{rdfs, shacl, skos};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

// =============================================================================
// Entity
// =============================================================================

/// A subject with its predicate-keyed values.
///
/// Entities nest by containment only: a nested value is owned by its parent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub properties: IndexMap<String, Vec<EntityValue>>,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: IndexMap::new(),
        }
    }

    pub fn with(mut self, predicate: &str, value: EntityValue) -> Self {
        self.push(predicate, value);
        self
    }

    pub fn push(&mut self, predicate: &str, value: EntityValue) {
        self.properties
            .entry(predicate.to_string())
            .or_default()
            .push(value);
    }

    pub fn values(&self, predicate: &str) -> &[EntityValue] {
        self.properties
            .get(predicate)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Text of every scalar or URI value under `predicate`
    pub fn values_of(&self, predicate: &str) -> Vec<&str> {
        self.values(predicate)
            .iter()
            .filter_map(EntityValue::as_text)
            .collect()
    }

    pub fn first_value(&self, predicate: &str) -> Option<&str> {
        self.values(predicate).iter().find_map(EntityValue::as_text)
    }

    /// Nested entities under `predicate`
    pub fn nested(&self, predicate: &str) -> impl Iterator<Item = &Entity> {
        self.values(predicate).iter().filter_map(|value| match value {
            EntityValue::Nested(entity) => Some(entity.as_ref()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EntityValue {
    Scalar(String),
    UriRef(String),
    Nested(Box<Entity>),
    Group(MetadataPropertyGroup),
}

impl EntityValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        EntityValue::Scalar(value.into())
    }

    pub fn uri(value: impl Into<String>) -> Self {
        EntityValue::UriRef(value.into())
    }

    pub fn nested(entity: Entity) -> Self {
        EntityValue::Nested(Box::new(entity))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EntityValue::Scalar(text) | EntityValue::UriRef(text) => Some(text),
            EntityValue::Nested(_) | EntityValue::Group(_) => None,
        }
    }
}

impl From<&TypedValue> for EntityValue {
    fn from(value: &TypedValue) -> Self {
        match value {
            TypedValue::IRI(iri) => EntityValue::UriRef(iri.clone()),
            other => EntityValue::Scalar(other.as_str().to_string()),
        }
    }
}

// =============================================================================
// Metadata schema
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataProperty {
    pub key: String,
    pub properties: IndexMap<String, EntityValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_metadata: Vec<NestedMetadata>,
}

impl MetadataProperty {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Insert or overwrite one constraint value
    pub fn set(&mut self, predicate: &str, value: EntityValue) {
        self.properties.insert(predicate.to_string(), value);
    }

    pub fn value(&self, predicate: &str) -> Option<&str> {
        self.properties.get(predicate).and_then(EntityValue::as_text)
    }

    pub fn group(&self) -> Option<&MetadataPropertyGroup> {
        match self.properties.get(shacl::GROUP) {
            Some(EntityValue::Group(group)) => Some(group),
            _ => None,
        }
    }
}

/// Display group shared by several properties. Identity is the key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataPropertyGroup {
    pub key: String,
    pub label: Option<String>,
    pub order: f64,
    pub edit_description: Option<String>,
    pub view_description: Option<String>,
}

impl PartialEq for MetadataPropertyGroup {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for MetadataPropertyGroup {}

impl Hash for MetadataPropertyGroup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Schema of one concrete type usable as a nested object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NestedMetadata {
    pub key: String,
    pub label: String,
    pub description: Option<String>,
    pub properties: Vec<MetadataProperty>,
}

// =============================================================================
// Hierarchy nodes
// =============================================================================

/// Class in the entity type hierarchy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeNode {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub parents: Vec<String>,
    pub properties: IndexMap<String, Vec<EntityValue>>,
}

impl From<Entity> for TypeNode {
    fn from(entity: Entity) -> Self {
        let label = entity.first_value(rdfs::LABEL).unwrap_or_default().to_string();
        let description = entity.first_value(rdfs::COMMENT).map(str::to_string);
        let parents = entity
            .values_of(rdfs::SUB_CLASS_OF)
            .into_iter()
            .filter(|parent| *parent != entity.id)
            .map(str::to_string)
            .collect();

        Self {
            id: entity.id,
            label,
            description,
            parents,
            properties: entity.properties,
        }
    }
}

/// Concept of a controlled vocabulary
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub parents: Vec<String>,
    pub properties: IndexMap<String, Vec<EntityValue>>,
}

impl From<Entity> for TaxonomyNode {
    fn from(entity: Entity) -> Self {
        let label = entity
            .first_value(skos::PREF_LABEL)
            .or_else(|| entity.first_value(rdfs::LABEL))
            .unwrap_or_default()
            .to_string();
        let description = entity.first_value(rdfs::COMMENT).map(str::to_string);
        let parents = entity
            .values_of(skos::BROADER)
            .into_iter()
            .filter(|parent| *parent != entity.id)
            .map(str::to_string)
            .collect();

        Self {
            id: entity.id,
            label,
            description,
            parents,
            properties: entity.properties,
        }
    }
}
