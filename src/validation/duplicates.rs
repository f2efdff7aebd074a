//! Identifier collision checks for a candidate resource
//!
//! Three identifier kinds are checked:
//! - the persistent identifier (`pidUri`), a violation when taken
//! - the base URI, a violation unless every stored occurrence belongs to
//!   the candidate's own version chain
//! - target URIs (`hasNetworkAddress`), reported as info only
//!
//! Repository occurrences are checked for the resource and every nested
//! entity. Same-document repeats are found by a separate scan over the whole
//! property tree.

use super::{ValidationResultProperty, ValidationSeverity};
use crate::error::Result;
use crate::metadata::InstantiableTypes;
use crate::model::{Entity, EntityValue};
use crate::sparql::IriValidator;
use crate::vocab::{rdf, registry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Depth ceiling for both traversals of the candidate tree
pub const DEFAULT_MAX_DEPTH: usize = 16;

const DUPLICATE_FIELD: &str = "This value is already in use by another entry";

/// Where a stored identifier value is attached
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateResult {
    /// Draft resource holding the value
    pub draft: Option<String>,
    /// Published resource holding the value
    pub published: Option<String>,
    /// Predicate the value is stored under
    pub identifier_type: Option<String>,
    pub resource_type: Option<String>,
}

impl DuplicateResult {
    fn is_orphan(&self) -> bool {
        self.draft.is_none() && self.published.is_none()
    }

    fn belongs_to(&self, id: &str) -> bool {
        self.draft.as_deref() == Some(id) || self.published.as_deref() == Some(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: String,
    pub pid_uri: String,
}

/// Stored identifier lookups
pub trait IdentifierRepository {
    fn identifier_occurrences(&self, value: &str) -> Result<Vec<DuplicateResult>>;

    /// Occurrences of a target URI on resources of `leaf_types`
    fn target_uri_occurrences(&self, value: &str, leaf_types: &[String]) -> Result<Vec<DuplicateResult>>;

    /// Every version of the resource that `pid_uri` belongs to
    fn version_chain(&self, pid_uri: &str) -> Result<Vec<VersionRecord>>;
}

impl<T: IdentifierRepository + ?Sized> IdentifierRepository for &T {
    fn identifier_occurrences(&self, value: &str) -> Result<Vec<DuplicateResult>> {
        (**self).identifier_occurrences(value)
    }

    fn target_uri_occurrences(&self, value: &str, leaf_types: &[String]) -> Result<Vec<DuplicateResult>> {
        (**self).target_uri_occurrences(value, leaf_types)
    }

    fn version_chain(&self, pid_uri: &str) -> Result<Vec<VersionRecord>> {
        (**self).version_chain(pid_uri)
    }
}

/// One identifier-bearing value found in the candidate tree
#[derive(Debug)]
struct Occurrence<'a> {
    path: &'a str,
    owner: &'a str,
    value: &'a str,
}

pub struct DuplicateValidator<R, T> {
    repository: R,
    types: T,
    first_resource_type: String,
    max_depth: usize,
}

impl<R, T> DuplicateValidator<R, T>
where
    R: IdentifierRepository,
    T: InstantiableTypes,
{
    pub fn new(repository: R, types: T) -> Self {
        Self {
            repository,
            types,
            first_resource_type: registry::FIRST_RESOURCE_TYPE.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Root type whose instantiable subtypes scope target URI lookups
    pub fn with_first_resource_type(mut self, entity_type: impl Into<String>) -> Self {
        self.first_resource_type = entity_type.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Collisions of `resource`'s identifiers with stored data and with each
    /// other.
    ///
    /// `resource_id` is the stored id when the resource already exists;
    /// `previous_version` is the pid URI of the version it replaces.
    pub fn check_duplicates(
        &self,
        resource: &Entity,
        resource_id: Option<&str>,
        previous_version: Option<&str>,
    ) -> Result<Vec<ValidationResultProperty>> {
        let resource_id = resource_id.filter(|id| !id.trim().is_empty());
        let previous_version = previous_version.filter(|v| !v.trim().is_empty());

        let mut results = Vec::new();
        let mut leaf_types = None;
        self.check_in_repository(resource, resource_id, previous_version, 0, &mut leaf_types, &mut results)?;

        let mut occurrences = Vec::new();
        self.collect_occurrences(resource, 0, &mut occurrences);
        results.extend(same_document_duplicates(&occurrences));

        tracing::debug!(
            resource = %resource.id,
            findings = results.len(),
            "duplicate check finished"
        );
        Ok(results)
    }

    // =========================================================================
    // Repository checks
    // =========================================================================

    fn check_in_repository(
        &self,
        entity: &Entity,
        resource_id: Option<&str>,
        previous_version: Option<&str>,
        depth: usize,
        leaf_types: &mut Option<Vec<String>>,
        results: &mut Vec<ValidationResultProperty>,
    ) -> Result<()> {
        if depth > self.max_depth {
            tracing::warn!(entity = %entity.id, depth, "duplicate check depth limit reached");
            return Ok(());
        }

        let entity_type = entity.first_value(rdf::TYPE);

        if let Some(pid_uri) = identifier(entity, registry::PID_URI) {
            let occurrences = self.repository.identifier_occurrences(pid_uri)?;
            if identifier_is_taken(&occurrences, resource_id, entity_type) {
                results.push(violation(entity, registry::PID_URI, pid_uri));
            }
        }

        if let Some(base_uri) = identifier(entity, registry::BASE_URI) {
            let occurrences = self.repository.identifier_occurrences(base_uri)?;
            let pid_uri = identifier(entity, registry::PID_URI);
            if self.base_uri_is_taken(&occurrences, entity_type, resource_id, pid_uri, previous_version)? {
                results.push(violation(entity, registry::BASE_URI, base_uri));
            }
        }

        if let Some(target_uri) = entity.first_value(registry::HAS_NETWORK_ADDRESS).filter(|v| !v.trim().is_empty()) {
            if leaf_types.is_none() {
                *leaf_types = Some(self.types.instantiable_entity_types(&self.first_resource_type)?);
            }
            let types = leaf_types.as_deref().unwrap_or_default();
            let occurrences = self.repository.target_uri_occurrences(target_uri, types)?;
            if !occurrences.is_empty() {
                results.push(ValidationResultProperty::duplicate(
                    &entity.id,
                    registry::HAS_NETWORK_ADDRESS,
                    target_uri,
                    DUPLICATE_FIELD,
                    ValidationSeverity::Info,
                ));
            }
        }

        for (predicate, values) in &entity.properties {
            if is_identifier_container(predicate) {
                continue;
            }
            for value in values {
                if let EntityValue::Nested(nested) = value {
                    self.check_in_repository(nested, resource_id, None, depth + 1, leaf_types, results)?;
                }
            }
        }

        Ok(())
    }

    fn base_uri_is_taken(
        &self,
        occurrences: &[DuplicateResult],
        entity_type: Option<&str>,
        resource_id: Option<&str>,
        pid_uri: Option<&str>,
        previous_version: Option<&str>,
    ) -> Result<bool> {
        if occurrences.is_empty() {
            return Ok(false);
        }

        let foreign_kind = occurrences
            .iter()
            .any(|o| o.identifier_type.as_deref().is_some_and(|t| t != registry::BASE_URI));
        if occurrences.iter().any(DuplicateResult::is_orphan) || foreign_kind {
            return Ok(true);
        }

        if resource_id.is_none() && previous_version.is_none() {
            return Ok(true);
        }

        let chain_root = previous_version
            .filter(|v| IriValidator::is_absolute(v))
            .or_else(|| pid_uri.filter(|p| IriValidator::is_absolute(p)));
        let versions = match chain_root {
            Some(root) => self.repository.version_chain(root)?,
            None => Vec::new(),
        };

        let all_in_chain = occurrences
            .iter()
            .all(|o| versions.iter().any(|version| o.belongs_to(&version.id)));
        if all_in_chain {
            tracing::debug!(versions = versions.len(), "base URI shared within version chain");
            return Ok(false);
        }

        Ok(identifier_is_taken(occurrences, resource_id, entity_type))
    }

    // =========================================================================
    // Same-document scan
    // =========================================================================

    fn collect_occurrences<'a>(&self, entity: &'a Entity, depth: usize, found: &mut Vec<Occurrence<'a>>) {
        if depth > self.max_depth {
            tracing::warn!(entity = %entity.id, depth, "identifier scan depth limit reached");
            return;
        }

        for (predicate, values) in &entity.properties {
            for value in values {
                if predicate == registry::HAS_NETWORK_ADDRESS {
                    if let Some(text) = value.as_text().filter(|t| !t.trim().is_empty()) {
                        found.push(Occurrence {
                            path: predicate,
                            owner: &entity.id,
                            value: text,
                        });
                    }
                    continue;
                }

                if is_identifier_container(predicate) {
                    // the root's own identifiers are covered by the repository check
                    if depth > 0 {
                        if let Some(text) = identifier_value(value) {
                            found.push(Occurrence {
                                path: predicate,
                                owner: &entity.id,
                                value: text,
                            });
                        }
                    }
                    continue;
                }

                if let EntityValue::Nested(nested) = value {
                    self.collect_occurrences(nested, depth + 1, found);
                }
            }
        }
    }
}

fn same_document_duplicates(occurrences: &[Occurrence<'_>]) -> Vec<ValidationResultProperty> {
    let mut by_value: IndexMap<&str, Vec<&Occurrence<'_>>> = IndexMap::new();
    for occurrence in occurrences {
        by_value.entry(occurrence.value).or_default().push(occurrence);
    }

    by_value
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .flat_map(|(value, group)| {
            let siblings = group.len() - 1;
            group.into_iter().map(move |occurrence| {
                if occurrence.path == registry::HAS_NETWORK_ADDRESS {
                    ValidationResultProperty::duplicate(
                        occurrence.owner,
                        occurrence.path,
                        value,
                        format!("This Target URI is identical with {siblings} other Target URI of this entry"),
                        ValidationSeverity::Info,
                    )
                } else {
                    ValidationResultProperty::duplicate(
                        occurrence.owner,
                        occurrence.path,
                        value,
                        format!("This identifier is identical with {siblings} other identifier of this entry"),
                        ValidationSeverity::Violation,
                    )
                }
            })
        })
        .collect()
}

/// A stored value collides unless every occurrence is attached to the
/// candidate itself with the same type.
fn identifier_is_taken(occurrences: &[DuplicateResult], resource_id: Option<&str>, entity_type: Option<&str>) -> bool {
    if occurrences.is_empty() {
        return false;
    }
    if occurrences.iter().any(DuplicateResult::is_orphan) {
        return true;
    }
    let Some(resource_id) = resource_id else {
        return true;
    };
    if occurrences.iter().any(|o| !o.belongs_to(resource_id)) {
        return true;
    }
    occurrences
        .iter()
        .any(|o| o.belongs_to(resource_id) && o.resource_type.as_deref() != entity_type)
}

fn violation(entity: &Entity, path: &str, value: &str) -> ValidationResultProperty {
    ValidationResultProperty::duplicate(&entity.id, path, value, DUPLICATE_FIELD, ValidationSeverity::Violation)
}

fn is_identifier_container(predicate: &str) -> bool {
    predicate == registry::PID_URI || predicate == registry::BASE_URI
}

/// Identifier entities carry the URI as their id
fn identifier_value(value: &EntityValue) -> Option<&str> {
    let text = match value {
        EntityValue::Nested(entity) => entity.id.as_str(),
        other => other.as_text()?,
    };
    (!text.trim().is_empty()).then_some(text)
}

fn identifier<'a>(entity: &'a Entity, predicate: &str) -> Option<&'a str> {
    entity.values(predicate).iter().find_map(identifier_value)
}
