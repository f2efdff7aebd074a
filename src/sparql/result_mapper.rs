// =============================================================================
// SPARQL Result Projection
// =============================================================================
// Reshape flat result rows into subject-keyed entities. Pure data work, no
// store access.

use super::typed_binding::QueryRow;
use crate::model::{Entity, EntityValue};
use indexmap::IndexMap;
use indexmap::IndexSet;

/// Groups query rows into entities and keyed buckets
pub struct ResultProjector;

impl ResultProjector {
    /// Group rows by `subject`, then by `predicate`, collecting `object`
    /// values in encounter order.
    ///
    /// Rows missing any of the three variables are skipped.
    pub fn project(rows: &[QueryRow], subject: &str, predicate: &str, object: &str) -> Vec<Entity> {
        let mut entities: IndexMap<String, Entity> = IndexMap::new();
        let mut skipped = 0usize;

        for row in rows {
            let (Some(id), Some(pred), Some(value)) =
                (row.value(subject), row.value(predicate), row.get(object))
            else {
                skipped += 1;
                continue;
            };

            entities
                .entry(id.to_string())
                .or_insert_with(|| Entity::new(id))
                .push(pred, EntityValue::from(value));
        }

        if skipped > 0 {
            tracing::debug!(skipped, subject, predicate, object, "skipped incomplete rows");
        }

        entities.into_values().collect()
    }

    /// Group rows by the value of `var`, keeping first-appearance order.
    ///
    /// Rows where `var` is unbound are left out.
    pub fn group_by<'a>(rows: &'a [QueryRow], var: &str) -> IndexMap<String, Vec<&'a QueryRow>> {
        let mut groups: IndexMap<String, Vec<&QueryRow>> = IndexMap::new();
        for row in rows {
            if let Some(key) = row.value(var) {
                groups.entry(key.to_string()).or_default().push(row);
            }
        }
        groups
    }

    /// Split rows into those binding `var` and those that do not.
    pub fn partition<'a>(rows: &'a [QueryRow], var: &str) -> (Vec<&'a QueryRow>, Vec<&'a QueryRow>) {
        rows.iter().partition(|row| row.contains(var))
    }

    /// Distinct values of `var` in encounter order
    pub fn distinct_values(rows: &[QueryRow], var: &str) -> Vec<String> {
        rows.iter()
            .filter_map(|row| row.value(var))
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }
}
