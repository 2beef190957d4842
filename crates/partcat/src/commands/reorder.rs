//! Drag-and-drop ordering.
//!
//! Both operations take the complete new order. Anything other than an exact
//! permutation of the current members fails with
//! [`TaxonomyError::InvalidReorderSet`](crate::error::TaxonomyError::InvalidReorderSet)
//! before anything is written. A valid order is applied as one store write, so
//! readers never observe a half-applied reorder.

use crate::commands::helpers::check_permutation;
use crate::error::Result;
use crate::model::{AttributeDefinition, CategoryNode};
use crate::store::DataStore;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

/// Reorders the definitions a category owns. Inherited names are not members.
///
/// The permutation is checked against the set stored at write time, inside the
/// same [`DataStore::update_definitions`] call that applies it.
pub fn attributes<S: DataStore>(
    store: &mut S,
    category_id: &Uuid,
    ordered_names: &[&str],
) -> Result<Vec<AttributeDefinition>> {
    let owner = store.get_category(category_id)?;
    let mut result: Vec<AttributeDefinition> = Vec::new();
    let mut changed = 0usize;

    store
        .update_definitions(category_id, |mut definitions| {
            let current: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
            check_permutation(&owner.slug, &current, ordered_names)?;

            let now = Utc::now();
            for definition in definitions.iter_mut() {
                let position = position_of(ordered_names, &definition.name);
                if definition.sort_order != position {
                    definition.sort_order = position;
                    definition.updated_at = now;
                    changed += 1;
                }
            }
            definitions.sort_by_key(|d| d.sort_order);
            result = definitions.clone();
            Ok((changed > 0).then_some(definitions))
        })
        .inspect_err(|e| {
            warn!(category = %owner.slug, error = %e, "rejected attribute reorder");
        })?;

    info!(category = %owner.slug, changed, "reordered attributes");
    Ok(result)
}

/// Reorders the children of `parent_id`, or the roots when `None`.
pub fn categories<S: DataStore>(
    store: &mut S,
    parent_id: Option<&Uuid>,
    ordered_slugs: &[&str],
) -> Result<Vec<CategoryNode>> {
    let owner = match parent_id {
        Some(id) => store.get_category(id)?.slug,
        None => "<root>".to_string(),
    };
    let mut siblings = store.list_children(parent_id)?;

    let current: Vec<&str> = siblings.iter().map(|n| n.slug.as_str()).collect();
    check_permutation(&owner, &current, ordered_slugs).inspect_err(|e| {
        warn!(parent = %owner, error = %e, "rejected category reorder");
    })?;

    let now = Utc::now();
    let mut batch: Vec<CategoryNode> = Vec::new();
    for node in siblings.iter_mut() {
        let position = position_of(ordered_slugs, &node.slug);
        if node.sort_order != position {
            node.sort_order = position;
            node.updated_at = now;
            batch.push(node.clone());
        }
    }
    siblings.sort_by_key(|n| n.sort_order);

    store.save_categories(&batch)?;
    info!(parent = %owner, changed = batch.len(), "reordered categories");
    Ok(siblings)
}

// Callers have already checked the permutation, so every member is present.
fn position_of(order: &[&str], name: &str) -> u32 {
    order.iter().position(|n| *n == name).unwrap_or(order.len()) as u32
}
