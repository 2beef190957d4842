//! Effective schema resolution.
//!
//! A category's effective schema is the union of its own definitions and those
//! of every ancestor, where the nearest declaration of a name wins. The result
//! lists the category's own definitions first in their `sort_order`, then each
//! ancestor's surviving definitions, nearest ancestor first.

use crate::commands::helpers::ancestor_chain;
use crate::error::Result;
use crate::model::{EffectiveAttribute, EffectiveSchema};
use crate::store::DataStore;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

pub fn run<S: DataStore>(store: &S, category_id: &Uuid, max_depth: usize) -> Result<EffectiveSchema> {
    let chain = ancestor_chain(store, category_id, max_depth)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut attributes: Vec<EffectiveAttribute> = Vec::new();
    for node in &chain {
        let is_inherited = node.id != *category_id;
        for definition in store.list_definitions(&node.id)? {
            if !seen.insert(definition.name.clone()) {
                debug!(
                    attribute = %definition.name,
                    shadowed_on = %node.slug,
                    "skipping shadowed definition"
                );
                continue;
            }
            attributes.push(EffectiveAttribute {
                definition,
                owner_category_id: node.id,
                is_inherited,
            });
        }
    }

    debug!(
        category = %category_id,
        depth = chain.len(),
        attributes = attributes.len(),
        "resolved effective schema"
    );
    Ok(EffectiveSchema {
        category_id: *category_id,
        attributes,
    })
}
