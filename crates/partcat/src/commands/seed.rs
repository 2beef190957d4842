//! Applies a [`SeedDocument`]: build the tree, then declare each attribute set.
//!
//! Attribute sets address categories by slug. The slug map returned by the
//! build is consulted first; slugs from earlier seeds fall back to a store
//! lookup. Seeding is idempotent because both underlying steps are.

use crate::commands::{build, define, DefineMode, SlugMap};
use crate::error::{Result, TaxonomyError};
use crate::spec::SeedDocument;
use crate::store::DataStore;
use tracing::info;
use uuid::Uuid;

pub fn run<S: DataStore>(store: &mut S, document: &SeedDocument) -> Result<SlugMap> {
    let slugs = build::run(store, &document.categories, None)?;

    for set in &document.attributes {
        let category_id = category_for(store, &slugs, &set.category)?;
        define::run(store, &category_id, &set.definitions, DefineMode::AllOrNothing)?;
    }

    info!(
        categories = slugs.len(),
        attribute_sets = document.attributes.len(),
        "applied seed document"
    );
    Ok(slugs)
}

fn category_for<S: DataStore>(store: &S, slugs: &SlugMap, slug: &str) -> Result<Uuid> {
    if let Some(id) = slugs.get(slug) {
        return Ok(*id);
    }
    store
        .find_category(slug)?
        .map(|node| node.id)
        .ok_or_else(|| TaxonomyError::CategoryNotFound(slug.to_string()))
}
