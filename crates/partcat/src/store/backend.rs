use crate::error::Result;
use crate::model::{AttributeDefinition, CategoryNode};
use uuid::Uuid;

/// Abstract interface for raw storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while CatalogStore handles the "what" (lookups, ordering, ownership checks).
pub trait StorageBackend {
    // --- Category Operations ---

    /// Load every stored category, in no particular order.
    fn load_categories(&self) -> Result<Vec<CategoryNode>>;

    /// Load one category by id. Returns Ok(None) if it does not exist.
    fn load_category(&self, id: &Uuid) -> Result<Option<CategoryNode>>;

    /// Look a category up by its natural key.
    fn find_category_by_slug(&self, slug: &str) -> Result<Option<CategoryNode>>;

    /// Upsert a batch of categories keyed by id.
    /// MUST be atomic: either every node is written or none is.
    /// MUST reject the batch if a slug would belong to two different ids.
    fn save_categories(&self, nodes: &[CategoryNode]) -> Result<()>;

    /// Upsert a batch of categories keyed by slug.
    ///
    /// Inside the same critical section as the write, every node whose slug is
    /// already stored under another id is rebound to that id (see
    /// [`rebind_to_stored_ids`]). Returns the nodes as written.
    /// MUST be atomic like `save_categories`.
    fn upsert_categories(&self, nodes: Vec<CategoryNode>) -> Result<Vec<CategoryNode>>;

    // --- Definition Operations ---

    /// Load the definitions owned by a category (empty if none).
    fn load_definitions(&self, category_id: &Uuid) -> Result<Vec<AttributeDefinition>>;

    /// Replace the complete definition set owned by a category.
    /// MUST be atomic: concurrent readers see the old set or the new set.
    fn save_definitions(
        &self,
        category_id: &Uuid,
        definitions: &[AttributeDefinition],
    ) -> Result<()>;

    /// Read-modify-write of one category's definition set.
    ///
    /// `update` receives the stored set and returns the replacement, or `None`
    /// to leave it alone. Load, `update` and save run under one write guard, so
    /// two updates of the same category never interleave.
    /// Returns whether anything was written.
    fn update_definitions<F>(&self, category_id: &Uuid, update: F) -> Result<bool>
    where
        F: FnOnce(Vec<AttributeDefinition>) -> Result<Option<Vec<AttributeDefinition>>>;
}

/// Rebinds batch nodes to the ids their slugs already hold.
///
/// A node whose slug is stored under a different id takes over that id and
/// the stored `created_at`; parent links inside the batch follow the move.
/// Shared by the backends so both resolve racing creations the same way.
pub(crate) fn rebind_to_stored_ids<F>(nodes: &mut [CategoryNode], stored: F)
where
    F: Fn(&str) -> Option<CategoryNode>,
{
    use std::collections::HashMap;

    let mut moved: HashMap<Uuid, Uuid> = HashMap::new();
    for node in nodes.iter_mut() {
        if let Some(existing) = stored(&node.slug) {
            if existing.id != node.id {
                moved.insert(node.id, existing.id);
                node.id = existing.id;
                node.created_at = existing.created_at;
            }
        }
    }
    if moved.is_empty() {
        return;
    }
    for node in nodes.iter_mut() {
        if let Some(parent) = node.parent_id.and_then(|p| moved.get(&p)) {
            node.parent_id = Some(*parent);
        }
    }
}

/// Checks a category batch against the slugs already stored.
///
/// `owner_of` answers "which id currently holds this slug". Shared by the
/// backends so both reject conflicts the same way.
pub(crate) fn check_slug_uniqueness<F>(nodes: &[CategoryNode], owner_of: F) -> Result<()>
where
    F: Fn(&str) -> Option<Uuid>,
{
    use crate::error::TaxonomyError;
    use std::collections::HashMap;

    let mut in_batch: HashMap<&str, Uuid> = HashMap::new();
    for node in nodes {
        if let Some(other) = in_batch.insert(node.slug.as_str(), node.id) {
            if other != node.id {
                return Err(TaxonomyError::Store(format!(
                    "slug '{}' assigned to two categories in one batch",
                    node.slug
                )));
            }
        }
        if let Some(owner) = owner_of(&node.slug) {
            if owner != node.id {
                return Err(TaxonomyError::Store(format!(
                    "slug '{}' already belongs to category {}",
                    node.slug, owner
                )));
            }
        }
    }
    Ok(())
}
