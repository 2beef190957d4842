use super::backend::{check_slug_uniqueness, rebind_to_stored_ids, StorageBackend};
use crate::error::{Result, TaxonomyError};
use crate::model::{AttributeDefinition, CategoryNode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Default)]
struct MemState {
    categories: HashMap<Uuid, CategoryNode>,
    slugs: HashMap<String, Uuid>,
    definitions: HashMap<Uuid, Vec<AttributeDefinition>>,
}

impl MemState {
    fn apply_categories(&mut self, nodes: &[CategoryNode]) -> Result<()> {
        check_slug_uniqueness(nodes, |slug| self.slugs.get(slug).copied())?;

        for node in nodes {
            if let Some(previous) = self.categories.get(&node.id) {
                if previous.slug != node.slug {
                    let old_slug = previous.slug.clone();
                    self.slugs.remove(&old_slug);
                }
            }
            self.slugs.insert(node.slug.clone(), node.id);
            self.categories.insert(node.id, node.clone());
        }
        Ok(())
    }
}

/// In-memory storage backend.
///
/// State sits behind one `RwLock`, so each write is applied under a single
/// exclusive guard and is atomic with respect to readers. Clones share the same
/// state, which lets independent callers (e.g. parallel seed jobs) work against
/// one store.
#[derive(Clone, Default)]
pub struct MemBackend {
    state: Arc<RwLock<MemState>>,
    simulate_write_error: Arc<AtomicBool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Test helper to write a category without any checks, e.g. to plant a
    /// parent cycle that the builder would never produce.
    pub fn insert_raw_category(&self, node: CategoryNode) -> Result<()> {
        let mut state = self.write()?;
        state.slugs.insert(node.slug.clone(), node.id);
        state.categories.insert(node.id, node);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemState>> {
        self.state
            .read()
            .map_err(|_| TaxonomyError::Store("memory backend lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemState>> {
        self.state
            .write()
            .map_err(|_| TaxonomyError::Store("memory backend lock poisoned".to_string()))
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(TaxonomyError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn load_categories(&self) -> Result<Vec<CategoryNode>> {
        let state = self.read()?;
        Ok(state.categories.values().cloned().collect())
    }

    fn load_category(&self, id: &Uuid) -> Result<Option<CategoryNode>> {
        let state = self.read()?;
        Ok(state.categories.get(id).cloned())
    }

    fn find_category_by_slug(&self, slug: &str) -> Result<Option<CategoryNode>> {
        let state = self.read()?;
        Ok(state
            .slugs
            .get(slug)
            .and_then(|id| state.categories.get(id))
            .cloned())
    }

    fn save_categories(&self, nodes: &[CategoryNode]) -> Result<()> {
        self.check_writable()?;
        let mut state = self.write()?;
        state.apply_categories(nodes)
    }

    fn upsert_categories(&self, mut nodes: Vec<CategoryNode>) -> Result<Vec<CategoryNode>> {
        self.check_writable()?;
        let mut state = self.write()?;
        rebind_to_stored_ids(&mut nodes, |slug| {
            state
                .slugs
                .get(slug)
                .and_then(|id| state.categories.get(id))
                .cloned()
        });
        state.apply_categories(&nodes)?;
        Ok(nodes)
    }

    fn load_definitions(&self, category_id: &Uuid) -> Result<Vec<AttributeDefinition>> {
        let state = self.read()?;
        Ok(state
            .definitions
            .get(category_id)
            .cloned()
            .unwrap_or_default())
    }

    fn save_definitions(
        &self,
        category_id: &Uuid,
        definitions: &[AttributeDefinition],
    ) -> Result<()> {
        self.check_writable()?;
        let mut state = self.write()?;
        state
            .definitions
            .insert(*category_id, definitions.to_vec());
        Ok(())
    }

    fn update_definitions<F>(&self, category_id: &Uuid, update: F) -> Result<bool>
    where
        F: FnOnce(Vec<AttributeDefinition>) -> Result<Option<Vec<AttributeDefinition>>>,
    {
        let mut state = self.write()?;
        let current = state
            .definitions
            .get(category_id)
            .cloned()
            .unwrap_or_default();
        match update(current)? {
            Some(definitions) => {
                self.check_writable()?;
                state.definitions.insert(*category_id, definitions);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
