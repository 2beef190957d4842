use super::backend::StorageBackend;
use super::DataStore;
use crate::error::{Result, TaxonomyError};
use crate::model::{AttributeDefinition, CategoryNode};
use uuid::Uuid;

pub struct CatalogStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
}

impl<B: StorageBackend> CatalogStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

fn sort_definitions(definitions: &mut [AttributeDefinition]) {
    definitions.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.cmp(&b.name))
    });
}

// A definition is never moved to another owner.
fn check_owner(category_id: &Uuid, definitions: &[AttributeDefinition]) -> Result<()> {
    match definitions.iter().find(|d| d.category_id != *category_id) {
        Some(foreign) => Err(TaxonomyError::Store(format!(
            "definition '{}' belongs to category {}, not {}",
            foreign.name, foreign.category_id, category_id
        ))),
        None => Ok(()),
    }
}

fn sort_siblings(nodes: &mut [CategoryNode]) {
    nodes.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.slug.cmp(&b.slug))
    });
}

impl<B: StorageBackend> DataStore for CatalogStore<B> {
    fn get_category(&self, id: &Uuid) -> Result<CategoryNode> {
        self.backend
            .load_category(id)?
            .ok_or_else(|| TaxonomyError::CategoryNotFound(id.to_string()))
    }

    fn find_category(&self, slug: &str) -> Result<Option<CategoryNode>> {
        self.backend.find_category_by_slug(slug)
    }

    fn list_categories(&self) -> Result<Vec<CategoryNode>> {
        let mut nodes = self.backend.load_categories()?;
        nodes.sort_by(|a, b| {
            a.level
                .cmp(&b.level)
                .then_with(|| a.sort_order.cmp(&b.sort_order))
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Ok(nodes)
    }

    fn list_children(&self, parent_id: Option<&Uuid>) -> Result<Vec<CategoryNode>> {
        let mut children: Vec<CategoryNode> = self
            .backend
            .load_categories()?
            .into_iter()
            .filter(|node| node.parent_id.as_ref() == parent_id)
            .collect();
        sort_siblings(&mut children);
        Ok(children)
    }

    fn save_categories(&mut self, nodes: &[CategoryNode]) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        self.backend.save_categories(nodes)
    }

    fn upsert_categories(&mut self, nodes: Vec<CategoryNode>) -> Result<Vec<CategoryNode>> {
        if nodes.is_empty() {
            return Ok(nodes);
        }
        self.backend.upsert_categories(nodes)
    }

    fn list_definitions(&self, category_id: &Uuid) -> Result<Vec<AttributeDefinition>> {
        let mut definitions = self.backend.load_definitions(category_id)?;
        sort_definitions(&mut definitions);
        Ok(definitions)
    }

    fn replace_definitions(
        &mut self,
        category_id: &Uuid,
        definitions: &[AttributeDefinition],
    ) -> Result<()> {
        self.get_category(category_id)?;
        check_owner(category_id, definitions)?;
        self.backend.save_definitions(category_id, definitions)
    }

    fn update_definitions<F>(&mut self, category_id: &Uuid, update: F) -> Result<bool>
    where
        F: FnOnce(Vec<AttributeDefinition>) -> Result<Option<Vec<AttributeDefinition>>>,
    {
        self.get_category(category_id)?;
        self.backend.update_definitions(category_id, |mut current| {
            sort_definitions(&mut current);
            let next = update(current)?;
            if let Some(definitions) = &next {
                check_owner(category_id, definitions)?;
            }
            Ok(next)
        })
    }
}
