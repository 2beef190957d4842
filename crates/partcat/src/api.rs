//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer. It is the single
//! entry point for every taxonomy operation, whichever application embeds it.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Normalizes inputs** (e.g., any `AsRef<str>` list for reorders, slugs to ids)
//! - **Applies configuration** (the ancestor depth bound) so callers never pass it
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: That belongs in `commands/*.rs`
//! - **Hold taxonomy state**: every call reads from and writes to the store
//!
//! ## Generic Over DataStore
//!
//! `TaxonomyApi<S: DataStore>` is generic over the storage backend:
//! - Production: `TaxonomyApi<FileStore>`
//! - Testing: `TaxonomyApi<InMemoryStore>`
//!
//! ## Testing Strategy
//!
//! API tests verify dispatch and argument handling only. Command logic is
//! tested in the command modules, storage behavior in the store modules.

use crate::commands::{self, DefineMode, DefineReport, SlugMap};
use crate::config::TaxonomyConfig;
use crate::error::{Result, TaxonomyError};
use crate::model::{
    AttributeDefinition, AttributeScope, CategoryNode, CategoryTreeNode, EffectiveSchema,
};
use crate::spec::{AttributeDef, CategorySpec, SeedDocument};
use crate::store::{DataStore, FileStore, InMemoryStore};
use tracing::info;
use uuid::Uuid;

/// The main API facade for taxonomy operations.
pub struct TaxonomyApi<S: DataStore> {
    store: S,
    config: TaxonomyConfig,
}

impl TaxonomyApi<InMemoryStore> {
    pub fn in_memory() -> Self {
        Self::new(InMemoryStore::new(), TaxonomyConfig::default())
    }
}

impl TaxonomyApi<FileStore> {
    /// Opens the file store under the configured data directory.
    pub fn open(config: TaxonomyConfig) -> Result<Self> {
        config.validate()?;
        let root = config.data_dir()?;
        info!(root = %root.display(), "opening file store");
        Ok(Self::new(FileStore::open(root), config))
    }
}

impl<S: DataStore> TaxonomyApi<S> {
    pub fn new(store: S, config: TaxonomyConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TaxonomyConfig {
        &self.config
    }

    // --- Tree Builder ---

    pub fn build_tree(&mut self, specs: &[CategorySpec]) -> Result<SlugMap> {
        commands::build::run(&mut self.store, specs, None)
    }

    pub fn build_subtree(&mut self, parent_id: &Uuid, specs: &[CategorySpec]) -> Result<SlugMap> {
        commands::build::run(&mut self.store, specs, Some(parent_id))
    }

    pub fn apply_seed(&mut self, document: &SeedDocument) -> Result<SlugMap> {
        commands::seed::run(&mut self.store, document)
    }

    // --- Schema Registry ---

    pub fn define_attributes(
        &mut self,
        category_id: &Uuid,
        defs: &[AttributeDef],
    ) -> Result<DefineReport> {
        commands::define::run(&mut self.store, category_id, defs, DefineMode::AllOrNothing)
    }

    pub fn define_attributes_with(
        &mut self,
        category_id: &Uuid,
        defs: &[AttributeDef],
        mode: DefineMode,
    ) -> Result<DefineReport> {
        commands::define::run(&mut self.store, category_id, defs, mode)
    }

    /// Definitions owned by the category itself, in display order.
    pub fn own_definitions(&self, category_id: &Uuid) -> Result<Vec<AttributeDefinition>> {
        self.store.get_category(category_id)?;
        self.store.list_definitions(category_id)
    }

    // --- Inheritance Resolver ---

    pub fn effective_schema(&self, category_id: &Uuid) -> Result<EffectiveSchema> {
        commands::resolve::run(&self.store, category_id, self.config.max_ancestor_depth)
    }

    pub fn effective_schema_for_scope(
        &self,
        category_id: &Uuid,
        scope: AttributeScope,
    ) -> Result<EffectiveSchema> {
        Ok(self.effective_schema(category_id)?.for_scope(scope))
    }

    // --- Ordering Service ---

    pub fn reorder_attributes<I: AsRef<str>>(
        &mut self,
        category_id: &Uuid,
        ordered_names: &[I],
    ) -> Result<Vec<AttributeDefinition>> {
        let names: Vec<&str> = ordered_names.iter().map(|n| n.as_ref()).collect();
        commands::reorder::attributes(&mut self.store, category_id, &names)
    }

    pub fn reorder_categories<I: AsRef<str>>(
        &mut self,
        parent_id: Option<&Uuid>,
        ordered_slugs: &[I],
    ) -> Result<Vec<CategoryNode>> {
        let slugs: Vec<&str> = ordered_slugs.iter().map(|s| s.as_ref()).collect();
        commands::reorder::categories(&mut self.store, parent_id, &slugs)
    }

    // --- Navigation ---

    pub fn category(&self, id: &Uuid) -> Result<CategoryNode> {
        self.store.get_category(id)
    }

    pub fn category_by_slug(&self, slug: &str) -> Result<CategoryNode> {
        self.store
            .find_category(slug)?
            .ok_or_else(|| TaxonomyError::CategoryNotFound(slug.to_string()))
    }

    pub fn children(&self, parent_id: Option<&Uuid>) -> Result<Vec<CategoryNode>> {
        if let Some(id) = parent_id {
            self.store.get_category(id)?;
        }
        self.store.list_children(parent_id)
    }

    pub fn category_path(&self, category_id: &Uuid) -> Result<Vec<CategoryNode>> {
        commands::navigate::path(&self.store, category_id, self.config.max_ancestor_depth)
    }

    pub fn descendant_ids(&self, category_id: &Uuid) -> Result<Vec<Uuid>> {
        commands::navigate::descendant_ids(&self.store, category_id)
    }

    pub fn category_tree(
        &self,
        root: Option<&Uuid>,
        max_depth: Option<usize>,
    ) -> Result<Vec<CategoryTreeNode>> {
        commands::navigate::tree(&self.store, root, max_depth)
    }
}
