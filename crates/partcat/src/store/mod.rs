//! # Storage Layer
//!
//! This module defines the storage abstraction for the taxonomy engine. The
//! [`DataStore`] trait is what every command is written against; the
//! [`backend::StorageBackend`] trait is the raw I/O underneath it.
//!
//! ## Two Layers
//!
//! 1. **Backend** (`StorageBackend`): the "how". Loads and saves categories and
//!    definition sets. Knows nothing about trees or ordering.
//! 2. **Store** (`DataStore`, implemented by [`catalog_store::CatalogStore`]): the
//!    "what". Not-found errors, sorted listings, child lookups, and ownership
//!    checks on definition writes.
//!
//! ## Atomicity
//!
//! Every backend write MUST be atomic:
//!
//! - `save_categories`: upsert a batch of categories keyed by id.
//! - `upsert_categories`: upsert a batch keyed by slug. The tree builder writes
//!   a whole build as one batch, so a failed build applies nothing.
//! - `save_definitions`: replace the complete definition set of one category.
//! - `update_definitions`: read, modify and replace one category's definition
//!   set under a single write guard. Defines and reorders go through it, so a
//!   reader sees the old or the new set, never a mix.
//!
//! Slug uniqueness is enforced by the backend the way a unique constraint would
//! be: a batch that would give one slug to two ids is rejected as a whole.
//!
//! ## Concurrency
//!
//! Commands that modify stored state do so through `upsert_categories` and
//! `update_definitions`, which resolve the stored state inside the write. Two
//! defines of different names on one category both land; two builds creating
//! the same slug converge on one id, and the last write wins.
//!
//! ## Implementations
//!
//! - [`memory::InMemoryStore`]: `CatalogStore<MemBackend>`, for tests and for
//!   embedding without persistence. Clones of a `MemBackend` share state.
//! - [`fs_backend::FileStore`]: `CatalogStore<FsBackend>`, JSON files on disk.
//!
//! ## Storage Layout (file backend)
//!
//! ```text
//! <data_dir>/
//! ├── categories.json               # id -> CategoryNode
//! └── attributes/
//!     └── {category-id}.json        # definitions owned by that category
//! ```

use crate::error::Result;
use crate::model::{AttributeDefinition, CategoryNode};
use uuid::Uuid;

pub mod backend;
pub mod catalog_store;
pub mod fs_backend;
pub mod mem_backend;
pub mod memory;

pub use catalog_store::CatalogStore;
pub use fs_backend::{FileStore, FsBackend};
pub use mem_backend::MemBackend;
pub use memory::InMemoryStore;

/// Abstract interface for taxonomy storage.
pub trait DataStore {
    /// Get a category by id. Fails with `CategoryNotFound` if absent.
    fn get_category(&self, id: &Uuid) -> Result<CategoryNode>;

    /// Find a category by its slug.
    fn find_category(&self, slug: &str) -> Result<Option<CategoryNode>>;

    /// All categories, ordered by level, then sort order, then slug.
    fn list_categories(&self) -> Result<Vec<CategoryNode>>;

    /// Direct children of `parent_id` (roots when `None`), in sibling order.
    fn list_children(&self, parent_id: Option<&Uuid>) -> Result<Vec<CategoryNode>>;

    /// Atomically upsert a batch of categories.
    fn save_categories(&mut self, nodes: &[CategoryNode]) -> Result<()>;

    /// Atomically upsert a batch of categories matched by slug: a node whose
    /// slug is already stored takes over the stored id. Returns the nodes as
    /// written.
    fn upsert_categories(&mut self, nodes: Vec<CategoryNode>) -> Result<Vec<CategoryNode>>;

    /// Definitions owned by `category_id`, ordered by sort order, then name.
    fn list_definitions(&self, category_id: &Uuid) -> Result<Vec<AttributeDefinition>>;

    /// Atomically replace every definition owned by `category_id`.
    fn replace_definitions(
        &mut self,
        category_id: &Uuid,
        definitions: &[AttributeDefinition],
    ) -> Result<()>;

    /// Atomically rewrite the definitions owned by `category_id`.
    ///
    /// `update` sees the stored set in `list_definitions` order and returns the
    /// replacement, or `None` to write nothing. Returns whether a write happened.
    fn update_definitions<F>(&mut self, category_id: &Uuid, update: F) -> Result<bool>
    where
        F: FnOnce(Vec<AttributeDefinition>) -> Result<Option<Vec<AttributeDefinition>>>;
}
