//! # Command Layer
//!
//! This module contains the **engine logic** of partcat. Each operation lives in
//! its own submodule as free functions generic over [`DataStore`], so the same
//! code runs against the in-memory store in tests and the file store in
//! production.
//!
//! | Module | Operations |
//! |--------|------------|
//! | [`build`] | materialize a nested [`CategorySpec`](crate::spec::CategorySpec) forest |
//! | [`define`] | upsert attribute definitions on one category |
//! | [`resolve`] | compute the effective (inherited, shadowed) schema |
//! | [`reorder`] | rewrite attribute or sibling category order as one unit |
//! | [`navigate`] | breadcrumbs, descendants and nested trees |
//! | [`seed`] | apply a seed document (tree + attribute sets) |
//!
//! ## What Commands Do NOT Do
//!
//! - **Any I/O of their own**: persistence goes through the store, nothing else.
//! - **Hold state between calls**: identifiers flow from one call to the next
//!   through returned values such as [`SlugMap`].
//! - **Install a tracing subscriber**: they emit events, the embedding
//!   application decides where they go.
//!
//! ## Testing Strategy
//!
//! Commands are where most tests live. They run against
//! [`InMemoryStore`](crate::store::InMemoryStore), usually seeded through
//! `store::memory::fixtures::StoreFixture`.
//!
//! [`DataStore`]: crate::store::DataStore

use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

pub mod build;
pub mod define;
pub mod helpers;
pub mod navigate;
pub mod reorder;
pub mod resolve;
pub mod seed;

/// Slug to id, for every category touched by a build.
pub type SlugMap = BTreeMap<String, Uuid>;

/// How [`define::run`] treats a batch containing an invalid definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DefineMode {
    /// Reject the whole call; nothing is written.
    #[default]
    AllOrNothing,
    /// Persist the definitions that validated before the first failure, then
    /// return that failure.
    BestEffort,
}

/// Names touched by one [`define::run`] call, by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DefineReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
}

impl DefineReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty()
    }

    pub fn total(&self) -> usize {
        self.created.len() + self.updated.len() + self.unchanged.len()
    }
}
