//! # partcat Architecture
//!
//! partcat is the category engine of an electronic parts catalog. It owns the
//! taxonomy (a forest of categories) and the attribute schemas declared on it,
//! and answers one central question: which attributes apply to a category,
//! given everything its ancestors declare?
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Applies configuration (ancestor depth bound)             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Tree builder, schema registry, resolver, ordering        │
//! │  - Free functions over any DataStore                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Abstract DataStore trait over a StorageBackend           │
//! │  - FileStore (production), InMemoryStore (testing)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Inheritance In One Paragraph
//!
//! A definition is owned by exactly one category. A category's effective
//! schema walks from the category to its root; the first (nearest) definition
//! of each name wins and every farther one is shadowed. Own definitions come
//! first in their display order, then each ancestor's survivors, nearest
//! ancestor first.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Engine logic for each operation
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Core data types (`CategoryNode`, `AttributeDefinition`, `EffectiveSchema`)
//! - [`spec`]: Declarative inputs (`CategorySpec`, `AttributeDef`, `SeedDocument`)
//! - [`attributes`]: SI prefixes and definition validation
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod api;
pub mod attributes;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod spec;
pub mod store;

pub use api::TaxonomyApi;
pub use error::{Result, TaxonomyError};
