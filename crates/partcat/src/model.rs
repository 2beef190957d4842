//! # Domain Model: Categories, Attribute Definitions, Effective Schemas
//!
//! This module defines the persisted records of the engine ([`CategoryNode`],
//! [`AttributeDefinition`]) and the derived, never-persisted view produced by
//! the resolver ([`EffectiveAttribute`], [`EffectiveSchema`]).
//!
//! ## Identity
//!
//! Every record has two identities:
//! - an opaque `id` (UUID v4), assigned on first creation and never reused;
//! - a **natural key** used for idempotent upserts: `slug` for categories,
//!   `(category_id, name)` for attribute definitions.
//!
//! The `id` may differ between environments; the natural key does not.
//!
//! ## Ordering
//!
//! - `CategoryNode::sort_order` orders siblings for display. It has no effect on
//!   inheritance.
//! - `AttributeDefinition::sort_order` orders the definitions owned by a single
//!   category. The values are a contiguous 0-based permutation among those
//!   siblings.
//!
//! ## Scope
//!
//! [`AttributeScope`] is carried verbatim through every layer. The engine never
//! interprets it except for the optional scope filter in
//! [`EffectiveSchema::for_scope`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::attributes::SiPrefix;

/// Display text keyed by locale (`"en"`, `"de"`, ...).
///
/// Localization is not handled here; the engine stores and compares this as an
/// opaque payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a text that only has an English rendering.
    pub fn en(text: impl Into<String>) -> Self {
        Self::new().with("en", text)
    }

    pub fn with(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(locale.into(), text.into());
        self
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for LocalizedText {
    fn from(text: &str) -> Self {
        LocalizedText::en(text)
    }
}

impl From<String> for LocalizedText {
    fn from(text: String) -> Self {
        LocalizedText::en(text)
    }
}

/// Value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Decimal,
    Integer,
    String,
    Boolean,
    Range,
    Select,
    #[serde(alias = "MULTI_SELECT")]
    MultiSelect,
}

impl DataType {
    /// Enumerated types must declare their allowed values.
    pub fn is_enumerated(self) -> bool {
        matches!(self, DataType::Select | DataType::MultiSelect)
    }
}

/// Where a concrete value for an attribute may be recorded.
///
/// - `Component`: once per manufacturer-independent component.
/// - `Part`: once per concrete manufacturer part.
/// - `Both`: nominal value on the component, overridable per part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeScope {
    Component,
    #[default]
    Part,
    Both,
}

impl AttributeScope {
    /// Whether an attribute declared with `self` is visible to a request for `requested`.
    ///
    /// `Both` attributes are visible to every request; a `Both` request sees everything.
    pub fn admits(self, requested: AttributeScope) -> bool {
        requested == AttributeScope::Both || self == AttributeScope::Both || self == requested
    }
}

/// A node of the category taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: Uuid,
    pub slug: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// Depth hint, 0 for a root domain. Equals `parent.level + 1` when a parent exists.
    pub level: u32,
    pub sort_order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryNode {
    pub fn new(slug: impl Into<String>, name: LocalizedText, level: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug: slug.into(),
            name,
            description: None,
            parent_id: None,
            level,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// An attribute declared on exactly one owning category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub display_name: LocalizedText,
    pub data_type: DataType,
    pub scope: AttributeScope,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub allowed_prefixes: Vec<SiPrefix>,
    #[serde(default)]
    pub allowed_values: Option<Vec<String>>,
    pub is_filterable: bool,
    pub is_required: bool,
    pub is_label: bool,
    pub sort_order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttributeDefinition {
    /// Compares everything a caller can declare, ignoring identity and timestamps.
    pub fn same_declaration(&self, other: &AttributeDefinition) -> bool {
        self.name == other.name
            && self.display_name == other.display_name
            && self.data_type == other.data_type
            && self.scope == other.scope
            && self.unit == other.unit
            && self.allowed_prefixes == other.allowed_prefixes
            && self.allowed_values == other.allowed_values
            && self.is_filterable == other.is_filterable
            && self.is_required == other.is_required
            && self.is_label == other.is_label
            && self.sort_order == other.sort_order
    }
}

/// A definition as seen from a queried category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveAttribute {
    pub definition: AttributeDefinition,
    /// The category that supplied the winning definition.
    pub owner_category_id: Uuid,
    pub is_inherited: bool,
}

impl EffectiveAttribute {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// The ordered, shadowed attribute schema of one category.
///
/// Own attributes come first in their `sort_order`, followed by each ancestor's
/// surviving attributes, nearest ancestor first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveSchema {
    pub category_id: Uuid,
    pub attributes: Vec<EffectiveAttribute>,
}

impl EffectiveSchema {
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectiveAttribute> {
        self.attributes.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&EffectiveAttribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Attributes declared by the queried category itself.
    pub fn own(&self) -> impl Iterator<Item = &EffectiveAttribute> {
        self.attributes.iter().filter(|a| !a.is_inherited)
    }

    pub fn inherited(&self) -> impl Iterator<Item = &EffectiveAttribute> {
        self.attributes.iter().filter(|a| a.is_inherited)
    }

    /// Inherited attributes grouped by donating ancestor, nearest ancestor first.
    pub fn inherited_groups(&self) -> Vec<(Uuid, Vec<&EffectiveAttribute>)> {
        let mut groups: Vec<(Uuid, Vec<&EffectiveAttribute>)> = Vec::new();
        for attr in self.inherited() {
            match groups.last_mut() {
                Some((owner, members)) if *owner == attr.owner_category_id => members.push(attr),
                _ => groups.push((attr.owner_category_id, vec![attr])),
            }
        }
        groups
    }

    /// Restricts the schema to attributes visible for `scope`, keeping order.
    pub fn for_scope(&self, scope: AttributeScope) -> EffectiveSchema {
        EffectiveSchema {
            category_id: self.category_id,
            attributes: self
                .attributes
                .iter()
                .filter(|a| a.definition.scope.admits(scope))
                .cloned()
                .collect(),
        }
    }
}

impl IntoIterator for EffectiveSchema {
    type Item = EffectiveAttribute;
    type IntoIter = std::vec::IntoIter<EffectiveAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.into_iter()
    }
}

/// A category with its children, as returned by tree queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTreeNode {
    pub category: CategoryNode,
    pub children: Vec<CategoryTreeNode>,
}
