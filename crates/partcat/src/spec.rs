//! Declarative input shapes.
//!
//! [`CategorySpec`] describes a nested category forest and [`AttributeDef`]
//! describes one attribute to declare on a category. Both are plain data: they
//! deserialize from seed files (camelCase keys, as in the versioned data files)
//! and can be assembled in code with the builder-style methods.
//!
//! [`SeedDocument`] bundles both into the shape of a seed file.
//!
//! Nothing here is validated; validation happens when the shapes are applied
//! (see [`crate::commands::build`] and [`crate::commands::define`]).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::{AttributeScope, DataType, LocalizedText};

fn default_true() -> bool {
    true
}

/// One node of a nested category declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpec {
    pub slug: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    pub level: u32,
    #[serde(default)]
    pub sort_order: u32,
    #[serde(default)]
    pub children: Vec<CategorySpec>,
}

impl CategorySpec {
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<LocalizedText>,
        level: u32,
        sort_order: u32,
    ) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: None,
            level,
            sort_order,
            children: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<LocalizedText>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_children(mut self, children: Vec<CategorySpec>) -> Self {
        self.children = children;
        self
    }

    pub fn child(mut self, child: CategorySpec) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

/// One attribute to declare on a category.
///
/// Flags default the way seed files expect: filterable unless stated
/// otherwise, neither required nor a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDef {
    pub name: String,
    pub display_name: LocalizedText,
    pub data_type: DataType,
    #[serde(default)]
    pub scope: AttributeScope,
    #[serde(default)]
    pub unit: Option<String>,
    /// Raw prefix symbols, checked against the known SI table on definition.
    #[serde(default)]
    pub allowed_prefixes: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub is_filterable: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_label: bool,
    #[serde(default)]
    pub sort_order: u32,
}

impl AttributeDef {
    pub fn new(name: impl Into<String>, data_type: DataType, scope: AttributeScope) -> Self {
        let name = name.into();
        Self {
            display_name: LocalizedText::en(name.clone()),
            name,
            data_type,
            scope,
            unit: None,
            allowed_prefixes: None,
            allowed_values: None,
            is_filterable: true,
            is_required: false,
            is_label: false,
            sort_order: 0,
        }
    }

    pub fn display_name(mut self, display_name: impl Into<LocalizedText>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn prefixes(mut self, prefixes: &[&str]) -> Self {
        self.allowed_prefixes = Some(prefixes.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn values(mut self, values: &[&str]) -> Self {
        self.allowed_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.is_filterable = filterable;
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Marks the attribute as part of the generated item label. Implies nothing
    /// about `is_required`; the registry rejects a label that is not required.
    pub fn label(mut self) -> Self {
        self.is_label = true;
        self
    }

    pub fn sort_order(mut self, sort_order: u32) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// Attribute definitions for one category, addressed by slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSet {
    pub category: String,
    pub definitions: Vec<AttributeDef>,
}

impl AttributeSet {
    pub fn new(category: impl Into<String>, definitions: Vec<AttributeDef>) -> Self {
        Self {
            category: category.into(),
            definitions,
        }
    }
}

/// A versioned seed file: a category forest plus the attributes to declare on it.
///
/// ```json
/// {
///   "categories": [{ "slug": "resistors", "name": {"en": "Resistors"}, "level": 0 }],
///   "attributes": [{ "category": "resistors", "definitions": [] }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDocument {
    pub categories: Vec<CategorySpec>,
    #[serde(default)]
    pub attributes: Vec<AttributeSet>,
}

impl SeedDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
