//! # Attribute Rules
//!
//! Shared rules for attribute definitions, independent of storage:
//!
//! - **Prefixes**: the fixed SI prefix table ([`SI_PREFIXES`]) that an
//!   attribute's `allowed_prefixes` must be drawn from.
//! - **Validation**: per-definition checks applied by the schema registry
//!   before anything is written ([`validate_definition`]).
//!
//! ## Validation Rules
//!
//! | Field | Rule |
//! |-------|------|
//! | `name` | `^[A-Za-z][A-Za-z0-9_]*$`, at most 100 characters |
//! | `display_name` | at least one locale |
//! | `unit` | at most 50 characters |
//! | `allowed_values` | non-empty for `SELECT` / `MULTISELECT` |
//! | `allowed_prefixes` | every token in the SI table (`-` = base unit) |
//! | `is_label` | only together with `is_required` |
//!
//! A violation is reported as [`crate::error::TaxonomyError::SchemaDefinition`]
//! naming the offending field.

mod prefix;
mod validation;

pub use prefix::{PrefixSpec, SiPrefix, UnknownPrefix, SI_PREFIXES};
pub use validation::{
    parse_prefixes, validate_attribute_name, validate_definition, NameValidationError,
    MAX_NAME_LEN, MAX_UNIT_LEN,
};
