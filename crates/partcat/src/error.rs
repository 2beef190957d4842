use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error(
        "Duplicate slug '{slug}': declared under parent {first_parent} and under parent {second_parent}"
    )]
    DuplicateSlug {
        slug: String,
        first_parent: String,
        second_parent: String,
    },

    #[error("Category '{slug}' has level {found}, expected {expected} (parent level + 1)")]
    LevelMismatch {
        slug: String,
        expected: u32,
        found: u32,
    },

    #[error("Invalid attribute definition '{attribute}': field `{field}` {reason}")]
    SchemaDefinition {
        attribute: String,
        field: &'static str,
        reason: String,
    },

    #[error("Cycle in category taxonomy at {category_id} (walked {})", fmt_chain(.chain))]
    CyclicTaxonomy { category_id: Uuid, chain: Vec<Uuid> },

    #[error("Ancestor walk from {category_id} exceeded the depth limit of {limit}")]
    DepthLimitExceeded { category_id: Uuid, limit: usize },

    #[error(
        "Invalid reorder set for {owner}: missing [{}], unknown [{}], duplicated [{}]",
        .missing.join(", "),
        .unknown.join(", "),
        .duplicated.join(", ")
    )]
    InvalidReorderSet {
        owner: String,
        missing: Vec<String>,
        unknown: Vec<String>,
        duplicated: Vec<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Invalid config value for `{key}`: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    #[error("Store error: {0}")]
    Store(String),
}

impl TaxonomyError {
    pub(crate) fn schema(
        attribute: impl Into<String>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        TaxonomyError::SchemaDefinition {
            attribute: attribute.into(),
            field,
            reason: reason.into(),
        }
    }
}

fn fmt_chain(chain: &[Uuid]) -> String {
    chain
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, TaxonomyError>;
