//! # Configuration
//!
//! partcat configuration is loaded with [`confique`] in layers, highest
//! priority first:
//!
//! 1. **Environment variables**: `PARTCAT_MAX_ANCESTOR_DEPTH`, `PARTCAT_DATA_DIR`.
//! 2. **Config file**: `partcat.toml` in the directory passed to [`TaxonomyConfig::load`].
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `max_ancestor_depth` | `64` | Bound on every ancestor walk (resolution, breadcrumbs) |
//! | `data_dir` | OS data directory | Root of the file store |

use crate::error::{Result, TaxonomyError};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "partcat.toml";
pub const DEFAULT_MAX_ANCESTOR_DEPTH: usize = 64;

/// Configuration for partcat, stored in `partcat.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyConfig {
    /// Maximum number of ancestors walked above a category. Deeper chains are
    /// reported as an error rather than walked.
    #[config(default = 64, env = "PARTCAT_MAX_ANCESTOR_DEPTH")]
    pub max_ancestor_depth: usize,

    /// Where the file store keeps its JSON files.
    #[config(env = "PARTCAT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            max_ancestor_depth: DEFAULT_MAX_ANCESTOR_DEPTH,
            data_dir: None,
        }
    }
}

impl TaxonomyConfig {
    /// Loads env > `<dir>/partcat.toml` > defaults. A missing file is skipped.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(dir) = dir {
            builder = builder.file(dir.join(CONFIG_FILE_NAME));
        }
        let config = builder.load()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_ancestor_depth == 0 {
            return Err(TaxonomyError::InvalidConfig {
                key: "max_ancestor_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// The configured data directory, or the OS data directory for partcat.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        ProjectDirs::from("com", "partcat", "partcat")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| TaxonomyError::InvalidConfig {
                key: "data_dir",
                reason: "no home directory to derive a default from".to_string(),
            })
    }
}
