//! Engine configuration: catalog source and classifier tuning.
//!
//! Configuration is TOML with serde defaults, so an empty or missing file
//! yields the stock engine: embedded family catalog, default thresholds.
//! The family vocabulary is deployment configuration and must be identical
//! across every engine instance, which is why it comes from a file or the
//! embedded default rather than from request input.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classifier::ClassifierTuning;
use crate::models::FamilyCatalog;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to a JSON family catalog replacing the embedded default.
    pub catalog_path: Option<PathBuf>,
    /// Classifier thresholds and weights.
    pub tuning: ClassifierTuning,
}

impl EngineConfig {
    /// Loads configuration from a TOML file. A missing file yields the
    /// defaults; a malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Saves configuration as TOML, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Builds the family catalog this configuration selects: the file at
    /// `catalog_path` when set, otherwise the embedded default.
    pub fn build_catalog(&self) -> Result<FamilyCatalog> {
        match &self.catalog_path {
            Some(path) => FamilyCatalog::load_from_file(path),
            None => FamilyCatalog::load_default(),
        }
    }
}
