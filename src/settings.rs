//! Run settings
//!
//! Everything a run needs besides its input files. Loaded from an optional
//! JSON file; every field falls back to its default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use steelmatch_core::GradeAliases;
use steelmatch_similarity::{ClusterConfig, EngineConfig, FeatureEngineer, MatcherConfig};

/// Column names of the input tables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColumnNames {
    pub rfq_id: String,
    pub inventory_id: String,
    /// Grade column of the RFQ table
    pub grade: String,
    /// Grade column of the reference table
    pub reference_key: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            rfq_id: "id".to_string(),
            inventory_id: "article_id".to_string(),
            grade: "grade".to_string(),
            reference_key: "Grade/Material".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub matcher: MatcherConfig,
    pub cluster: ClusterConfig,
    pub features: FeatureEngineer,
    pub aliases: GradeAliases,
    pub columns: ColumnNames,
}

impl Settings {
    /// Parse settings from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text).context("Invalid settings JSON")?;
        settings.engine.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings from {}", path.display()))?;
                Self::from_json(&text).with_context(|| format!("Failed to load {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }
}
