//! Aggregate configuration for the whole pipeline.
//!
//! Loaded from JSON; every section and field is optional and falls back to
//! its default.
//!
//! ```json
//! {
//!   "table": { "time_format": "%Y-%m-%d %H:%M:%S" },
//!   "curves": { "threshold": 0.5, "granularity": 5 },
//!   "refine": { "delete_off_road_points": true, "tolerance": 0.0001 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CurveConfig, RefineConfig, Result, TableConfig};

/// Configuration for every pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub table: TableConfig,
    pub curves: CurveConfig,
    pub refine: RefineConfig,
}

impl PipelineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Check every stage's values.
    pub fn validate(&self) -> Result<()> {
        self.curves.validate()?;
        self.refine.validate()
    }
}
