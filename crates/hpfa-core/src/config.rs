//! Fusion options and config files.
//!
//! Options may come from CLI flags or from a YAML file. A file can also pin
//! replacement numeric tables:
//!
//! ```yaml
//! options:
//!   ratio: 4.0
//!   level: mid
//!   modulation: max
//!   two_pass: true
//! tables:            # optional, validated on load
//!   ratio_ranges: ...
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::params::{Level, Modulation};
use crate::tables::FusionTables;
use crate::{HpfaError, HpfaResult};

/// Ratio above which a second pass is permitted.
pub const SECOND_PASS_MIN_RATIO: f64 = 5.5;

/// User-selectable fusion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionOptions {
    /// Overrides the ratio derived from pixel sizes.
    pub ratio: Option<f64>,
    /// First-pass center-cell level.
    pub level: Level,
    /// Second-pass center-cell level.
    pub level2: Level,
    /// First-pass modulation.
    pub modulation: Modulation,
    /// Second-pass modulation.
    pub modulation2: Modulation,
    /// Requests a second pass, subject to the ratio gate.
    pub two_pass: bool,
    /// Requests histogram matching of the fused result.
    pub histogram_match: bool,
}

impl Default for FusionOptions {
    fn default() -> Self {
        Self {
            ratio: None,
            level: Level::Low,
            level2: Level::Low,
            modulation: Modulation::Mid,
            modulation2: Modulation::Mid,
            two_pass: false,
            histogram_match: false,
        }
    }
}

impl FusionOptions {
    /// Options for `ratio` with everything else at defaults.
    pub fn with_ratio(ratio: f64) -> Self {
        Self {
            ratio: Some(ratio),
            ..Self::default()
        }
    }

    /// Ratio to resolve: the explicit override, else `derived`.
    pub fn effective_ratio(&self, derived: Option<f64>) -> Option<f64> {
        self.ratio.or(derived)
    }
}

/// Contents of a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Fusion options.
    pub options: FusionOptions,
    /// Replacement tables, canonical ones when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<FusionTables>,
}

impl FusionConfig {
    /// Loads a config file.
    pub fn from_file(path: impl AsRef<Path>) -> HpfaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HpfaError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        debug!(path = %path.display(), "Loading fusion config");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parses YAML and validates any pinned tables.
    pub fn from_yaml_str(yaml: &str) -> HpfaResult<Self> {
        let config: FusionConfig = serde_yaml::from_str(yaml)?;
        if let Some(tables) = &config.tables {
            tables.validate()?;
        }
        Ok(config)
    }

    /// Serializes to YAML.
    pub fn to_yaml(&self) -> HpfaResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Active tables.
    pub fn tables(&self) -> &FusionTables {
        self.tables.as_ref().unwrap_or_else(|| FusionTables::canonical())
    }
}
