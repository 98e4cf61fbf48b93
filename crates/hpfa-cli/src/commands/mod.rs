//! CLI command implementations

pub mod kernel;
pub mod plan;
pub mod tables;
pub mod weight;

use anyhow::{Context, Result};
use hpfa_core::FusionConfig;
use std::path::Path;

/// Load config from path, or defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<FusionConfig> {
    match path {
        Some(path) => FusionConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(FusionConfig::default()),
    }
}
