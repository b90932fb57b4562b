//! Command implementations.

mod analyze;
mod info;
mod simulate;
mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::AnalysisConfig;

use crate::error::CliError;

pub use analyze::run_analyze;
pub use info::run_info;
pub use simulate::run_simulate;
pub use validate::run_validate;

/// Load the analysis configuration, falling back to defaults without a path
pub(crate) fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(CliError::config_not_found(path).into());
        }
    }
    config_loader::ConfigLoader::load_or_default(path).with_context(|| match path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to build default config".to_string(),
    })
}
