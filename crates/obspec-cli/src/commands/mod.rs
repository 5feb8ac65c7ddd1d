//! CLI command implementations.

pub mod curl;
pub mod facets;
pub mod python;
pub mod specs;
pub mod sql;
pub mod stats;

use std::path::Path;

use obspec::{ApiTarget, ObspecConfig};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Load the configuration file, or defaults, then overlay `DC_API_ROOT` and
/// `DC_API_KEY` from the environment.
pub fn load_config(path: Option<&Path>) -> Result<ObspecConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => ObspecConfig::load(path)?,
        None => ObspecConfig::default(),
    };
    let config = config.overlay_env(|key| std::env::var(key).ok());
    debug!(api_root = %config.api.api_root, locale = %config.locale, "using configuration");
    Ok(config)
}

/// Parse a JSON input file.
pub fn read_json<T: DeserializeOwned>(file: &Path) -> Result<T, Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }
    let content = std::fs::read_to_string(file)?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse '{}': {}", file.display(), e).into())
}

/// Snippet target: the `--api-root` flag, else the configured api root.
pub fn snippet_target(api_root: Option<String>, config: &ObspecConfig) -> ApiTarget {
    ApiTarget::with_api_root(api_root.unwrap_or_else(|| config.api.api_root.clone()))
}
