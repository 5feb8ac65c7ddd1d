//! Configuration for API access and metadata enrichment.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ObspecError, Result};
use crate::percapita::DEFAULT_POPULATION_DCID;
use crate::spec::DEFAULT_API_ENDPOINT;

/// Environment variable overriding the api root.
pub const API_ROOT_ENV: &str = "DC_API_ROOT";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "DC_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObspecConfig {
    /// API access.
    pub api: ApiConfig,
    /// Metadata enrichment policy.
    pub enrichment: EnrichmentConfig,
    /// Denominator used for per-capita values.
    pub population_dcid: String,
    /// Locale of generated text.
    pub locale: String,
}

impl Default for ObspecConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            enrichment: EnrichmentConfig::default(),
            population_dcid: DEFAULT_POPULATION_DCID.to_string(),
            locale: "en".to_string(),
        }
    }
}

/// Where and how to reach the website API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root the `/api/...` paths are resolved against.
    pub api_root: String,
    /// Sent as `X-API-Key` when set.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds. Unset leaves the transport default.
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

/// Provenances whose enrichment fields are known to be wrong.
///
/// Both lists are empty unless configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Provenance names whose series date ranges are not copied.
    pub date_range_suppressed: Vec<String>,
    /// Provenance names whose measurement method descriptions are not copied.
    pub measurement_method_suppressed: Vec<String>,
}

impl EnrichmentConfig {
    /// Whether date ranges of this provenance should be dropped.
    pub fn suppresses_date_range(&self, provenance_name: &str) -> bool {
        self.date_range_suppressed.iter().any(|p| p == provenance_name)
    }

    /// Whether measurement method descriptions of this provenance should be dropped.
    pub fn suppresses_measurement_method(&self, provenance_name: &str) -> bool {
        self.measurement_method_suppressed
            .iter()
            .any(|p| p == provenance_name)
    }
}

impl ObspecConfig {
    /// Read a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ObspecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ObspecError::Config(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        debug!(path = %path.display(), api_root = %config.api.api_root, "loaded config");
        Ok(config)
    }

    /// Defaults overlaid with `DC_API_ROOT` / `DC_API_KEY`.
    pub fn from_env() -> Self {
        Self::default().overlay_env(|key| std::env::var(key).ok())
    }

    /// Overlay api settings from an environment lookup.
    pub fn overlay_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(API_ROOT_ENV).filter(|v| !v.is_empty()) {
            self.api.api_root = root;
        }
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.api.api_key = Some(key);
        }
        self
    }

    /// Set the api root.
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api.api_root = api_root.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api.api_key = Some(api_key.into());
        self
    }

    /// Set the enrichment policy.
    pub fn with_enrichment(mut self, enrichment: EnrichmentConfig) -> Self {
        self.enrichment = enrichment;
        self
    }

    /// Set the locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ObspecConfig::default();
        assert_eq!(config.api.api_root, "https://datacommons.org");
        assert_eq!(config.population_dcid, "Count_Person");
        assert_eq!(config.locale, "en");
        assert!(config.api.api_key.is_none());
        assert!(config.api.timeout_secs.is_none());
        assert!(config.enrichment.date_range_suppressed.is_empty());
        assert!(config.enrichment.measurement_method_suppressed.is_empty());
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obspec.toml");
        std::fs::write(
            &path,
            r#"
locale = "fr"

[api]
api_root = "https://dc.example.org"
timeout_secs = 5

[enrichment]
date_range_suppressed = ["SourceA"]
"#,
        )
        .unwrap();

        let config = ObspecConfig::load(&path).unwrap();
        assert_eq!(config.locale, "fr");
        assert_eq!(config.api.api_root, "https://dc.example.org");
        assert_eq!(config.api.timeout_secs, Some(5));
        assert!(config.enrichment.suppresses_date_range("SourceA"));
        assert!(config.enrichment.measurement_method_suppressed.is_empty());
        assert_eq!(config.population_dcid, "Count_Person");
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "locale = [").unwrap();
        assert!(matches!(
            ObspecConfig::load(&path),
            Err(ObspecError::Config(_))
        ));
    }

    #[test]
    fn test_overlay_env() {
        let config = ObspecConfig::default().overlay_env(|key| match key {
            API_ROOT_ENV => Some("https://dc.example.org".to_string()),
            API_KEY_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.api.api_root, "https://dc.example.org");
        assert!(config.api.api_key.is_none());
    }
}
