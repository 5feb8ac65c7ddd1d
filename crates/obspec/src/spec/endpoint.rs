//! Resolution of the observation endpoint that generated snippets call.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Website root of the public instance.
pub const DEFAULT_API_ENDPOINT: &str = "https://datacommons.org";

/// Root of the public REST API.
pub const DEFAULT_API_V2_ENDPOINT: &str = "https://api.datacommons.org";

/// Path under which custom instances expose the REST API.
pub const CUSTOM_DC_API_PATH: &str = "/core/api";

/// The site hosting the tools, consulted when no api root is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContext {
    /// Whether the hosting site is a custom instance.
    pub is_custom_dc: bool,
    /// Origin of the hosting site, e.g. `https://dc.example.org`.
    #[serde(default)]
    pub origin: Option<String>,
}

/// Target of generated API snippets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTarget {
    #[serde(default)]
    api_root: Option<String>,
    #[serde(default)]
    host: HostContext,
}

impl ApiTarget {
    /// The public instance, no api root.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Snippets for an explicit api root (web component context).
    pub fn with_api_root(api_root: impl Into<String>) -> Self {
        Self {
            api_root: Some(api_root.into()),
            host: HostContext::default(),
        }
    }

    /// Snippets for the site hosting the tools.
    pub fn hosted(host: HostContext) -> Self {
        Self {
            api_root: None,
            host,
        }
    }

    pub fn api_root(&self) -> Option<&str> {
        self.api_root.as_deref()
    }

    /// Whether this target is a custom instance.
    ///
    /// An api root is standard only if it names one of the default endpoints
    /// (trailing slashes and case ignored).
    pub fn is_custom(&self) -> bool {
        match &self.api_root {
            Some(root) => !is_standard_endpoint(root),
            None => self.host.is_custom_dc,
        }
    }

    /// Full URL of the v2 observation endpoint.
    pub fn observation_url(&self) -> String {
        if !self.is_custom() {
            return format!("{}/v2/observation", DEFAULT_API_V2_ENDPOINT);
        }
        let path = format!("{}/v2/observation", CUSTOM_DC_API_PATH);
        match &self.api_root {
            Some(root) => match Url::parse(root).and_then(|base| base.join(&path)) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    warn!(api_root = %root, error = %e, "api root is not an absolute URL");
                    format!("{}{}", root.trim_end_matches('/'), path)
                }
            },
            None => format!("{}{}", self.host.origin.as_deref().unwrap_or(""), path),
        }
    }

    /// Hostname of a custom api root, if it parses.
    pub fn custom_hostname(&self) -> Option<String> {
        let root = self.api_root.as_deref()?;
        match Url::parse(root) {
            Ok(url) => url.host_str().map(str::to_string),
            Err(e) => {
                warn!(api_root = %root, error = %e, "could not parse hostname from api root");
                None
            }
        }
    }
}

fn normalize_endpoint(url: &str) -> String {
    url.trim_end_matches('/').to_lowercase()
}

fn is_standard_endpoint(endpoint: &str) -> bool {
    let endpoint = normalize_endpoint(endpoint);
    [DEFAULT_API_ENDPOINT, DEFAULT_API_V2_ENDPOINT]
        .iter()
        .any(|standard| normalize_endpoint(standard) == endpoint)
}
