//! reqwest-backed client of the website API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::{ApiConfig, ObspecConfig};
use crate::error::{ObspecError, Result};
use crate::metadata::{Provenance, StatVarProvenanceSummaries, TripleNode};
use crate::types::{Dcid, PlaceSeries, PlaceSeriesMap, SeriesAllApiResponse, SeriesApiResponse};

use super::provider::DataCommonsApi;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "X-API-Key";

/// HTTP client for a Data Commons website.
pub struct HttpApi {
    client: Client,
    api_root: String,
    api_key: Option<String>,
}

impl HttpApi {
    /// Create a client from API settings.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ObspecError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_root: config.api_root.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Create from `DC_API_ROOT` / `DC_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::new(&ObspecConfig::from_env().api)
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            headers.insert(
                API_KEY_HEADER,
                HeaderValue::from_str(key)
                    .map_err(|e| ObspecError::Config(format!("Invalid API key: {}", e)))?,
            );
        }
        Ok(headers)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, params = query.len(), "GET");
        let response = self
            .client
            .get(&url)
            .headers(self.build_headers()?)
            .query(query)
            .send()
            .await?;
        Self::parse(response, url).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .json(body)
            .send()
            .await?;
        Self::parse(response, url).await
    }

    async fn parse<T: DeserializeOwned>(response: Response, url: String) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ObspecError::Api {
                status: status.as_u16(),
                url,
                body,
            });
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Repeat a query key once per value.
fn repeated<'a, S: AsRef<str>>(key: &'a str, values: &'a [S]) -> Vec<(&'a str, &'a str)> {
    values.iter().map(|v| (key, v.as_ref())).collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariableGroupInfo {
    #[serde(default)]
    absolute_name: Option<String>,
}

#[async_trait]
impl DataCommonsApi for HttpApi {
    async fn node_triples_out(&self, dcid: &str) -> Result<Provenance> {
        self.get_json(&format!("/api/node/triples/out/{}", dcid), &[])
            .await
    }

    async fn variable_info(
        &self,
        stat_vars: &[Dcid],
    ) -> Result<HashMap<Dcid, StatVarProvenanceSummaries>> {
        if stat_vars.is_empty() {
            return Ok(HashMap::new());
        }
        self.get_json("/api/variable/info", &repeated("dcids", stat_vars))
            .await
    }

    async fn first_node_values(
        &self,
        dcids: &[String],
        prop: &str,
    ) -> Result<HashMap<String, Option<String>>> {
        if dcids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut query = repeated("dcids", dcids);
        query.push(("prop", prop));
        let propvals: HashMap<String, Vec<TripleNode>> =
            self.get_json("/api/node/propvals/out", &query).await?;
        Ok(propvals
            .into_iter()
            .map(|(dcid, nodes)| (dcid, nodes.into_iter().next().and_then(|n| n.value)))
            .collect())
    }

    async fn variable_path(&self, stat_var: &Dcid) -> Result<Vec<String>> {
        self.get_json("/api/variable/path", &[("dcid", stat_var.as_str())])
            .await
    }

    async fn variable_group_name(&self, group: &str) -> Result<Option<String>> {
        let body = json!({
            "dcid": group,
            "entities": [],
            "numEntitiesExistence": 0
        });
        let info: VariableGroupInfo = self.post_json("/api/variable-group/info", &body).await?;
        Ok(info.absolute_name.filter(|name| !name.is_empty()))
    }

    async fn stats(&self, stat_var: &Dcid, places: &[Dcid]) -> Result<PlaceSeriesMap> {
        let response: IndexMap<Dcid, Option<PlaceSeries>> = self
            .get_json(&format!("/api/stats/{}", stat_var), &repeated("dcid", places))
            .await?;
        Ok(response
            .into_iter()
            .filter_map(|(place, series)| series.map(|s| (place, s)))
            .collect())
    }

    async fn series_all(
        &self,
        entities: &[Dcid],
        variables: &[Dcid],
    ) -> Result<SeriesAllApiResponse> {
        let mut query = repeated("entities", entities);
        query.extend(repeated("variables", variables));
        self.get_json("/api/observations/series/all", &query).await
    }

    async fn series(&self, entities: &[Dcid], variables: &[Dcid]) -> Result<SeriesApiResponse> {
        let mut query = repeated("entities", entities);
        query.extend(repeated("variables", variables));
        self.get_json("/api/observations/series", &query).await
    }

    async fn place_display_names(&self, places: &[Dcid]) -> Result<HashMap<Dcid, String>> {
        if places.is_empty() {
            return Ok(HashMap::new());
        }
        self.get_json("/api/place/displayname", &repeated("dcid", places))
            .await
    }

    fn name(&self) -> &str {
        "http"
    }
}
