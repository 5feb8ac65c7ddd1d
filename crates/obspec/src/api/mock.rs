//! In-memory API for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ObspecError, Result};
use crate::metadata::{Provenance, StatVarProvenanceSummaries};
use crate::types::{
    Dcid, EntitySeries, PlaceSeriesMap, SeriesAllApiResponse, SeriesApiResponse,
};

use super::provider::DataCommonsApi;

/// Mock API that serves fixtures and records every call.
///
/// Unknown nodes get empty answers, like the real endpoints. Methods named
/// with [`MockApi::failing`] return a 500 error instead.
#[derive(Default)]
pub struct MockApi {
    provenances: HashMap<String, Provenance>,
    variable_info: HashMap<Dcid, StatVarProvenanceSummaries>,
    node_values: HashMap<(String, String), String>,
    variable_paths: HashMap<Dcid, Vec<String>>,
    group_names: HashMap<String, String>,
    stats: HashMap<Dcid, PlaceSeriesMap>,
    series_all: SeriesAllApiResponse,
    series: SeriesApiResponse,
    display_names: HashMap<Dcid, String>,
    failing: HashSet<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl MockApi {
    /// Create a new mock with no fixtures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Triples of a provenance node.
    pub fn with_provenance(mut self, dcid: impl Into<String>, provenance: Provenance) -> Self {
        self.provenances.insert(dcid.into(), provenance);
        self
    }

    /// Provenance summaries of a stat var.
    pub fn with_variable_info(mut self, stat_var: Dcid, info: StatVarProvenanceSummaries) -> Self {
        self.variable_info.insert(stat_var, info);
        self
    }

    /// Value of `prop` on node `dcid`.
    pub fn with_node_value(
        mut self,
        dcid: impl Into<String>,
        prop: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.node_values
            .insert((dcid.into(), prop.into()), value.into());
        self
    }

    /// Stat var group path, root first.
    pub fn with_variable_path(mut self, stat_var: Dcid, path: Vec<String>) -> Self {
        self.variable_paths.insert(stat_var, path);
        self
    }

    /// Absolute name of a stat var group.
    pub fn with_group_name(mut self, group: impl Into<String>, name: impl Into<String>) -> Self {
        self.group_names.insert(group.into(), name.into());
        self
    }

    /// Stats endpoint data for a stat var.
    pub fn with_stats(mut self, stat_var: Dcid, data: PlaceSeriesMap) -> Self {
        self.stats.insert(stat_var, data);
        self
    }

    /// Response of the series/all endpoint; filtered per request.
    pub fn with_series_all(mut self, response: SeriesAllApiResponse) -> Self {
        self.series_all = response;
        self
    }

    /// Response of the series endpoint; filtered per request.
    pub fn with_series(mut self, response: SeriesApiResponse) -> Self {
        self.series = response;
        self
    }

    /// Display name of a place.
    pub fn with_display_name(mut self, place: Dcid, name: impl Into<String>) -> Self {
        self.display_names.insert(place, name.into());
        self
    }

    /// Make a trait method fail, e.g. `"variable_info"`.
    pub fn failing(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    /// Calls made so far, as `method:argument`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        let prefix = format!("{}:", method);
        self.calls()
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }

    fn record(&self, method: &'static str, argument: String) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{}:{}", method, argument));
        }
        if self.failing.contains(method) {
            return Err(ObspecError::Api {
                status: 500,
                url: format!("mock://{}", method),
                body: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

fn joined<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl DataCommonsApi for MockApi {
    async fn node_triples_out(&self, dcid: &str) -> Result<Provenance> {
        self.record("node_triples_out", dcid.to_string())?;
        Ok(self.provenances.get(dcid).cloned().unwrap_or_default())
    }

    async fn variable_info(
        &self,
        stat_vars: &[Dcid],
    ) -> Result<HashMap<Dcid, StatVarProvenanceSummaries>> {
        self.record("variable_info", joined(stat_vars))?;
        Ok(stat_vars
            .iter()
            .filter_map(|sv| self.variable_info.get(sv).map(|i| (sv.clone(), i.clone())))
            .collect())
    }

    async fn first_node_values(
        &self,
        dcids: &[String],
        prop: &str,
    ) -> Result<HashMap<String, Option<String>>> {
        self.record("first_node_values", format!("{}|{}", prop, joined(dcids)))?;
        Ok(dcids
            .iter()
            .map(|dcid| {
                let value = self
                    .node_values
                    .get(&(dcid.clone(), prop.to_string()))
                    .cloned();
                (dcid.clone(), value)
            })
            .collect())
    }

    async fn variable_path(&self, stat_var: &Dcid) -> Result<Vec<String>> {
        self.record("variable_path", stat_var.to_string())?;
        Ok(self.variable_paths.get(stat_var).cloned().unwrap_or_default())
    }

    async fn variable_group_name(&self, group: &str) -> Result<Option<String>> {
        self.record("variable_group_name", group.to_string())?;
        Ok(self.group_names.get(group).cloned())
    }

    async fn stats(&self, stat_var: &Dcid, places: &[Dcid]) -> Result<PlaceSeriesMap> {
        self.record("stats", format!("{}|{}", stat_var, joined(places)))?;
        let Some(data) = self.stats.get(stat_var) else {
            return Ok(PlaceSeriesMap::new());
        };
        Ok(places
            .iter()
            .filter_map(|place| data.get(place).map(|s| (place.clone(), s.clone())))
            .collect())
    }

    async fn series_all(
        &self,
        entities: &[Dcid],
        variables: &[Dcid],
    ) -> Result<SeriesAllApiResponse> {
        self.record(
            "series_all",
            format!("{}|{}", joined(variables), joined(entities)),
        )?;
        let mut response = SeriesAllApiResponse {
            facets: self.series_all.facets.clone(),
            ..Default::default()
        };
        for variable in variables {
            let Some(by_entity) = self.series_all.data.get(variable) else {
                continue;
            };
            let filtered = entities
                .iter()
                .filter_map(|e| by_entity.get(e).map(|s| (e.clone(), s.clone())))
                .collect();
            response.data.insert(variable.clone(), filtered);
        }
        Ok(response)
    }

    async fn series(&self, entities: &[Dcid], variables: &[Dcid]) -> Result<SeriesApiResponse> {
        self.record(
            "series",
            format!("{}|{}", joined(variables), joined(entities)),
        )?;
        let mut response = SeriesApiResponse {
            facets: self.series.facets.clone(),
            ..Default::default()
        };
        for variable in variables {
            let Some(by_entity) = self.series.data.get(variable) else {
                continue;
            };
            let filtered: EntitySeries = entities
                .iter()
                .filter_map(|e| by_entity.get(e).map(|s| (e.clone(), s.clone())))
                .collect();
            response.data.insert(variable.clone(), filtered);
        }
        Ok(response)
    }

    async fn place_display_names(&self, places: &[Dcid]) -> Result<HashMap<Dcid, String>> {
        self.record("place_display_names", joined(places))?;
        Ok(places
            .iter()
            .filter_map(|p| self.display_names.get(p).map(|n| (p.clone(), n.clone())))
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlaceSeries;

    #[tokio::test]
    async fn test_mock_records_calls_and_filters() {
        let sv = Dcid::new("Count_Person").unwrap();
        let ca = Dcid::new("geoId/06").unwrap();
        let mut data = PlaceSeriesMap::new();
        data.insert(ca.clone(), PlaceSeries::from_pairs([("2020", 1.0)]));
        let api = MockApi::new().with_stats(sv.clone(), data);

        let got = api
            .stats(&sv, &[ca.clone(), Dcid::new("geoId/48").unwrap()])
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(api.call_count("stats"), 1);
        assert_eq!(api.calls(), vec!["stats:Count_Person|geoId/06,geoId/48"]);
        assert_eq!(api.name(), "mock");
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let api = MockApi::new().failing("variable_path");
        let err = api
            .variable_path(&Dcid::new("Count_Person").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ObspecError::Api { status: 500, .. }));
    }
}
