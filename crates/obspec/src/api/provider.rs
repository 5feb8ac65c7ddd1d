//! The website API surface used by the fetchers.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::metadata::{Provenance, StatVarProvenanceSummaries};
use crate::types::{Dcid, PlaceSeriesMap, SeriesAllApiResponse, SeriesApiResponse};

/// Lookups against the Data Commons website API.
///
/// Implementations must be thread-safe (Send + Sync) so that one client
/// can serve concurrent fan-out requests.
#[async_trait]
pub trait DataCommonsApi: Send + Sync {
    /// Outgoing triples of a node, e.g. a provenance `dc/base/{importName}`.
    ///
    /// `GET /api/node/triples/out/{dcid}`
    async fn node_triples_out(&self, dcid: &str) -> Result<Provenance>;

    /// Provenance and series summaries of stat vars.
    ///
    /// `GET /api/variable/info?dcids=..`
    async fn variable_info(
        &self,
        stat_vars: &[Dcid],
    ) -> Result<HashMap<Dcid, StatVarProvenanceSummaries>>;

    /// First value of a property for each node. Nodes without the property
    /// map to `None`.
    ///
    /// `GET /api/node/propvals/out?dcids=..&prop=..`
    async fn first_node_values(
        &self,
        dcids: &[String],
        prop: &str,
    ) -> Result<HashMap<String, Option<String>>>;

    /// Path of stat var groups from the root to a stat var.
    ///
    /// `GET /api/variable/path?dcid=..`
    async fn variable_path(&self, stat_var: &Dcid) -> Result<Vec<String>>;

    /// Absolute display name of a stat var group.
    ///
    /// `POST /api/variable-group/info`
    async fn variable_group_name(&self, group: &str) -> Result<Option<String>>;

    /// Date → value series of one stat var for the given places.
    ///
    /// `GET /api/stats/{statVar}?dcid=..`
    async fn stats(&self, stat_var: &Dcid, places: &[Dcid]) -> Result<PlaceSeriesMap>;

    /// Every available series of the stat vars for the entities.
    ///
    /// `GET /api/observations/series/all?entities=..&variables=..`
    async fn series_all(
        &self,
        entities: &[Dcid],
        variables: &[Dcid],
    ) -> Result<SeriesAllApiResponse>;

    /// Preferred series of the stat vars for the entities.
    ///
    /// `GET /api/observations/series?entities=..&variables=..`
    async fn series(&self, entities: &[Dcid], variables: &[Dcid]) -> Result<SeriesApiResponse>;

    /// Display names of places.
    ///
    /// `GET /api/place/displayname?dcid=..`
    async fn place_display_names(&self, places: &[Dcid]) -> Result<HashMap<Dcid, String>>;

    /// Get the client name for logging.
    fn name(&self) -> &str;
}
