//! Time-series shapes returned by the observation endpoints.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Dcid, FacetId, StatMetadata};

/// A single dated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: String,
    pub value: f64,
}

impl Observation {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }
}

/// Observations of one stat var for one entity from a single facet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet: Option<FacetId>,
    /// Observations sorted by date.
    #[serde(default)]
    pub series: Vec<Observation>,
}

/// Series keyed by entity.
pub type EntitySeries = IndexMap<Dcid, Series>;

/// Response of `/api/observations/series`: one preferred series per
/// stat var and entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesApiResponse {
    #[serde(default)]
    pub data: HashMap<Dcid, EntitySeries>,
    #[serde(default)]
    pub facets: HashMap<FacetId, StatMetadata>,
}

/// Response of `/api/observations/series/all`: every available series per
/// stat var and entity, best first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesAllApiResponse {
    #[serde(default)]
    pub data: HashMap<Dcid, HashMap<Dcid, Vec<Series>>>,
    #[serde(default)]
    pub facets: HashMap<FacetId, StatMetadata>,
}

/// Date → value series of one stat var for one place, as served by the
/// stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceSeries {
    /// Values keyed by date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
    #[serde(default)]
    pub data: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance_url: Option<String>,
}

impl PlaceSeries {
    /// Build a series from `(date, value)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            data: pairs.into_iter().map(|(d, v)| (d.into(), v)).collect(),
            ..Self::default()
        }
    }

    /// Set the place name.
    pub fn with_place_name(mut self, name: impl Into<String>) -> Self {
        self.place_name = Some(name.into());
        self
    }

    /// Set the provenance URL.
    pub fn with_provenance_url(mut self, url: impl Into<String>) -> Self {
        self.provenance_url = Some(url.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Place → series map for a single stat var.
pub type PlaceSeriesMap = IndexMap<Dcid, PlaceSeries>;
