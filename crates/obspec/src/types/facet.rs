//! Facet metadata and the maps that key it by stat var.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::Dcid;

/// Identifier of a facet as returned by the observation API.
pub type FacetId = String;

/// Metadata describing one facet: a specific source, measurement method,
/// unit, observation period and scaling factor for a stat var's observations.
///
/// The enrichment fields (`source_name` and below) start out empty and are
/// filled by the metadata fetcher when the lookups succeed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation_period: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling_factor: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_dc_aggregate: Option<bool>,

    /// Name of the organisation publishing the data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// Human-readable name of the import.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance_name: Option<String>,

    /// Earliest observation date of the matched series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range_start: Option<String>,

    /// Latest observation date of the matched series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range_end: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_method_description: Option<String>,
}

impl StatMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the import name.
    pub fn with_import_name(mut self, name: impl Into<String>) -> Self {
        self.import_name = Some(name.into());
        self
    }

    /// Set the measurement method.
    pub fn with_measurement_method(mut self, method: impl Into<String>) -> Self {
        self.measurement_method = Some(method.into());
        self
    }

    /// Set the observation period.
    pub fn with_observation_period(mut self, period: impl Into<String>) -> Self {
        self.observation_period = Some(period.into());
        self
    }

    /// Set the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the scaling factor.
    pub fn with_scaling_factor(mut self, factor: impl Into<String>) -> Self {
        self.scaling_factor = Some(factor.into());
        self
    }

    /// Set the provenance URL.
    pub fn with_provenance_url(mut self, url: impl Into<String>) -> Self {
        self.provenance_url = Some(url.into());
        self
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Facet metadata keyed by stat var, then by facet id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetResponse(IndexMap<Dcid, IndexMap<FacetId, StatMetadata>>);

impl FacetResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a facet for a stat var, replacing any previous entry.
    pub fn insert(&mut self, stat_var: Dcid, facet_id: impl Into<FacetId>, metadata: StatMetadata) {
        self.0
            .entry(stat_var)
            .or_default()
            .insert(facet_id.into(), metadata);
    }

    /// Builder form of [`FacetResponse::insert`].
    pub fn with_facet(mut self, stat_var: Dcid, facet_id: impl Into<FacetId>, metadata: StatMetadata) -> Self {
        self.insert(stat_var, facet_id, metadata);
        self
    }

    pub fn get(&self, stat_var: &str, facet_id: &str) -> Option<&StatMetadata> {
        self.0.get(stat_var).and_then(|facets| facets.get(facet_id))
    }

    pub fn get_mut(&mut self, stat_var: &str, facet_id: &str) -> Option<&mut StatMetadata> {
        self.0.get_mut(stat_var).and_then(|facets| facets.get_mut(facet_id))
    }

    /// Facets of one stat var.
    pub fn facets(&self, stat_var: &str) -> Option<&IndexMap<FacetId, StatMetadata>> {
        self.0.get(stat_var)
    }

    pub fn stat_vars(&self) -> impl Iterator<Item = &Dcid> {
        self.0.keys()
    }

    /// Iterate `(stat var, facet id, metadata)` triples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Dcid, &FacetId, &StatMetadata)> {
        self.0
            .iter()
            .flat_map(|(sv, facets)| facets.iter().map(move |(id, meta)| (sv, id, meta)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Dcid, &FacetId, &mut StatMetadata)> {
        self.0
            .iter_mut()
            .flat_map(|(sv, facets)| facets.iter_mut().map(move |(id, meta)| (&*sv, &*id, meta)))
    }

    /// Number of facets across all stat vars.
    pub fn len(&self) -> usize {
        self.0.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The stat var → facet id sets implied by this response.
    pub fn facet_map(&self) -> StatVarFacetMap {
        let mut map = StatVarFacetMap::new();
        for (sv, id, _) in self.iter() {
            map.insert(sv.clone(), id.clone());
        }
        map
    }
}

/// Facet ids selected for each stat var.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatVarFacetMap(IndexMap<Dcid, IndexSet<FacetId>>);

impl StatVarFacetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a facet id to a stat var's set.
    pub fn insert(&mut self, stat_var: Dcid, facet_id: impl Into<FacetId>) {
        self.0.entry(stat_var).or_default().insert(facet_id.into());
    }

    /// Builder form of [`StatVarFacetMap::insert`].
    pub fn with(mut self, stat_var: Dcid, facet_id: impl Into<FacetId>) -> Self {
        self.insert(stat_var, facet_id);
        self
    }

    /// Facet ids for a stat var; `None` when it has no entry or an empty set.
    pub fn facet_ids(&self, stat_var: &str) -> Option<&IndexSet<FacetId>> {
        self.0.get(stat_var).filter(|set| !set.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Dcid, &IndexSet<FacetId>)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
