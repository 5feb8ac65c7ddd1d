//! Data path of the timeline tool.
//!
//! [`fetch_raw_data`] loads every available series once; [`get_stat_data`]
//! then selects one series per (stat var, place) for a chart, optionally as
//! a ratio against a denominator. Delta and year-window transforms operate
//! on the selected data.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::DataCommonsApi;
use crate::error::Result;
use crate::percapita::compute_ratio;
use crate::types::{
    Dcid, EntitySeries, FacetId, FacetResponse, Observation, Series, SeriesAllApiResponse,
    SeriesApiResponse, StatMetadata,
};

/// Everything the timeline tool needs before chart options are applied.
#[derive(Debug, Clone, Default)]
pub struct TimelineRawData {
    pub display_names: HashMap<Dcid, String>,
    /// Metadata of every facet seen per stat var.
    pub metadata_map: FacetResponse,
    /// All series per stat var and place, best first.
    pub stat_all_data: SeriesAllApiResponse,
    /// Preferred denominator series per place. Empty without a denominator.
    pub denom_data: SeriesApiResponse,
}

/// Fetch all series of the stat vars, the denominator series and the place
/// display names concurrently.
pub async fn fetch_raw_data(
    api: &dyn DataCommonsApi,
    places: &[Dcid],
    stat_vars: &[Dcid],
    denom: Option<&Dcid>,
) -> Result<TimelineRawData> {
    debug!(
        places = places.len(),
        stat_vars = stat_vars.len(),
        denom = denom.map(Dcid::as_str),
        "fetching timeline data"
    );
    let denom_request = async {
        match denom {
            Some(denom) => api.series(places, std::slice::from_ref(denom)).await,
            None => Ok(SeriesApiResponse::default()),
        }
    };
    let (denom_data, display_names, stat_all_data) = tokio::try_join!(
        denom_request,
        api.place_display_names(places),
        api.series_all(places, stat_vars),
    )?;

    let mut metadata_map = FacetResponse::new();
    for stat_var in stat_vars {
        let Some(by_place) = stat_all_data.data.get(stat_var) else {
            continue;
        };
        for place in places {
            for series in by_place.get(place).into_iter().flatten() {
                let Some(facet) = &series.facet else {
                    continue;
                };
                let metadata = stat_all_data.facets.get(facet).cloned().unwrap_or_default();
                metadata_map.insert(stat_var.clone(), facet.clone(), metadata);
            }
        }
    }

    Ok(TimelineRawData {
        display_names,
        metadata_map,
        stat_all_data,
        denom_data,
    })
}

/// Series selected for a timeline chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStatData {
    pub places: Vec<Dcid>,
    pub stat_vars: Vec<Dcid>,
    /// Every date with data, ascending.
    pub dates: Vec<String>,
    pub sources: BTreeSet<String>,
    pub measurement_methods: BTreeSet<String>,
    /// Keyed by stat var, then place.
    pub data: IndexMap<Dcid, EntitySeries>,
    /// Metadata of the numerator facets.
    pub facets: HashMap<FacetId, StatMetadata>,
    pub display_names: HashMap<Dcid, String>,
}

/// Options of [`get_stat_data`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioOptions {
    pub denom: Option<Dcid>,
    /// Ratios are per `scaling` units of the denominator.
    pub scaling: f64,
}

impl RatioOptions {
    pub fn new(denom: Dcid, scaling: f64) -> Self {
        Self {
            denom: Some(denom),
            scaling,
        }
    }
}

/// Pick the series of a (stat var, place) pair: the best one, or the one of
/// the pinned facet. An empty series ends the search.
fn select_series<'a>(candidates: &'a [Series], pinned: Option<&str>) -> Option<&'a Series> {
    for series in candidates {
        if series.series.is_empty() {
            return None;
        }
        match pinned {
            None => return Some(series),
            Some(facet) if series.facet.as_deref() == Some(facet) => return Some(series),
            Some(_) => {}
        }
    }
    None
}

fn facet_metadata<'a>(raw: &'a TimelineRawData, facet: &str) -> Option<&'a StatMetadata> {
    raw.stat_all_data
        .facets
        .get(facet)
        .or_else(|| raw.denom_data.facets.get(facet))
}

/// Select one series per (stat var, place).
///
/// `metahash_map` pins a stat var to a facet. With `ratio`, each series is
/// divided by the place's denominator series and places without one are
/// skipped. Stat vars with no selected series are left out of `data`.
pub fn get_stat_data(
    raw: &TimelineRawData,
    places: &[Dcid],
    stat_vars: &[Dcid],
    metahash_map: &HashMap<Dcid, String>,
    ratio: Option<&RatioOptions>,
) -> TimelineStatData {
    let mut result = TimelineStatData {
        places: places.to_vec(),
        stat_vars: stat_vars.to_vec(),
        facets: raw.stat_all_data.facets.clone(),
        display_names: raw.display_names.clone(),
        ..TimelineStatData::default()
    };
    let denom = ratio.and_then(|r| r.denom.as_ref().map(|d| (d, r.scaling)));
    let mut dates = BTreeSet::new();

    for stat_var in stat_vars {
        let pinned = metahash_map
            .get(stat_var)
            .map(String::as_str)
            .filter(|hash| !hash.is_empty());
        let mut by_place = EntitySeries::new();
        for place in places {
            let candidates = raw
                .stat_all_data
                .data
                .get(stat_var)
                .and_then(|by_place| by_place.get(place))
                .map(Vec::as_slice)
                .unwrap_or_default();
            let Some(selected) = select_series(candidates, pinned) else {
                continue;
            };
            let mut selected = selected.clone();

            if let Some((denom, scaling)) = denom {
                let Some(denom_series) = raw
                    .denom_data
                    .data
                    .get(denom)
                    .and_then(|by_place| by_place.get(place))
                else {
                    debug!(place = %place, denom = %denom, "no denominator series, skipping place");
                    continue;
                };
                selected.series = compute_ratio(&selected.series, &denom_series.series, scaling);
                let url = denom_series
                    .facet
                    .as_deref()
                    .and_then(|facet| facet_metadata(raw, facet))
                    .and_then(|m| m.provenance_url.clone());
                if let Some(url) = url {
                    result.sources.insert(url);
                }
            }
            by_place.insert(place.clone(), selected);
        }
        if by_place.is_empty() {
            continue;
        }

        for series in by_place.values() {
            let metadata = series
                .facet
                .as_deref()
                .and_then(|facet| facet_metadata(raw, facet));
            if let Some(metadata) = metadata {
                if let Some(url) = &metadata.provenance_url {
                    result.sources.insert(url.clone());
                }
                if let Some(method) = &metadata.measurement_method {
                    result.measurement_methods.insert(method.clone());
                }
            }
            dates.extend(series.series.iter().map(|obs| obs.date.clone()));
        }
        result.data.insert(stat_var.clone(), by_place);
    }
    result.dates = dates.into_iter().collect();
    result
}

fn remove_date(dates: &mut Vec<String>, date: &str) {
    if let Some(index) = dates.iter().position(|d| d == date) {
        dates.remove(index);
    }
}

impl TimelineStatData {
    /// Differences between consecutive observations of every series. The
    /// first date of each series no longer has a value and is dropped from
    /// `dates`.
    pub fn convert_to_delta(&self) -> Self {
        let mut result = self.clone();
        for by_place in result.data.values_mut() {
            for series in by_place.values_mut() {
                let delta = series
                    .series
                    .windows(2)
                    .map(|pair| Observation::new(pair[1].date.clone(), pair[1].value - pair[0].value))
                    .collect();
                if let Some(first) = series.series.first() {
                    remove_date(&mut result.dates, &first.date);
                }
                series.series = delta;
            }
        }
        result
    }

    /// Keep observations whose year is at least `min_year` and whose date is
    /// at most `max_year`. Dropped dates are removed from `dates`.
    pub fn shorten(&self, min_year: Option<&str>, max_year: Option<&str>) -> Self {
        let mut result = self.clone();
        for by_place in result.data.values_mut() {
            for series in by_place.values_mut() {
                let mut kept = Vec::with_capacity(series.series.len());
                for obs in series.series.drain(..) {
                    let year = obs.date.get(..4).unwrap_or(obs.date.as_str());
                    let too_early = min_year.is_some_and(|min| year < min);
                    let too_late = max_year.is_some_and(|max| obs.date.as_str() > max);
                    if too_early || too_late {
                        remove_date(&mut result.dates, &obs.date);
                    } else {
                        kept.push(obs);
                    }
                }
                series.series = kept;
            }
        }
        result
    }
}
