//! Stats fetcher backing place pages and the download tool.
//!
//! One stats request is made per stat var, plus one for the population when
//! per-capita values are requested. The resulting [`StatsData`] offers
//! several groupings of the same values for charting.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use futures::future::try_join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::DataCommonsApi;
use crate::error::{ObspecError, Result};
use crate::locale::LocaleContext;
use crate::percapita::{compute_per_capita_map, DEFAULT_POPULATION_DCID};
use crate::types::{Dcid, PlaceSeriesMap};

/// Number of groups [`StatsData::get_time_group_with_stats_var`] thins to.
const TIME_GROUP_TARGET: usize = 5;

/// One value in a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    /// `None` when there is no observation.
    pub value: Option<f64>,
    /// Milliseconds since the epoch of the point's date, for time axes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
}

impl DataPoint {
    fn new(label: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            label: label.into(),
            value,
            time: None,
        }
    }
}

/// A labelled group of chart values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataGroup {
    pub label: String,
    pub value: Vec<DataPoint>,
}

impl DataGroup {
    pub fn new(label: impl Into<String>, value: Vec<DataPoint>) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Options of [`fetch_stats_data`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatsFetchOptions {
    /// Divide every value by the population of its place.
    pub per_capita: bool,
    /// Per-capita values are per `scaling` people.
    pub scaling: f64,
    /// Stat var used as the population.
    pub population: Dcid,
}

impl Default for StatsFetchOptions {
    fn default() -> Self {
        Self {
            per_capita: false,
            scaling: 1.0,
            population: Dcid::from_static(DEFAULT_POPULATION_DCID),
        }
    }
}

impl StatsFetchOptions {
    /// Per-capita values per `scaling` people.
    pub fn per_capita(scaling: f64) -> Self {
        Self {
            per_capita: true,
            scaling,
            ..Self::default()
        }
    }

    /// Set the population stat var.
    pub fn with_population(mut self, population: Dcid) -> Self {
        self.population = population;
        self
    }
}

/// Time series of several stat vars for several places.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    pub places: Vec<Dcid>,
    pub stat_vars: Vec<Dcid>,
    /// Every date with data, ascending.
    pub dates: Vec<String>,
    /// Keyed by stat var, then place.
    pub data: IndexMap<Dcid, PlaceSeriesMap>,
    /// Provenance URLs of the series.
    pub sources: BTreeSet<String>,
    /// Latest date on which every place with data has a value for every
    /// stat var; the latest date overall when there is none.
    pub latest_common_date: String,
}

/// Fetch series for every (place, stat var) pair.
///
/// The population response is requested after the stat vars and read back
/// by position. Places without population data are left out of per-capita
/// results.
pub async fn fetch_stats_data(
    api: &dyn DataCommonsApi,
    places: &[Dcid],
    stat_vars: &[Dcid],
    options: &StatsFetchOptions,
) -> Result<StatsData> {
    let n = stat_vars.len();
    let mut requested: Vec<&Dcid> = stat_vars.iter().collect();
    if options.per_capita {
        requested.push(&options.population);
    }
    debug!(
        api = api.name(),
        places = places.len(),
        requests = requested.len(),
        per_capita = options.per_capita,
        "fetching stats"
    );

    let (mut responses, display_names) = tokio::try_join!(
        try_join_all(requested.iter().map(|sv| api.stats(sv, places))),
        api.place_display_names(places),
    )?;
    let population = if options.per_capita {
        responses.get(n).cloned()
    } else {
        None
    };

    let mut result = StatsData {
        places: places.to_vec(),
        stat_vars: stat_vars.to_vec(),
        ..StatsData::default()
    };
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    let mut places_with_data: HashSet<Dcid> = HashSet::new();

    for (i, stat_var) in stat_vars.iter().enumerate() {
        let mut series_map = std::mem::take(&mut responses[i]);
        if let Some(population) = &population {
            series_map = compute_per_capita_map(&series_map, population, options.scaling);
        }
        for (place, series) in series_map.iter_mut() {
            if let Some(name) = display_names.get(place) {
                series.place_name = Some(name.clone());
            }
            if !series.is_empty() {
                places_with_data.insert(place.clone());
            }
            if let Some(url) = &series.provenance_url {
                result.sources.insert(url.clone());
            }
            for date in series.data.keys() {
                *occurrences.entry(date.clone()).or_default() += 1;
            }
        }
        result.data.insert(stat_var.clone(), series_map);
    }

    let mut dates: Vec<String> = occurrences.keys().cloned().collect();
    dates.sort();
    let num_places_with_data = places
        .iter()
        .filter(|place| places_with_data.contains(*place))
        .count();
    let complete = num_places_with_data * stat_vars.len();
    result.latest_common_date = dates
        .iter()
        .rev()
        .find(|date| occurrences[*date] == complete)
        .or_else(|| dates.last())
        .cloned()
        .unwrap_or_default();
    result.dates = dates;
    Ok(result)
}

/// Epoch milliseconds of a `YYYY[-MM[-DD]]` date, at UTC midnight.
fn date_to_millis(date: &str) -> Option<i64> {
    let mut parts = date.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next().map_or(Some(1), |m| m.parse().ok())?;
    let day: u32 = parts.next().map_or(Some(1), |d| d.parse().ok())?;
    let datetime = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    Some(datetime.and_utc().timestamp_millis())
}

impl StatsData {
    fn value(&self, stat_var: &Dcid, place: &Dcid, date: &str) -> Option<f64> {
        self.data
            .get(stat_var)?
            .get(place)?
            .data
            .get(date)
            .copied()
    }

    fn default_place<'a>(&'a self, place: Option<&'a Dcid>) -> Option<&'a Dcid> {
        place.or_else(|| self.places.first())
    }

    fn default_date<'a>(&'a self, date: Option<&'a str>) -> Option<&'a str> {
        date.or_else(|| self.dates.last().map(String::as_str))
    }

    /// One point per stat var for a place and date, defaulting to the first
    /// place and the last date. Missing values are reported as 0.
    pub fn get_stats_point(
        &self,
        place: Option<&Dcid>,
        date: Option<&str>,
        locale: &LocaleContext,
    ) -> Vec<DataPoint> {
        let (Some(place), Some(date)) = (self.default_place(place), self.default_date(date))
        else {
            return Vec::new();
        };
        self.stat_vars
            .iter()
            .map(|sv| {
                DataPoint::new(
                    locale.stat_var_label(sv.as_str()),
                    Some(self.value(sv, place, date).unwrap_or(0.0)),
                )
            })
            .collect()
    }

    /// One group per stat var with data for the place, each holding a point
    /// per date.
    pub fn get_stats_var_group_with_time(
        &self,
        place: Option<&Dcid>,
        locale: &LocaleContext,
    ) -> Vec<DataGroup> {
        let Some(place) = self.default_place(place) else {
            return Vec::new();
        };
        let mut groups = Vec::new();
        for sv in &self.stat_vars {
            let Some(series) = self.data.get(sv).and_then(|by_place| by_place.get(place)) else {
                continue;
            };
            if series.is_empty() {
                continue;
            }
            let points = self
                .dates
                .iter()
                .map(|date| DataPoint {
                    label: date.clone(),
                    value: series.data.get(date).copied(),
                    time: date_to_millis(date),
                })
                .collect();
            groups.push(DataGroup::new(locale.stat_var_label(sv.as_str()), points));
        }
        groups
    }

    /// One group per place, each holding a point per stat var at `date`
    /// (default: the last date). Groups are labelled with the place name.
    pub fn get_place_group_with_stats_var(
        &self,
        date: Option<&str>,
        locale: &LocaleContext,
    ) -> Vec<DataGroup> {
        let Some(date) = self.default_date(date) else {
            return Vec::new();
        };
        let mut groups = Vec::new();
        for place in &self.places {
            let mut points = Vec::new();
            let mut place_name = None;
            for sv in &self.stat_vars {
                let Some(series) = self.data.get(sv).and_then(|by_place| by_place.get(place))
                else {
                    continue;
                };
                points.push(DataPoint::new(
                    locale.stat_var_label(sv.as_str()),
                    series.data.get(date).copied(),
                ));
                if series.place_name.is_some() {
                    place_name = series.place_name.clone();
                }
            }
            if !points.is_empty() {
                let label = place_name.unwrap_or_else(|| place.to_string());
                groups.push(DataGroup::new(label, points));
            }
        }
        groups
    }

    /// One group per date, each holding a point per stat var. Long series
    /// are thinned to roughly five groups.
    pub fn get_time_group_with_stats_var(
        &self,
        place: Option<&Dcid>,
        locale: &LocaleContext,
    ) -> Vec<DataGroup> {
        let Some(place) = self.default_place(place) else {
            return Vec::new();
        };
        let groups: Vec<DataGroup> = self
            .dates
            .iter()
            .map(|date| {
                let points = self
                    .stat_vars
                    .iter()
                    .map(|sv| {
                        DataPoint::new(
                            locale.stat_var_label(sv.as_str()),
                            self.value(sv, place, date),
                        )
                    })
                    .collect();
                DataGroup::new(date.clone(), points)
            })
            .collect();

        let interval = groups.len() / TIME_GROUP_TARGET;
        if interval == 0 {
            return groups;
        }
        groups
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % interval == 0)
            .map(|(_, group)| group)
            .collect()
    }

    /// Write the values as a long table with columns
    /// `place,stat_var,date,value`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["place", "stat_var", "date", "value"])?;
        for sv in &self.stat_vars {
            let Some(by_place) = self.data.get(sv) else {
                continue;
            };
            for place in &self.places {
                let Some(series) = by_place.get(place) else {
                    continue;
                };
                for (date, value) in &series.data {
                    csv.write_record([
                        place.as_str(),
                        sv.as_str(),
                        date.as_str(),
                        &value.to_string(),
                    ])?;
                }
            }
        }
        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Write the CSV table to a file.
    pub fn write_csv_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|source| ObspecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_csv(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlaceSeries;

    fn dcid(s: &str) -> Dcid {
        Dcid::new(s).unwrap()
    }

    fn sample() -> StatsData {
        let mut by_place = PlaceSeriesMap::new();
        by_place.insert(
            dcid("geoId/05"),
            PlaceSeries::from_pairs([("2011", 11000.0), ("2012", 13000.0)])
                .with_place_name("Arkansas"),
        );
        by_place.insert(
            dcid("geoId/06"),
            PlaceSeries::from_pairs([("2011", 15000.0)]).with_place_name("California"),
        );
        let mut data = IndexMap::new();
        data.insert(dcid("Count_Person_Male"), by_place);
        StatsData {
            places: vec![dcid("geoId/05"), dcid("geoId/06")],
            stat_vars: vec![dcid("Count_Person_Male")],
            dates: vec!["2011".to_string(), "2012".to_string()],
            data,
            sources: BTreeSet::new(),
            latest_common_date: "2011".to_string(),
        }
    }

    #[test]
    fn test_fetch_options_default_to_count_person() {
        let options = StatsFetchOptions::default();
        assert!(!options.per_capita);
        assert_eq!(options.population, dcid("Count_Person"));
        assert_eq!(StatsFetchOptions::per_capita(100.0).population, dcid("Count_Person"));
    }

    #[test]
    fn test_date_to_millis() {
        assert_eq!(date_to_millis("1970"), Some(0));
        assert_eq!(date_to_millis("2011"), Some(1_293_840_000_000));
        assert_eq!(date_to_millis("2011-02"), Some(1_296_518_400_000));
        assert_eq!(date_to_millis("latest"), None);
    }

    #[test]
    fn test_stats_point_defaults_missing_to_zero() {
        let data = sample();
        let locale = LocaleContext::english();
        let points = data.get_stats_point(Some(&dcid("geoId/06")), None, &locale);
        assert_eq!(points, vec![DataPoint::new("Count_Person_Male", Some(0.0))]);

        let points = data.get_stats_point(None, Some("2011"), &locale);
        assert_eq!(points[0].value, Some(11000.0));
    }

    #[test]
    fn test_stats_var_group_with_time() {
        let groups = sample().get_stats_var_group_with_time(
            Some(&dcid("geoId/06")),
            &LocaleContext::english(),
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].value[0].value, Some(15000.0));
        assert_eq!(groups[0].value[0].time, date_to_millis("2011"));
        assert_eq!(groups[0].value[1].value, None);
    }

    #[test]
    fn test_stats_var_group_skips_places_without_series() {
        let groups = sample().get_stats_var_group_with_time(
            Some(&dcid("geoId/01")),
            &LocaleContext::english(),
        );
        assert!(groups.is_empty());
    }

    #[test]
    fn test_place_group_uses_place_names() {
        let groups = sample().get_place_group_with_stats_var(None, &LocaleContext::english());
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Arkansas", "California"]);
        assert_eq!(groups[0].value[0].value, Some(13000.0));
        assert_eq!(groups[1].value[0].value, None);
    }

    #[test]
    fn test_time_groups_are_thinned() {
        let mut data = sample();
        data.dates = (2000..2012).map(|y| y.to_string()).collect();
        let groups = data.get_time_group_with_stats_var(None, &LocaleContext::english());
        // 12 dates, interval 2.
        assert_eq!(groups.len(), 6);
        assert_eq!(groups[0].label, "2000");
        assert_eq!(groups[1].label, "2002");
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        sample().write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "place,stat_var,date,value\n\
             geoId/05,Count_Person_Male,2011,11000\n\
             geoId/05,Count_Person_Male,2012,13000\n\
             geoId/06,Count_Person_Male,2011,15000\n"
        );
    }
}
