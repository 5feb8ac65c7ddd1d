//! Per-capita reconciliation of numerator series against population series.
//!
//! Population data is typically yearly while numerators may be monthly or
//! daily, so each numerator date is matched to a population year: the exact
//! year when present, the earliest or latest year when the date falls
//! outside the population range, and the closest year inside a gap.

use std::collections::BTreeMap;

use tracing::warn;

use crate::types::{Dcid, Observation, PlaceSeries, PlaceSeriesMap};

/// Default denominator of per-capita values.
pub const DEFAULT_POPULATION_DCID: &str = "Count_Person";

const _: () = assert!(Dcid::is_valid_literal(DEFAULT_POPULATION_DCID));

/// Year part of a `YYYY[-MM[-DD]]` date.
fn year_of(date: &str) -> &str {
    date.split('-').next().unwrap_or(date)
}

/// Population value to divide an observation dated `date` by.
///
/// `population` is keyed by year. Returns `None` only when it is empty or
/// its keys are not years.
pub fn resolve_population(population: &BTreeMap<String, f64>, date: &str) -> Option<f64> {
    let year = year_of(date);
    if let Some(value) = population.get(year) {
        return Some(*value);
    }

    let (min_year, min_value) = population.first_key_value()?;
    let (max_year, max_value) = population.last_key_value()?;
    if year < min_year.as_str() {
        return Some(*min_value);
    }
    if year > max_year.as_str() {
        return Some(*max_value);
    }

    // Inside a gap: closest year, earliest wins on ties.
    let target: i64 = year.parse().ok()?;
    let mut best: Option<(i64, f64)> = None;
    for (candidate, value) in population {
        let Ok(candidate) = candidate.parse::<i64>() else {
            continue;
        };
        let diff = (candidate - target).abs();
        if best.is_none_or(|(best_diff, _)| diff < best_diff) {
            best = Some((diff, *value));
        }
    }
    best.map(|(_, value)| value)
}

/// Divide a value by a population, scaled. Zero population yields zero.
fn per_capita_value(value: f64, population: f64, scaling: f64) -> f64 {
    if population == 0.0 {
        0.0
    } else {
        value / (population / scaling)
    }
}

/// Per-capita values of one place's series.
///
/// Returns `None` when the population series is empty.
pub fn compute_per_capita(
    series: &PlaceSeries,
    population: &PlaceSeries,
    scaling: f64,
) -> Option<PlaceSeries> {
    if population.is_empty() {
        return None;
    }
    let mut result = series.clone();
    for (date, value) in result.data.iter_mut() {
        let pop = resolve_population(&population.data, date)?;
        *value = per_capita_value(*value, pop, scaling);
    }
    Some(result)
}

/// Per-capita values for every place of a stat var.
///
/// Places without a population series are left out of the result.
pub fn compute_per_capita_map(
    numerator: &PlaceSeriesMap,
    population: &PlaceSeriesMap,
    scaling: f64,
) -> PlaceSeriesMap {
    let mut result = PlaceSeriesMap::new();
    for (place, series) in numerator {
        let computed = population
            .get(place)
            .and_then(|pop| compute_per_capita(series, pop, scaling));
        match computed {
            Some(series) => {
                result.insert(place.clone(), series);
            }
            None => {
                warn!(place = %place, "no population data, excluding place from per capita");
            }
        }
    }
    result
}

/// Ratio of a numerator series to a denominator series.
///
/// Dates present in both use the denominator value of that date; other
/// dates fall back to year resolution over the denominator. An empty
/// denominator yields an empty result.
pub fn compute_ratio(
    numerator: &[Observation],
    denominator: &[Observation],
    scaling: f64,
) -> Vec<Observation> {
    if denominator.is_empty() {
        return Vec::new();
    }
    let by_date: BTreeMap<&str, f64> = denominator
        .iter()
        .map(|obs| (obs.date.as_str(), obs.value))
        .collect();
    let by_year: BTreeMap<String, f64> = denominator
        .iter()
        .map(|obs| (year_of(&obs.date).to_string(), obs.value))
        .collect();

    numerator
        .iter()
        .filter_map(|obs| {
            let denom = by_date
                .get(obs.date.as_str())
                .copied()
                .or_else(|| resolve_population(&by_year, &obs.date))?;
            Some(Observation::new(
                obs.date.clone(),
                per_capita_value(obs.value, denom, scaling),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dcid;

    fn population() -> PlaceSeries {
        PlaceSeries::from_pairs([("2010", 100.0), ("2012", 200.0), ("2016", 400.0)])
    }

    #[test]
    fn test_exact_year() {
        assert_eq!(resolve_population(&population().data, "2012-06"), Some(200.0));
    }

    #[test]
    fn test_before_and_after_range() {
        let pop = population().data;
        assert_eq!(resolve_population(&pop, "2001"), Some(100.0));
        assert_eq!(resolve_population(&pop, "2020-01-01"), Some(400.0));
    }

    #[test]
    fn test_gap_uses_closest_year() {
        let pop = population().data;
        assert_eq!(resolve_population(&pop, "2011"), Some(100.0));
        assert_eq!(resolve_population(&pop, "2015"), Some(400.0));
        assert_eq!(resolve_population(&pop, "2013"), Some(200.0));
    }

    #[test]
    fn test_empty_population() {
        assert_eq!(resolve_population(&BTreeMap::new(), "2012"), None);
        let series = PlaceSeries::from_pairs([("2012", 5.0)]);
        assert!(compute_per_capita(&series, &PlaceSeries::default(), 1.0).is_none());
    }

    #[test]
    fn test_zero_population_gives_zero() {
        let series = PlaceSeries::from_pairs([("2011", 1100.0), ("2012", 1300.0)]);
        let pop = PlaceSeries::from_pairs([("2011", 0.0), ("2012", 130.0)]);
        let result = compute_per_capita(&series, &pop, 1.0).unwrap();
        assert_eq!(result.data["2011"], 0.0);
        assert_eq!(result.data["2012"], 10.0);
    }

    #[test]
    fn test_scaling() {
        let series = PlaceSeries::from_pairs([("2012", 50.0)]).with_place_name("Place");
        let pop = PlaceSeries::from_pairs([("2012", 1000.0)]);
        let result = compute_per_capita(&series, &pop, 100.0).unwrap();
        assert_eq!(result.data["2012"], 5.0);
        assert_eq!(result.place_name.as_deref(), Some("Place"));
    }

    #[test]
    fn test_map_excludes_places_without_population() {
        let ca = Dcid::new("geoId/06").unwrap();
        let tx = Dcid::new("geoId/48").unwrap();
        let mut numerator = PlaceSeriesMap::new();
        numerator.insert(ca.clone(), PlaceSeries::from_pairs([("2012", 20.0)]));
        numerator.insert(tx.clone(), PlaceSeries::from_pairs([("2012", 30.0)]));
        let mut pop = PlaceSeriesMap::new();
        pop.insert(ca.clone(), PlaceSeries::from_pairs([("2012", 10.0)]));

        let result = compute_per_capita_map(&numerator, &pop, 1.0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[&ca].data["2012"], 2.0);
        assert!(!result.contains_key(&tx));
    }

    #[test]
    fn test_ratio_prefers_exact_date() {
        let num = vec![
            Observation::new("2012-01", 10.0),
            Observation::new("2012-02", 20.0),
            Observation::new("2014-01", 30.0),
        ];
        let denom = vec![Observation::new("2012-01", 5.0), Observation::new("2013-01", 10.0)];
        let ratio = compute_ratio(&num, &denom, 1.0);
        assert_eq!(
            ratio,
            vec![
                Observation::new("2012-01", 2.0),
                Observation::new("2012-02", 4.0),
                Observation::new("2014-01", 3.0),
            ]
        );
        assert!(compute_ratio(&num, &[], 1.0).is_empty());
    }

    #[test]
    fn test_ratio_uses_closest_year_inside_gap() {
        let num = vec![
            Observation::new("2001", 1000.0),
            Observation::new("2005", 2000.0),
            Observation::new("2010", 3000.0),
        ];
        let denom = vec![
            Observation::new("2001", 100.0),
            Observation::new("2004", 200.0),
            Observation::new("2009", 300.0),
        ];
        let ratio = compute_ratio(&num, &denom, 1.0);
        assert!(ratio.iter().all(|obs| obs.value == 10.0));
        assert_eq!(ratio.len(), 3);
    }
}
