//! End-to-end tests of the fetchers against the mock API.

use std::collections::HashMap;

use obspec::metadata::{
    Provenance, ProvenanceSummary, SeriesKey, SeriesSummary, StatVarProvenanceSummaries,
    TripleNode,
};
use obspec::stats::StatsFetchOptions;
use obspec::types::{Observation, PlaceSeries, PlaceSeriesMap, Series, SeriesAllApiResponse};
use obspec::{
    fetch_facets_with_metadata, fetch_metadata, fetch_raw_data, fetch_stats_data, get_stat_data,
    Dcid, EnrichmentConfig, FacetResponse, LocaleContext, MockApi, StatMetadata,
};

fn dcid(s: &str) -> Dcid {
    Dcid::new(s).unwrap()
}

fn node(name: Option<&str>, value: Option<&str>) -> TripleNode {
    TripleNode {
        dcid: None,
        name: name.map(str::to_string),
        value: value.map(str::to_string),
    }
}

fn summaries(provenance: &str, summary: ProvenanceSummary) -> StatVarProvenanceSummaries {
    let mut info = StatVarProvenanceSummaries::default();
    info.provenance_summary.insert(provenance.to_string(), summary);
    info
}

fn census_key() -> SeriesKey {
    SeriesKey {
        measurement_method: Some("CensusPEPSurvey".to_string()),
        observation_period: Some("P1Y".to_string()),
        ..SeriesKey::default()
    }
}

/// Mock serving one census facet and one Wikipedia facet of `Count_Person`.
fn metadata_api() -> MockApi {
    let census = Provenance::new()
        .with("source", node(Some("US Census Bureau"), None))
        .with("name", node(None, Some("Population Estimates")))
        .with("url", node(None, Some("https://www.census.gov/programs-surveys/popest.html")))
        .with(
            "licenseType",
            TripleNode {
                dcid: Some("dc/l/PublicDomain".to_string()),
                name: Some("Public Domain".to_string()),
                value: None,
            },
        );

    let mut info = summaries(
        "dc/base/USCensusPEP_Annual_Population",
        ProvenanceSummary {
            release_frequency: Some("P1Y".to_string()),
            series_summary: vec![SeriesSummary::new(census_key()).with_dates("1900", "2023")],
        },
    );
    info.provenance_summary.insert(
        "dc/base/WikipediaStatsData".to_string(),
        ProvenanceSummary {
            release_frequency: None,
            series_summary: vec![SeriesSummary::new(SeriesKey::default()).with_dates("2001", "2019")],
        },
    );

    MockApi::new()
        .with_provenance("dc/base/USCensusPEP_Annual_Population", census)
        .with_variable_info(dcid("Count_Person"), info)
        .with_node_value("CensusPEPSurvey", "description", "Population Estimates Program")
        .with_node_value("Count_Person", "name", "Total Population")
        .with_variable_path(
            dcid("Count_Person"),
            vec!["Count_Person".to_string(), "dc/g/Demographics".to_string()],
        )
        .with_group_name("dc/g/Demographics", "Demographics")
}

fn count_person_facets() -> FacetResponse {
    FacetResponse::new()
        .with_facet(
            dcid("Count_Person"),
            "2176550201",
            StatMetadata::new()
                .with_import_name("USCensusPEP_Annual_Population")
                .with_measurement_method("CensusPEPSurvey")
                .with_observation_period("P1Y"),
        )
        .with_facet(
            dcid("Count_Person"),
            "1456184638",
            StatMetadata::new().with_import_name("WikipediaStatsData"),
        )
}

// =============================================================================
// Metadata enrichment
// =============================================================================

#[tokio::test]
async fn test_facets_are_enriched() {
    let api = metadata_api();
    let enriched =
        fetch_facets_with_metadata(&api, &count_person_facets(), &EnrichmentConfig::default())
            .await
            .unwrap();

    let census = enriched.get("Count_Person", "2176550201").unwrap();
    assert_eq!(census.source_name.as_deref(), Some("US Census Bureau"));
    assert_eq!(census.provenance_name.as_deref(), Some("Population Estimates"));
    assert_eq!(census.date_range_start.as_deref(), Some("1900"));
    assert_eq!(census.date_range_end.as_deref(), Some("2023"));
    assert_eq!(
        census.measurement_method_description.as_deref(),
        Some("Population Estimates Program")
    );
    assert!(census.unit_display_name.is_none());
}

#[tokio::test]
async fn test_date_ranges_copied_without_suppression() {
    let api = metadata_api();
    let enriched =
        fetch_facets_with_metadata(&api, &count_person_facets(), &EnrichmentConfig::default())
            .await
            .unwrap();

    let wikipedia = enriched.get("Count_Person", "1456184638").unwrap();
    assert_eq!(wikipedia.date_range_start.as_deref(), Some("2001"));
    assert_eq!(wikipedia.date_range_end.as_deref(), Some("2019"));
}

#[tokio::test]
async fn test_suppressed_provenance_has_no_date_range() {
    let api = metadata_api();
    let config = EnrichmentConfig {
        date_range_suppressed: vec!["WikipediaStatsData".to_string()],
        ..EnrichmentConfig::default()
    };
    let enriched = fetch_facets_with_metadata(&api, &count_person_facets(), &config)
        .await
        .unwrap();

    let wikipedia = enriched.get("Count_Person", "1456184638").unwrap();
    assert_eq!(wikipedia.provenance_name.as_deref(), Some("WikipediaStatsData"));
    assert!(wikipedia.date_range_start.is_none());
    assert!(wikipedia.date_range_end.is_none());

    let census = enriched.get("Count_Person", "2176550201").unwrap();
    assert_eq!(census.date_range_start.as_deref(), Some("1900"));
}

#[tokio::test]
async fn test_enrichment_fans_out_once_per_lookup() {
    let api = metadata_api();
    fetch_facets_with_metadata(&api, &count_person_facets(), &EnrichmentConfig::default())
        .await
        .unwrap();

    assert_eq!(api.call_count("node_triples_out"), 2);
    assert_eq!(api.call_count("variable_info"), 1);
    // Descriptions only; there are no units to name.
    assert_eq!(api.call_count("first_node_values"), 1);
}

#[tokio::test]
async fn test_enrichment_error_propagates() {
    let api = metadata_api().failing("node_triples_out");
    let result =
        fetch_facets_with_metadata(&api, &count_person_facets(), &EnrichmentConfig::default())
            .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_metadata_rows() {
    let api = metadata_api();
    let stat_vars = [dcid("Count_Person")];
    let result = fetch_metadata(&api, &stat_vars, &count_person_facets(), None)
        .await
        .unwrap();

    assert_eq!(result.stat_var_list.len(), 1);
    assert_eq!(result.stat_var_list[0].name, "Total Population");

    let rows = &result.metadata[&dcid("Count_Person")];
    assert_eq!(rows.len(), 2);
    let census = &rows[0];
    assert_eq!(census.stat_var_name, "Total Population");
    assert_eq!(census.categories, vec!["Demographics".to_string()]);
    assert_eq!(census.provenance_name, "Population Estimates");
    assert_eq!(
        census.provenance_url.as_deref(),
        Some("https://www.census.gov/programs-surveys/popest.html")
    );
    assert_eq!(census.license.as_deref(), Some("Public Domain"));
    assert_eq!(census.license_dcid.as_deref(), Some("dc/l/PublicDomain"));
    assert_eq!(census.periodicity.as_deref(), Some("P1Y"));
    assert_eq!(census.measurement_method.as_deref(), Some("CensusPEPSurvey"));
    assert_eq!(
        census.measurement_method_description.as_deref(),
        Some("Population Estimates Program")
    );
}

#[tokio::test]
async fn test_metadata_rows_limited_to_selected_facets() {
    let api = metadata_api();
    let stat_vars = [dcid("Count_Person")];
    let selected = obspec::StatVarFacetMap::new().with(dcid("Count_Person"), "1456184638");
    let result = fetch_metadata(&api, &stat_vars, &count_person_facets(), Some(&selected))
        .await
        .unwrap();

    let rows = &result.metadata[&dcid("Count_Person")];
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].provenance_name, "WikipediaStatsData");
    assert!(rows[0].source_name.is_none());
}

// =============================================================================
// Stats fetcher
// =============================================================================

fn place_series(points: &[(&str, f64)]) -> PlaceSeries {
    PlaceSeries::from_pairs(points.iter().map(|(d, v)| (*d, *v)))
}

fn stats_api() -> MockApi {
    let mut male = PlaceSeriesMap::new();
    male.insert(
        dcid("geoId/05"),
        place_series(&[("2011", 1100.0), ("2012", 1300.0)]).with_provenance_url("census.gov"),
    );
    male.insert(
        dcid("geoId/06"),
        place_series(&[("2011", 2100.0), ("2013", 2300.0)]).with_provenance_url("census.gov"),
    );

    let mut population = PlaceSeriesMap::new();
    population.insert(dcid("geoId/05"), place_series(&[("2011", 110.0), ("2012", 130.0)]));

    MockApi::new()
        .with_stats(dcid("Count_Person_Male"), male)
        .with_stats(dcid("Count_Person"), population)
        .with_display_name(dcid("geoId/05"), "Arkansas")
        .with_display_name(dcid("geoId/06"), "California")
}

#[tokio::test]
async fn test_stats_latest_common_date() {
    let api = stats_api();
    let places = [dcid("geoId/05"), dcid("geoId/06")];
    let data = fetch_stats_data(
        &api,
        &places,
        &[dcid("Count_Person_Male")],
        &StatsFetchOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(data.dates, vec!["2011", "2012", "2013"]);
    assert_eq!(data.latest_common_date, "2011");
    assert!(data.sources.contains("census.gov"));
    let series = &data.data[&dcid("Count_Person_Male")][&dcid("geoId/06")];
    assert_eq!(series.place_name.as_deref(), Some("California"));
    assert_eq!(api.call_count("stats"), 1);
}

#[tokio::test]
async fn test_stats_per_capita_requests_population_last() {
    let api = stats_api();
    let places = [dcid("geoId/05"), dcid("geoId/06")];
    let data = fetch_stats_data(
        &api,
        &places,
        &[dcid("Count_Person_Male")],
        &StatsFetchOptions::per_capita(1.0),
    )
    .await
    .unwrap();

    let by_place = &data.data[&dcid("Count_Person_Male")];
    assert_eq!(by_place.len(), 1);
    assert_eq!(by_place[&dcid("geoId/05")].data["2011"], 10.0);
    assert_eq!(by_place[&dcid("geoId/05")].data["2012"], 10.0);
    assert_eq!(data.latest_common_date, "2012");

    let stats_calls: Vec<String> = api
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("stats:"))
        .collect();
    assert_eq!(
        stats_calls,
        vec![
            "stats:Count_Person_Male|geoId/05,geoId/06",
            "stats:Count_Person|geoId/05,geoId/06",
        ]
    );
}

#[tokio::test]
async fn test_stats_views_and_csv() {
    let api = stats_api();
    let places = [dcid("geoId/05"), dcid("geoId/06")];
    let data = fetch_stats_data(
        &api,
        &places,
        &[dcid("Count_Person_Male")],
        &StatsFetchOptions::default(),
    )
    .await
    .unwrap();
    let locale = LocaleContext::english();

    let groups = data.get_place_group_with_stats_var(Some("2011"), &locale);
    let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, vec!["Arkansas", "California"]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.csv");
    data.write_csv_file(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("place,stat_var,date,value\n"));
    assert_eq!(text.lines().count(), 5);
}

// =============================================================================
// Timeline
// =============================================================================

fn timeline_api() -> MockApi {
    let mut response = SeriesAllApiResponse::default();
    let mut by_place = HashMap::new();
    by_place.insert(
        dcid("geoId/05"),
        vec![
            Series {
                facet: Some("1".to_string()),
                series: vec![
                    Observation::new("2011", 21000.0),
                    Observation::new("2012", 22000.0),
                ],
            },
            Series {
                facet: Some("2".to_string()),
                series: vec![Observation::new("2011", 21500.0)],
            },
        ],
    );
    response.data.insert(dcid("Count_Person"), by_place);
    response
        .facets
        .insert("1".to_string(), StatMetadata::new().with_provenance_url("source1"));
    response
        .facets
        .insert("2".to_string(), StatMetadata::new().with_provenance_url("source2"));
    MockApi::new().with_series_all(response)
}

#[tokio::test]
async fn test_timeline_raw_data_without_denominator() {
    let api = timeline_api();
    let places = [dcid("geoId/05")];
    let stat_vars = [dcid("Count_Person")];
    let raw = fetch_raw_data(&api, &places, &stat_vars, None).await.unwrap();

    assert_eq!(api.call_count("series"), 0);
    assert_eq!(api.call_count("series_all"), 1);
    let facets = raw.metadata_map.facets("Count_Person").unwrap();
    assert_eq!(facets.keys().collect::<Vec<_>>(), vec!["1", "2"]);

    let data = get_stat_data(&raw, &places, &stat_vars, &HashMap::new(), None);
    let delta = data.convert_to_delta();
    assert_eq!(delta.dates, vec!["2012"]);
    assert_eq!(
        delta.data[&dcid("Count_Person")][&dcid("geoId/05")].series,
        vec![Observation::new("2012", 1000.0)]
    );
}
