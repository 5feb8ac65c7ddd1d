//! Property-based tests for the spec builder and per-capita reconciler.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p obspec --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p obspec --test property_tests
//! ```

use std::collections::BTreeMap;

use proptest::prelude::*;

use obspec::percapita::{compute_per_capita, resolve_population};
use obspec::spec::ObservationRole;
use obspec::types::PlaceSeries;
use obspec::{
    build_observation_specs, observation_specs_to_curl, ApiTarget, Dcid, ObservationSpecOptions,
    StatVarSpec,
};

// =============================================================================
// Test Strategies
// =============================================================================

fn stat_var() -> impl Strategy<Value = Dcid> {
    prop_oneof![
        Just("Count_Person"),
        Just("Count_Person_Male"),
        Just("Count_Person_Female"),
        Just("Median_Age_Person"),
        Just("UnemploymentRate_Person"),
    ]
    .prop_map(|s| Dcid::new(s).unwrap())
}

fn date() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("2020".to_string())),
        Just(Some("2021-06".to_string())),
        Just(Some("HIGHEST_COVERAGE".to_string())),
    ]
}

fn stat_var_spec() -> impl Strategy<Value = StatVarSpec> {
    (
        stat_var(),
        date(),
        proptest::option::of(prop_oneof![Just("111"), Just("222")]),
        proptest::option::of(Just("Count_Person")),
    )
        .prop_map(|(sv, date, facet, denom)| {
            let mut spec = StatVarSpec::new(sv);
            if let Some(date) = date {
                spec = spec.with_date(date);
            }
            if let Some(facet) = facet {
                spec = spec.with_facet_id(facet);
            }
            if let Some(denom) = denom {
                spec = spec.with_denom(Dcid::new(denom).unwrap());
            }
            spec
        })
}

fn year_series() -> impl Strategy<Value = BTreeMap<String, f64>> {
    prop::collection::btree_map((1990u32..2030).prop_map(|y| y.to_string()), 1.0f64..1e7, 1..10)
}

// =============================================================================
// Spec builder
// =============================================================================

proptest! {
    #[test]
    fn every_selection_lands_in_exactly_one_numerator(
        specs in prop::collection::vec(stat_var_spec(), 1..12)
    ) {
        let options = ObservationSpecOptions::new(specs.clone())
            .with_places(vec![Dcid::new("geoId/06").unwrap()]);
        let built = build_observation_specs(&options).unwrap();

        for sv_spec in &specs {
            let date = match sv_spec.date.as_deref() {
                None | Some("HIGHEST_COVERAGE") => "",
                Some(date) => date,
            };
            let facet_ids: Vec<String> = sv_spec.facet_id.iter().cloned().collect();
            let holders = built
                .iter()
                .filter(|s| s.role == ObservationRole::Numerator)
                .filter(|s| s.date == date && s.facet_ids() == facet_ids.as_slice())
                .filter(|s| s.stat_var_dcids.contains(&sv_spec.stat_var))
                .count();
            prop_assert_eq!(holders, 1);
        }
        let numerators = built.iter().filter(|s| s.role == ObservationRole::Numerator).count();
        prop_assert!(numerators <= specs.len());
    }

    #[test]
    fn numerator_specs_have_no_duplicate_stat_vars(
        specs in prop::collection::vec(stat_var_spec(), 1..12)
    ) {
        let options = ObservationSpecOptions::new(specs)
            .with_places(vec![Dcid::new("geoId/06").unwrap()]);
        for spec in build_observation_specs(&options).unwrap() {
            let mut seen = spec.stat_var_dcids.clone();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), spec.stat_var_dcids.len());
        }
    }

    #[test]
    fn building_is_deterministic(specs in prop::collection::vec(stat_var_spec(), 0..8)) {
        let options = ObservationSpecOptions::new(specs)
            .with_entity_expression("country/USA<-containedInPlace+{typeOf:State}");
        let first = build_observation_specs(&options).unwrap();
        let second = build_observation_specs(&options).unwrap();
        let target = ApiTarget::standard();
        prop_assert_eq!(
            observation_specs_to_curl(&first, &target),
            observation_specs_to_curl(&second, &target)
        );
    }
}

// =============================================================================
// Per-capita reconciliation
// =============================================================================

proptest! {
    #[test]
    fn resolved_population_comes_from_the_series(
        population in year_series(),
        year in 1980u32..2040,
    ) {
        let value = resolve_population(&population, &year.to_string());
        prop_assert!(value.is_some());
        prop_assert!(population.values().any(|v| Some(*v) == value));
    }

    #[test]
    fn zero_population_gives_zero(
        values in prop::collection::btree_map(
            (1990u32..2030).prop_map(|y| y.to_string()),
            -1e6f64..1e6,
            1..10,
        )
    ) {
        let series = PlaceSeries { data: values.clone(), ..PlaceSeries::default() };
        let population = PlaceSeries {
            data: values.keys().map(|k| (k.clone(), 0.0)).collect(),
            ..PlaceSeries::default()
        };
        let result = compute_per_capita(&series, &population, 1.0).unwrap();
        prop_assert!(result.data.values().all(|v| *v == 0.0));
        prop_assert_eq!(result.data.len(), values.len());
    }
}
