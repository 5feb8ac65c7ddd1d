//! Asynchronous metadata enrichment.
//!
//! Both entry points fan out every independent lookup at once and join
//! them; a single failed lookup fails the whole call. Absent data never
//! fails: the corresponding field is simply left empty.

use std::collections::HashMap;

use futures::future::try_join_all;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::DataCommonsApi;
use crate::config::EnrichmentConfig;
use crate::error::{ObspecError, Result};
use crate::types::{Dcid, FacetResponse, StatMetadata, StatVarFacetMap};

use super::types::{
    match_series_by_facet, provenance_id, NamedNode, Provenance, SeriesSummary,
    StatVarMetadata, StatVarProvenanceSummaries,
};

/// Output of [`fetch_metadata`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResult {
    /// One row per facet with a known import, keyed by stat var.
    pub metadata: IndexMap<Dcid, Vec<StatVarMetadata>>,
    /// Stat vars that have a name, in request order.
    pub stat_var_list: Vec<NamedNode>,
}

/// Attach source, provenance, date range, unit and measurement method
/// display fields to every facet.
///
/// Date ranges and measurement method descriptions are skipped for
/// provenances named in the suppression lists of `config`.
pub async fn fetch_facets_with_metadata(
    api: &dyn DataCommonsApi,
    facets: &FacetResponse,
    config: &EnrichmentConfig,
) -> Result<FacetResponse> {
    if facets.is_empty() {
        return Ok(facets.clone());
    }

    let stat_vars: Vec<Dcid> = facets.stat_vars().cloned().collect();
    let mut provenance_ids = IndexSet::new();
    let mut measurement_methods = IndexSet::new();
    let mut units = IndexSet::new();
    for (_, _, meta) in facets.iter() {
        if let Some(import_name) = non_empty(&meta.import_name) {
            provenance_ids.insert(provenance_id(import_name));
        }
        if let Some(mm) = non_empty(&meta.measurement_method) {
            measurement_methods.insert(mm.to_string());
        }
        if let Some(unit) = non_empty(&meta.unit) {
            units.insert(unit.to_string());
        }
    }
    let measurement_methods: Vec<String> = measurement_methods.into_iter().collect();
    let units: Vec<String> = units.into_iter().collect();

    debug!(
        api = api.name(),
        stat_vars = stat_vars.len(),
        provenances = provenance_ids.len(),
        measurement_methods = measurement_methods.len(),
        units = units.len(),
        "enriching facets"
    );

    let (provenances, variable_info, mm_descriptions, unit_names) = tokio::try_join!(
        fetch_provenances(api, provenance_ids.iter()),
        api.variable_info(&stat_vars),
        first_values(api, &measurement_methods, "description"),
        first_values(api, &units, "name"),
    )?;

    let mut enriched = facets.clone();
    for (stat_var, _, meta) in enriched.iter_mut() {
        if let Some(unit) = non_empty(&meta.unit) {
            meta.unit_display_name = unit_names.get(unit).cloned().flatten();
        }

        let Some(import_name) = non_empty(&meta.import_name).map(str::to_string) else {
            continue;
        };
        let prov_id = provenance_id(&import_name);
        let Some(provenance) = provenances.get(&prov_id) else {
            continue;
        };
        let provenance_name = provenance.display_name(&import_name);
        meta.source_name = provenance.source_name();

        let matched = variable_info
            .get(stat_var)
            .and_then(|info| info.series_for(&prov_id))
            .and_then(|series| match_series_by_facet(series, &*meta));
        if let Some(series) = matched {
            if !config.suppresses_date_range(&provenance_name) {
                meta.date_range_start = series.earliest_date.clone();
                meta.date_range_end = series.latest_date.clone();
            }
        }

        if let Some(mm) = non_empty(&meta.measurement_method) {
            if !config.suppresses_measurement_method(&provenance_name) {
                meta.measurement_method_description = mm_descriptions.get(mm).cloned().flatten();
            }
        }
        meta.provenance_name = Some(provenance_name);
    }

    Ok(enriched)
}

/// Build full metadata rows for the given stat vars and their facets.
///
/// Facets are taken from `stat_var_to_facets` when given, otherwise every
/// facet of the stat var in `facets`. Facets without an import name are
/// skipped.
pub async fn fetch_metadata(
    api: &dyn DataCommonsApi,
    stat_vars: &[Dcid],
    facets: &FacetResponse,
    stat_var_to_facets: Option<&StatVarFacetMap>,
) -> Result<MetadataResult> {
    if stat_vars.is_empty() {
        return Ok(MetadataResult::default());
    }

    let (stat_var_list, categories, variable_info) = tokio::try_join!(
        fetch_stat_var_names(api, stat_vars),
        fetch_stat_var_categories(api, stat_vars),
        api.variable_info(stat_vars),
    )?;

    // (stat var, facet metadata) pairs with an import.
    let selected: Vec<(&Dcid, &StatMetadata)> = stat_vars
        .iter()
        .flat_map(|sv| {
            let facet_ids: Vec<&String> = match stat_var_to_facets {
                Some(map) => map
                    .facet_ids(sv.as_str())
                    .map(|ids| ids.iter().collect())
                    .unwrap_or_default(),
                None => facets
                    .facets(sv.as_str())
                    .map(|f| f.keys().collect())
                    .unwrap_or_default(),
            };
            facet_ids
                .into_iter()
                .filter_map(move |id| facets.get(sv.as_str(), id))
                .filter(|meta| non_empty(&meta.import_name).is_some())
                .map(move |meta| (sv, meta))
        })
        .collect();

    let provenance_ids: IndexSet<String> = selected
        .iter()
        .filter_map(|(_, meta)| non_empty(&meta.import_name).map(provenance_id))
        .collect();
    let provenances = fetch_provenances(api, provenance_ids.iter()).await?;

    let mut measurement_methods = IndexSet::new();
    for (sv, meta) in &selected {
        let matched = matched_series(&variable_info, sv, meta);
        if let Some(mm) = matched.and_then(|s| non_empty(&s.series_key.measurement_method)) {
            measurement_methods.insert(mm.to_string());
        }
    }
    let measurement_methods: Vec<String> = measurement_methods.into_iter().collect();
    let mm_descriptions = first_values(api, &measurement_methods, "description").await?;

    let mut metadata: IndexMap<Dcid, Vec<StatVarMetadata>> = stat_vars
        .iter()
        .map(|sv| (sv.clone(), Vec::new()))
        .collect();

    for (sv, meta) in &selected {
        let Some(import_name) = non_empty(&meta.import_name) else {
            continue;
        };
        let prov_id = provenance_id(import_name);
        let Some(provenance) = provenances.get(&prov_id) else {
            continue;
        };
        let matched = matched_series(&variable_info, sv, meta);
        let key = matched.map(|s| s.series_key.clone()).unwrap_or_default();
        let (license, license_dcid) = provenance.license();

        let row = StatVarMetadata {
            stat_var_id: sv.to_string(),
            stat_var_name: stat_var_list
                .iter()
                .find(|node| &node.dcid == *sv)
                .map(|node| node.name.clone())
                .unwrap_or_else(|| sv.to_string()),
            categories: categories.get(*sv).cloned().unwrap_or_default(),
            source_name: provenance.source_name(),
            provenance_url: provenance.url(),
            provenance_name: provenance.display_name(import_name),
            date_range_start: matched.and_then(|s| s.earliest_date.clone()),
            date_range_end: matched.and_then(|s| s.latest_date.clone()),
            unit: key.unit.clone(),
            observation_period: key.observation_period.clone(),
            periodicity: variable_info
                .get(*sv)
                .and_then(|info| info.provenance_summary.get(&prov_id))
                .and_then(|summary| summary.release_frequency.clone()),
            license,
            license_dcid,
            measurement_method_description: key.measurement_method.as_ref().map(|mm| {
                mm_descriptions
                    .get(mm)
                    .cloned()
                    .flatten()
                    .unwrap_or_else(|| mm.clone())
            }),
            measurement_method: key.measurement_method,
        };
        if let Some(rows) = metadata.get_mut(*sv) {
            rows.push(row);
        }
    }

    Ok(MetadataResult {
        metadata,
        stat_var_list,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn matched_series<'a>(
    variable_info: &'a HashMap<Dcid, StatVarProvenanceSummaries>,
    stat_var: &Dcid,
    facet: &StatMetadata,
) -> Option<&'a SeriesSummary> {
    let import_name = non_empty(&facet.import_name)?;
    let series = variable_info
        .get(stat_var)?
        .series_for(&provenance_id(import_name))?;
    match_series_by_facet(series, facet)
}

/// Triples of each provenance, fetched concurrently.
async fn fetch_provenances<'a, I>(
    api: &dyn DataCommonsApi,
    ids: I,
) -> Result<HashMap<String, Provenance>>
where
    I: Iterator<Item = &'a String>,
{
    let lookups = ids.map(|id| async move {
        let provenance = api.node_triples_out(id).await?;
        Ok::<_, ObspecError>((id.clone(), provenance))
    });
    Ok(try_join_all(lookups).await?.into_iter().collect())
}

/// First values of a property, skipping the request when there is nothing
/// to look up.
async fn first_values(
    api: &dyn DataCommonsApi,
    dcids: &[String],
    prop: &str,
) -> Result<HashMap<String, Option<String>>> {
    if dcids.is_empty() {
        return Ok(HashMap::new());
    }
    api.first_node_values(dcids, prop).await
}

async fn fetch_stat_var_names(
    api: &dyn DataCommonsApi,
    stat_vars: &[Dcid],
) -> Result<Vec<NamedNode>> {
    let dcids: Vec<String> = stat_vars.iter().map(Dcid::to_string).collect();
    let names = first_values(api, &dcids, "name").await?;
    Ok(stat_vars
        .iter()
        .filter_map(|sv| {
            let name = names.get(sv.as_str()).cloned().flatten()?;
            Some(NamedNode {
                dcid: sv.clone(),
                name,
            })
        })
        .collect())
}

/// Top-level category of each stat var, e.g. `["Demographics"]`.
///
/// The category is the last group on the stat var's path (the root is
/// dropped), displayed by its absolute name or the last segment of its id.
async fn fetch_stat_var_categories(
    api: &dyn DataCommonsApi,
    stat_vars: &[Dcid],
) -> Result<HashMap<Dcid, Vec<String>>> {
    let paths = try_join_all(stat_vars.iter().map(|sv| api.variable_path(sv))).await?;
    let groups: Vec<Option<String>> = paths
        .into_iter()
        .map(|path| path.into_iter().skip(1).last())
        .collect();

    let distinct: IndexSet<&String> = groups.iter().flatten().collect();
    let names = try_join_all(distinct.iter().map(|group| async move {
        let name = api
            .variable_group_name(group)
            .await?
            .unwrap_or_else(|| group.rsplit('/').next().unwrap_or(group.as_str()).to_string());
        Ok::<_, ObspecError>(((*group).clone(), name))
    }))
    .await?;
    let names: HashMap<String, String> = names.into_iter().collect();

    Ok(stat_vars
        .iter()
        .zip(&groups)
        .map(|(sv, group)| {
            let categories = group
                .as_ref()
                .and_then(|g| names.get(g))
                .map(|name| vec![name.clone()])
                .unwrap_or_default();
            (sv.clone(), categories)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;

    #[tokio::test]
    async fn test_categories_use_last_group_on_path() {
        let income = Dcid::new("Median_Income_Person").unwrap();
        let age = Dcid::new("Median_Age_Person").unwrap();
        let api = MockApi::new()
            .with_variable_path(
                income.clone(),
                vec![
                    "Median_Income_Person".to_string(),
                    "dc/g/Economy_Income".to_string(),
                    "dc/g/Economy".to_string(),
                ],
            )
            .with_variable_path(
                age.clone(),
                vec!["Median_Age_Person".to_string(), "dc/g/Demographics".to_string()],
            )
            .with_group_name("dc/g/Economy", "Economy");

        let categories = fetch_stat_var_categories(&api, &[income.clone(), age.clone()])
            .await
            .unwrap();
        assert_eq!(categories[&income], vec!["Economy".to_string()]);
        assert_eq!(categories[&age], vec!["Demographics".to_string()]);
        assert_eq!(api.call_count("variable_group_name"), 2);
    }

    #[tokio::test]
    async fn test_empty_inputs_make_no_calls() {
        let api = MockApi::new();
        let facets = FacetResponse::new();
        let enriched = fetch_facets_with_metadata(&api, &facets, &EnrichmentConfig::default())
            .await
            .unwrap();
        assert!(enriched.is_empty());
        let result = fetch_metadata(&api, &[], &facets, None).await.unwrap();
        assert!(result.metadata.is_empty());
        assert!(api.calls().is_empty());
    }
}
