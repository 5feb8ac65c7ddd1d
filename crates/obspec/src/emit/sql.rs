//! BigQuery SQL for the timeline tool.
//!
//! Every stat var of every chart becomes one query block, joined with
//! `UNION ALL`. Per-capita charts use a CTE that picks, for each numerator
//! observation, the best ranked denominator observation of the same year.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::percapita::DEFAULT_POPULATION_DCID;
use crate::types::{Dcid, StatMetadata};

/// Stat var → metahash of the facet chosen for it ("" when none).
pub type MetahashMap = HashMap<Dcid, String>;

/// Stat var → metahash → facet metadata.
pub type MetadataMap = HashMap<Dcid, HashMap<String, StatMetadata>>;

/// Display options of one timeline chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    #[serde(default)]
    pub per_capita: bool,
    #[serde(default)]
    pub delta: bool,
    /// Denominator of per-capita values; population when unset.
    #[serde(default)]
    pub denom: Option<Dcid>,
}

/// Charts shown on a timeline page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartGroupInfo {
    pub chart_order: Vec<String>,
    pub chart_id_to_stat_vars: HashMap<String, Vec<Dcid>>,
    #[serde(default)]
    pub chart_id_to_options: HashMap<String, ChartOptions>,
}

const PER_CAPITA_CTE: &str = "WITH PlaceObsDatesAndDenomRank AS (
    SELECT ONum.observation_about AS PlaceId,
        ONum.variable_measured AS NumVariableId,
        ONum.observation_date AS NumDate,
        ODenom.variable_measured AS DenomVariableId,
        ODenom.observation_date AS DenomDate,
        MIN(ODenom.facet_rank) AS DenomRank
    FROM `data_commons.Observation` AS ONum
    JOIN `data_commons.Observation` AS ODenom ON TRUE
    WHERE
        ";

const PER_CAPITA_GROUP_BY: &str =
    "\n    GROUP BY PlaceId, NumVariableId, NumDate, DenomVariableId, DenomDate\n)\n";

const PER_CAPITA_SELECT: &str = r#"SELECT ONum.observation_about AS PlaceId,
      P.name AS PlaceName,
      ONum.variable_measured AS VariableId,
      ONum.observation_date AS Date,
      ONum.measurement_method AS MeasurementMethod,
      ONum.unit AS Unit,
      NET.REG_DOMAIN(I.provenance_url) AS Source,
      CONCAT(V.name, " (Per Capita)") AS VariableName,
      IF(ODenom.value IS NOT NULL AND CAST(ODenom.value AS FLOAT64) > 0,
        CAST(ONum.value AS FLOAT64) / CAST(ODenom.value AS FLOAT64),
        NULL) AS Value,
      ODenom.observation_date AS DenomDate,
      ODenom.value AS DenomValue,
FROM `data_commons.Observation` AS ONum
JOIN `data_commons.Place` AS P ON TRUE
JOIN `data_commons.Variable` AS V ON TRUE
JOIN `data_commons.Provenance` AS I ON TRUE
JOIN `data_commons.Observation` AS ODenom ON TRUE
JOIN PlaceObsDatesAndDenomRank AS PODDR ON TRUE
WHERE "#;

const PER_CAPITA_RANK_JOIN: [&str; 7] = [
    "PODDR.PlaceId = ONum.observation_about",
    "PODDR.NumVariableId = ONum.variable_measured",
    "PODDR.NumDate = ONum.observation_date",
    "PODDR.PlaceId = ODenom.observation_about",
    "PODDR.DenomVariableId = ODenom.variable_measured",
    "PODDR.DenomDate = ODenom.observation_date",
    "PODDR.DenomRank = ODenom.facet_rank",
];

const PLAIN_SELECT: &str = "SELECT O.observation_about AS PlaceId,
      P.name AS PlaceName,
      O.variable_measured AS VariableId,
      O.observation_date AS Date,
      O.measurement_method AS MeasurementMethod,
      O.unit AS Unit,
      NET.REG_DOMAIN(I.provenance_url) AS Source,
      V.name AS VariableName,
      CAST(O.value AS FLOAT64) AS Value,
      NULL as DenomDate,
      NULL as DenomValue
FROM `data_commons.Observation` AS O
JOIN `data_commons.Place` AS P ON TRUE
JOIN `data_commons.Variable` AS V ON TRUE
JOIN `data_commons.Provenance` AS I ON TRUE
WHERE ";

const CTE_PREDICATE_JOIN: &str = " AND\n        ";
const WHERE_PREDICATE_JOIN: &str = " AND\n      ";
const BLOCK_SEPARATOR: &str = "\n\nUNION ALL\n\n";
const ORDER_BY: &str = "\n\nORDER BY PlaceId, VariableId, Date";

/// Build the SQL that reproduces the data of a timeline page.
///
/// Charts showing deltas are skipped. Returns an empty string when no chart
/// contributes a block.
pub fn get_timeline_sql_query(
    chart_group: &ChartGroupInfo,
    places: &[Dcid],
    metahash_map: &MetahashMap,
    metadata_map: &MetadataMap,
) -> String {
    let default_options = ChartOptions::default();
    let mut blocks = Vec::new();

    for chart_id in &chart_group.chart_order {
        let options = chart_group
            .chart_id_to_options
            .get(chart_id)
            .unwrap_or(&default_options);
        if options.delta {
            debug!(chart_id = %chart_id, "skipping delta chart");
            continue;
        }
        let Some(stat_vars) = chart_group.chart_id_to_stat_vars.get(chart_id) else {
            continue;
        };
        for stat_var in stat_vars {
            let metadata = facet_metadata(stat_var, metahash_map, metadata_map);
            let block = if options.per_capita {
                let denom = options
                    .denom
                    .as_ref()
                    .map(Dcid::as_str)
                    .unwrap_or(DEFAULT_POPULATION_DCID);
                per_capita_block(stat_var, denom, places, metadata)
            } else {
                plain_block(stat_var, places, metadata)
            };
            blocks.push(block);
        }
    }

    if blocks.is_empty() {
        return String::new();
    }
    format!("{}{}", blocks.join(BLOCK_SEPARATOR), ORDER_BY)
}

/// Metadata of the facet chosen for a stat var, if any.
fn facet_metadata<'a>(
    stat_var: &Dcid,
    metahash_map: &MetahashMap,
    metadata_map: &'a MetadataMap,
) -> Option<&'a StatMetadata> {
    let metahash = metahash_map.get(stat_var).filter(|h| !h.is_empty())?;
    metadata_map
        .get(stat_var)
        .and_then(|by_hash| by_hash.get(metahash))
}

fn per_capita_block(
    stat_var: &Dcid,
    denom: &str,
    places: &[Dcid],
    metadata: Option<&StatMetadata>,
) -> String {
    let numerator = format!("ONum.variable_measured = {}", sql_literal(stat_var.as_str()));

    let mut cte_predicates = vec![
        "ODenom.observation_date = SUBSTR(ONum.observation_date, 0, 4)".to_string(),
        "ODenom.observation_about = ONum.observation_about".to_string(),
        format!("ODenom.variable_measured = {}", sql_literal(denom)),
        numerator.clone(),
    ];
    cte_predicates.extend(facet_predicates("ONum", metadata));
    cte_predicates.push(place_predicate("ONum", places));

    let mut predicates = vec![numerator];
    predicates.extend(facet_predicates("ONum", metadata));
    predicates.extend(import_predicate(metadata));
    predicates.extend(row_joins("ONum"));
    predicates.push(place_predicate("ONum", places));
    predicates.extend(PER_CAPITA_RANK_JOIN.iter().map(|p| p.to_string()));

    format!(
        "({}{}{}{}{})",
        PER_CAPITA_CTE,
        cte_predicates.join(CTE_PREDICATE_JOIN),
        PER_CAPITA_GROUP_BY,
        PER_CAPITA_SELECT,
        predicates.join(WHERE_PREDICATE_JOIN)
    )
}

fn plain_block(stat_var: &Dcid, places: &[Dcid], metadata: Option<&StatMetadata>) -> String {
    let mut predicates = vec![format!(
        "O.variable_measured = {}",
        sql_literal(stat_var.as_str())
    )];
    predicates.extend(facet_predicates("O", metadata));
    predicates.extend(import_predicate(metadata));
    predicates.extend(row_joins("O"));
    predicates.push(place_predicate("O", places));

    format!("{}{}", PLAIN_SELECT, predicates.join(WHERE_PREDICATE_JOIN))
}

/// Pin the facet by its metadata, or take the top ranked facet.
fn facet_predicates(table: &str, metadata: Option<&StatMetadata>) -> Vec<String> {
    match metadata {
        Some(m) => vec![
            column_predicate(table, "measurement_method", m.measurement_method.as_deref()),
            column_predicate(table, "unit", m.unit.as_deref()),
            column_predicate(table, "observation_period", m.observation_period.as_deref()),
            column_predicate(table, "scaling_factor", m.scaling_factor.as_deref()),
        ],
        None => vec![format!("{}.facet_rank = 1", table)],
    }
}

fn column_predicate(table: &str, column: &str, value: Option<&str>) -> String {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => format!("{}.{} = {}", table, column, sql_literal(v)),
        None => format!("{}.{} IS NULL", table, column),
    }
}

fn import_predicate(metadata: Option<&StatMetadata>) -> Option<String> {
    metadata
        .and_then(|m| m.import_name.as_deref())
        .filter(|name| !name.is_empty())
        .map(|name| format!("I.name = {}", sql_literal(name)))
}

fn row_joins(table: &str) -> [String; 3] {
    [
        format!("{}.observation_about = P.id", table),
        format!("{}.variable_measured = V.id", table),
        format!("{}.prov_id = I.prov_id", table),
    ]
}

fn place_predicate(table: &str, places: &[Dcid]) -> String {
    if places.is_empty() {
        return "FALSE".to_string();
    }
    let alternatives = places
        .iter()
        .map(|place| format!("{}.observation_about = {}", table, sql_literal(place.as_str())))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("({})", alternatives)
}

fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
