//! Sql command - print the BigQuery SQL of a timeline page.

use std::path::PathBuf;

use obspec::emit::{MetadataMap, MetahashMap};
use obspec::{get_timeline_sql_query, ChartGroupInfo, Dcid};
use serde::Deserialize;

use super::read_json;

/// A timeline page: its charts, places and pinned facets.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineQuery {
    #[serde(flatten)]
    chart_group: ChartGroupInfo,
    places: Vec<Dcid>,
    #[serde(default)]
    metahash_map: MetahashMap,
    #[serde(default)]
    metadata_map: MetadataMap,
}

pub fn run(file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let query: TimelineQuery = read_json(&file)?;
    let sql = get_timeline_sql_query(
        &query.chart_group,
        &query.places,
        &query.metahash_map,
        &query.metadata_map,
    );
    if sql.is_empty() {
        return Err("No chart produces a query (delta charts are not supported)".into());
    }
    println!("{}", sql);
    Ok(())
}
