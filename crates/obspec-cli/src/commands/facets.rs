//! Facets command - enrich a facet response against the live API.

use std::path::PathBuf;

use colored::Colorize;
use obspec::{fetch_facets_with_metadata, FacetResponse, HttpApi, ObspecConfig};

use super::read_json;

pub fn run(
    file: PathBuf,
    config: &ObspecConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let facets: FacetResponse = read_json(&file)?;
    let api = HttpApi::new(&config.api)?;

    if verbose {
        eprintln!(
            "{} {} facets of {} stat vars against {}",
            "Enriching".cyan().bold(),
            facets.len(),
            facets.stat_vars().count(),
            api.api_root().white()
        );
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let enriched =
        runtime.block_on(fetch_facets_with_metadata(&api, &facets, &config.enrichment))?;

    println!("{}", serde_json::to_string_pretty(&enriched)?);
    Ok(())
}
