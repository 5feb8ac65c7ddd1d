//! Curl command - print cURL commands for a selection.

use std::path::PathBuf;

use obspec::{
    build_observation_specs, observation_specs_to_curl, ObservationSpecOptions, ObspecConfig,
};

use super::{read_json, snippet_target};

pub fn run(
    file: PathBuf,
    api_root: Option<String>,
    config: &ObspecConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let options: ObservationSpecOptions = read_json(&file)?;
    let specs = build_observation_specs(&options)?;
    let target = snippet_target(api_root, config);

    println!("{}", observation_specs_to_curl(&specs, &target).join("\n\n"));
    Ok(())
}
