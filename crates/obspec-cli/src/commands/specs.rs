//! Specs command - group a selection into observation specs.

use std::path::PathBuf;

use obspec::{build_observation_spec_manifest, build_observation_specs, ObservationSpecOptions};

use super::read_json;

pub fn run(file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let options: ObservationSpecOptions = read_json(&file)?;
    let specs = build_observation_specs(&options)?;
    let manifest = build_observation_spec_manifest(&specs);

    let output = serde_json::json!({
        "specs": specs,
        "manifest": manifest,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
