//! Python command - print a Python script for a selection.

use std::collections::HashMap;
use std::path::PathBuf;

use obspec::{
    build_observation_specs, observation_specs_to_client_script,
    observation_specs_to_python_script, LocaleContext, ObservationSpecOptions, ObspecConfig,
};

use super::{read_json, snippet_target};

pub fn run(
    file: PathBuf,
    client: bool,
    api_root: Option<String>,
    messages: Option<PathBuf>,
    config: &ObspecConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let options: ObservationSpecOptions = read_json(&file)?;
    let specs = build_observation_specs(&options)?;
    let target = snippet_target(api_root, config);

    let locale = match messages {
        Some(dir) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(LocaleContext::load(&config.locale, dir))?
        }
        None => LocaleContext::english(),
    };

    // Titles fall back to the locale's stat var labels.
    let names = HashMap::new();
    let script = if client {
        observation_specs_to_client_script(&specs, &names, &target, &locale)
    } else {
        observation_specs_to_python_script(&specs, &names, &target, &locale)
    };
    println!("{}", script);
    Ok(())
}
