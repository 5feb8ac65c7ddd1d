//! Stats command - fetch series for places and stat vars.

use std::path::PathBuf;

use colored::Colorize;
use obspec::{fetch_stats_data, Dcid, HttpApi, LocaleContext, ObspecConfig, StatsFetchOptions};

/// Arguments of the stats command.
pub struct StatsArgs {
    pub places: Vec<String>,
    pub stat_vars: Vec<String>,
    pub per_capita: bool,
    pub scaling: f64,
    pub csv: Option<PathBuf>,
    pub json: bool,
}

pub fn run(args: StatsArgs, config: &ObspecConfig) -> Result<(), Box<dyn std::error::Error>> {
    let places = Dcid::parse_all(args.places)?;
    let stat_vars = Dcid::parse_all(args.stat_vars)?;
    let options = StatsFetchOptions {
        per_capita: args.per_capita,
        scaling: args.scaling,
        population: Dcid::new(&config.population_dcid)?,
    };

    let api = HttpApi::new(&config.api)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let data = runtime.block_on(fetch_stats_data(&api, &places, &stat_vars, &options))?;

    if let Some(path) = &args.csv {
        data.write_csv_file(path)?;
        eprintln!("{} {}", "Wrote".green().bold(), path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    let locale = LocaleContext::english();
    if data.dates.is_empty() {
        println!("{}", "No data".yellow());
        return Ok(());
    }

    println!(
        "{} {}",
        "Latest common date:".cyan().bold(),
        data.latest_common_date.white()
    );
    println!();
    for group in data.get_place_group_with_stats_var(Some(data.latest_common_date.as_str()), &locale) {
        println!("{}", group.label.bold());
        for point in &group.value {
            let value = point
                .value
                .map(|v| format!("{}", v))
                .unwrap_or_else(|| "-".to_string());
            println!("  {:40} {}", point.label, value);
        }
    }

    if !data.sources.is_empty() {
        println!();
        println!("{}", "Sources:".yellow().bold());
        for source in &data.sources {
            println!("  {}", source);
        }
    }
    Ok(())
}
