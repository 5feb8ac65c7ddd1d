//! Obspec CLI - observation query planning for Data Commons.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Specs { file } => commands::specs::run(file),

        Commands::Curl { file, api_root } => commands::curl::run(file, api_root, &config),

        Commands::Python {
            file,
            client,
            api_root,
            messages,
        } => commands::python::run(file, client, api_root, messages, &config),

        Commands::Sql { file } => commands::sql::run(file),

        Commands::Facets { file } => commands::facets::run(file, &config, cli.verbose),

        Commands::Stats {
            places,
            stat_vars,
            per_capita,
            scaling,
            csv,
            json,
        } => commands::stats::run(
            commands::stats::StatsArgs {
                places,
                stat_vars,
                per_capita,
                scaling,
                csv,
                json,
            },
            &config,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
