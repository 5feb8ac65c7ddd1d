//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Obspec: plan and fetch Data Commons observations
#[derive(Parser)]
#[command(name = "obspec")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Group a stat var selection into observation specs
    Specs {
        /// Selection file (JSON)
        #[arg(value_name = "SELECTION")]
        file: PathBuf,
    },

    /// Print one cURL command per observation spec
    Curl {
        /// Selection file (JSON)
        #[arg(value_name = "SELECTION")]
        file: PathBuf,

        /// Target a custom Data Commons instance
        #[arg(long)]
        api_root: Option<String>,
    },

    /// Print a Python script fetching the selection
    Python {
        /// Selection file (JSON)
        #[arg(value_name = "SELECTION")]
        file: PathBuf,

        /// Use the Data Commons Python client instead of raw requests
        #[arg(long)]
        client: bool,

        /// Target a custom Data Commons instance
        #[arg(long)]
        api_root: Option<String>,

        /// Directory of message catalogs (`<locale>.json`)
        #[arg(long, value_name = "DIR")]
        messages: Option<PathBuf>,
    },

    /// Print the BigQuery SQL behind a timeline page
    Sql {
        /// Timeline query file (JSON chart group plus places)
        #[arg(value_name = "TIMELINE")]
        file: PathBuf,
    },

    /// Enrich a facet response with source and provenance metadata
    Facets {
        /// Facet response file (JSON)
        #[arg(value_name = "FACETS")]
        file: PathBuf,
    },

    /// Fetch stat var series for places
    Stats {
        /// Place DCID (repeatable)
        #[arg(short, long = "place", required = true)]
        places: Vec<String>,

        /// Stat var DCID (repeatable)
        #[arg(short, long = "stat-var", required = true)]
        stat_vars: Vec<String>,

        /// Divide values by population
        #[arg(long)]
        per_capita: bool,

        /// Per-capita values are per this many people
        #[arg(long, default_value = "1")]
        scaling: f64,

        /// Export the values to a CSV file
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
