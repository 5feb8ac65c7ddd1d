//! Obspec: observation query planning for Data Commons statistical data.
//!
//! Obspec turns a selection of stat vars and places into grouped v2
//! observation requests, renders them as ready-to-run cURL, Python and
//! BigQuery snippets, and fetches the data behind charts: per-capita series,
//! timeline series and enriched facet metadata.
//!
//! # Core Principles
//!
//! - **Deterministic text**: emitters are pure and byte-stable
//! - **Typed keys**: stat vars and places are validated [`Dcid`]s
//! - **Absence is data**: missing series are empty values, not errors
//!
//! # Example
//!
//! ```
//! use obspec::{build_observation_specs, observation_specs_to_curl};
//! use obspec::{ApiTarget, Dcid, ObservationSpecOptions, StatVarSpec};
//!
//! let options = ObservationSpecOptions::new(vec![StatVarSpec::new(Dcid::new("Count_Person")?)])
//!     .with_places(vec![Dcid::new("geoId/06")?]);
//!
//! let specs = build_observation_specs(&options)?;
//! let commands = observation_specs_to_curl(&specs, &ApiTarget::standard());
//! assert_eq!(commands.len(), 1);
//! assert!(commands[0].contains("Count_Person"));
//! # Ok::<(), obspec::ObspecError>(())
//! ```

pub mod api;
pub mod config;
pub mod emit;
pub mod error;
pub mod locale;
pub mod metadata;
pub mod percapita;
pub mod session;
pub mod spec;
pub mod stats;
pub mod timeline;
pub mod types;

pub use api::{DataCommonsApi, HttpApi, MockApi};
pub use config::{ApiConfig, EnrichmentConfig, ObspecConfig};
pub use emit::{
    get_timeline_sql_query, observation_spec_to_curl, observation_specs_to_client_script,
    observation_specs_to_curl, observation_specs_to_python_script, ChartGroupInfo, ChartOptions,
};
pub use error::{ObspecError, Result};
pub use locale::{LocaleContext, MessageId};
pub use metadata::{fetch_facets_with_metadata, fetch_metadata, MetadataResult, StatVarMetadata};
pub use percapita::{compute_per_capita, compute_ratio};
pub use session::{LoadEvent, LoadState, MetadataSession};
pub use spec::{
    build_observation_spec_manifest, build_observation_specs, ApiTarget, ObservationSpec,
    ObservationSpecOptions,
};
pub use stats::{fetch_stats_data, DataGroup, DataPoint, StatsData, StatsFetchOptions};
pub use timeline::{fetch_raw_data, get_stat_data, RatioOptions, TimelineRawData, TimelineStatData};
pub use types::{Dcid, FacetResponse, StatMetadata, StatVarFacetMap, StatVarSpec};
