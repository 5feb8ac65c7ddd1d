//! Query text emitters.
//!
//! Pure functions turning observation specs into example API calls (cURL,
//! Python) and timeline selections into BigQuery SQL. The output text is
//! compared byte for byte in tests, so formatting changes are breaking.

mod curl;
mod python;
mod sql;

pub use curl::{observation_spec_to_curl, observation_specs_to_curl, SELECT_FIELDS};
pub use python::{observation_specs_to_client_script, observation_specs_to_python_script};
pub use sql::{get_timeline_sql_query, ChartGroupInfo, ChartOptions, MetadataMap, MetahashMap};
