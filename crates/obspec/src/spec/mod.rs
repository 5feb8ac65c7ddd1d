//! Observation specs: grouped request descriptors for the v2 observation API.

mod builder;
mod endpoint;

pub use builder::{
    build_observation_spec_manifest, build_observation_specs, EntitySelector, ObservationFilter,
    ObservationRole, ObservationSpec, ObservationSpecManifest, ObservationSpecOptions,
    HIGHEST_COVERAGE_DATE,
};
pub use endpoint::{
    ApiTarget, HostContext, CUSTOM_DC_API_PATH, DEFAULT_API_ENDPOINT, DEFAULT_API_V2_ENDPOINT,
};
