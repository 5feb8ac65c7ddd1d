//! Core data model shared by the builders, fetchers and emitters.

mod dcid;
mod facet;
mod series;
mod stat_var;

pub use dcid::Dcid;
pub use facet::{FacetId, FacetResponse, StatMetadata, StatVarFacetMap};
pub use series::{
    EntitySeries, Observation, PlaceSeries, PlaceSeriesMap, Series, SeriesAllApiResponse,
    SeriesApiResponse,
};
pub use stat_var::StatVarSpec;
