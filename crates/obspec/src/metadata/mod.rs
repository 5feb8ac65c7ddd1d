//! Facet and stat var metadata enrichment.
//!
//! Base facets only carry identifiers (import name, measurement method DCID,
//! unit DCID). This module looks up the provenance triples, series
//! summaries and node names behind them and attaches display fields.

mod fetcher;
mod types;

pub use fetcher::{fetch_facets_with_metadata, fetch_metadata, MetadataResult};
pub use types::{
    match_series_by_facet, provenance_id, series_facet_match, NamedNode, Provenance,
    ProvenanceSummary, SeriesKey, SeriesSummary, StatVarMetadata, StatVarProvenanceSummaries,
    TripleNode,
};
