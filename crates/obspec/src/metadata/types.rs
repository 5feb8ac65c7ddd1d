//! Shapes of the variable-info and provenance lookups, and the metadata rows
//! built from them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Dcid, StatMetadata};

/// Attributes distinguishing series within one provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling_factor: Option<String>,
}

/// One series of a stat var within a provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    #[serde(default)]
    pub series_key: SeriesKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_date: Option<String>,
}

impl SeriesSummary {
    pub fn new(series_key: SeriesKey) -> Self {
        Self {
            series_key,
            ..Self::default()
        }
    }

    /// Set the covered date range.
    pub fn with_dates(mut self, earliest: impl Into<String>, latest: impl Into<String>) -> Self {
        self.earliest_date = Some(earliest.into());
        self.latest_date = Some(latest.into());
        self
    }
}

/// A stat var's series under one provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_frequency: Option<String>,
    #[serde(default)]
    pub series_summary: Vec<SeriesSummary>,
}

/// Response of `/api/variable/info` for one stat var, keyed by provenance
/// id (`dc/base/{importName}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatVarProvenanceSummaries {
    #[serde(default)]
    pub provenance_summary: HashMap<String, ProvenanceSummary>,
}

impl StatVarProvenanceSummaries {
    /// Series summaries listed for a provenance.
    pub fn series_for(&self, provenance_id: &str) -> Option<&[SeriesSummary]> {
        self.provenance_summary
            .get(provenance_id)
            .map(|p| p.series_summary.as_slice())
    }
}

/// Object of an outgoing triple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripleNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Outgoing triples of a provenance node, keyed by property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Provenance(HashMap<String, Vec<TripleNode>>);

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple object for a property.
    pub fn with(mut self, prop: impl Into<String>, node: TripleNode) -> Self {
        self.0.entry(prop.into()).or_default().push(node);
        self
    }

    /// First object of a property.
    pub fn first(&self, prop: &str) -> Option<&TripleNode> {
        self.0.get(prop).and_then(|nodes| nodes.first())
    }

    fn first_name(&self, prop: &str) -> Option<&str> {
        self.first(prop)
            .and_then(|n| n.name.as_deref())
            .filter(|s| !s.is_empty())
    }

    fn first_value(&self, prop: &str) -> Option<&str> {
        self.first(prop)
            .and_then(|n| n.value.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Display name: the dataset it is part of, else its own name, else the
    /// import name.
    pub fn display_name(&self, import_name: &str) -> String {
        self.first_name("isPartOf")
            .or_else(|| self.first_value("name"))
            .unwrap_or(import_name)
            .to_string()
    }

    pub fn source_name(&self) -> Option<String> {
        self.first_name("source").map(str::to_string)
    }

    pub fn url(&self) -> Option<String> {
        self.first_value("url").map(str::to_string)
    }

    /// License name and DCID.
    pub fn license(&self) -> (Option<String>, Option<String>) {
        match self.first("licenseType") {
            Some(node) => (node.name.clone(), node.dcid.clone()),
            None => (None, None),
        }
    }
}

/// Provenance node id of an import.
pub fn provenance_id(import_name: &str) -> String {
    format!("dc/base/{}", import_name)
}

/// A node and its display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedNode {
    pub dcid: Dcid,
    pub name: String,
}

/// Metadata of one facet of a stat var, as shown in the metadata dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatVarMetadata {
    pub stat_var_id: String,
    pub stat_var_name: String,
    pub categories: Vec<String>,
    pub source_name: Option<String>,
    pub provenance_url: Option<String>,
    pub provenance_name: String,
    pub date_range_start: Option<String>,
    pub date_range_end: Option<String>,
    pub unit: Option<String>,
    pub observation_period: Option<String>,
    pub periodicity: Option<String>,
    pub license: Option<String>,
    pub license_dcid: Option<String>,
    pub measurement_method: Option<String>,
    pub measurement_method_description: Option<String>,
}

/// Whether a series key agrees with every attribute the facet sets.
///
/// Only called on series of the facet's own provenance, so the key
/// attributes are the only ones that can differ.
pub fn series_facet_match(series: &SeriesSummary, facet: &StatMetadata) -> bool {
    fn agrees(facet_value: &Option<String>, key_value: &Option<String>) -> bool {
        facet_value.is_none() || facet_value == key_value
    }
    let key = &series.series_key;
    agrees(&facet.measurement_method, &key.measurement_method)
        && agrees(&facet.observation_period, &key.observation_period)
        && agrees(&facet.unit, &key.unit)
        && agrees(&facet.scaling_factor, &key.scaling_factor)
}

/// First series matching the facet, in list order. Series sharing an
/// identical key have no precedence beyond that order.
pub fn match_series_by_facet<'a>(
    series: &'a [SeriesSummary],
    facet: &StatMetadata,
) -> Option<&'a SeriesSummary> {
    series.iter().find(|s| series_facet_match(s, facet))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(mm: Option<&str>, unit: Option<&str>) -> SeriesKey {
        SeriesKey {
            measurement_method: mm.map(str::to_string),
            observation_period: Some("P1Y".to_string()),
            unit: unit.map(str::to_string),
            scaling_factor: None,
        }
    }

    #[test]
    fn test_unset_facet_fields_match_anything() {
        let series = SeriesSummary::new(key(Some("CensusACS5yrSurvey"), Some("USDollar")));
        assert!(series_facet_match(&series, &StatMetadata::new()));
        assert!(series_facet_match(
            &series,
            &StatMetadata::new().with_unit("USDollar")
        ));
        assert!(!series_facet_match(
            &series,
            &StatMetadata::new().with_unit("Percent")
        ));
    }

    #[test]
    fn test_first_match_wins() {
        let series = vec![
            SeriesSummary::new(key(Some("A"), None)).with_dates("2000", "2010"),
            SeriesSummary::new(key(Some("B"), None)).with_dates("2001", "2011"),
            SeriesSummary::new(key(Some("B"), None)).with_dates("2002", "2012"),
        ];
        let facet = StatMetadata::new().with_measurement_method("B");
        let matched = match_series_by_facet(&series, &facet).unwrap();
        assert_eq!(matched.earliest_date.as_deref(), Some("2001"));
        assert!(
            match_series_by_facet(&series, &StatMetadata::new().with_measurement_method("C"))
                .is_none()
        );
    }

    #[test]
    fn test_provenance_display_name_fallbacks() {
        let named = Provenance::new().with(
            "name",
            TripleNode {
                value: Some("USGS Water Use".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(named.display_name("USGSWaterUse"), "USGS Water Use");

        let part_of = named.clone().with(
            "isPartOf",
            TripleNode {
                name: Some("USGS".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(part_of.display_name("USGSWaterUse"), "USGS");

        assert_eq!(Provenance::new().display_name("USGSWaterUse"), "USGSWaterUse");
    }

    #[test]
    fn test_provenance_deserializes_from_triples() {
        let json = r#"{
            "source": [{"dcid": "dc/s/USGS", "name": "USGS"}],
            "url": [{"value": "https://water.usgs.gov"}],
            "licenseType": [{"dcid": "dc/l/CC0", "name": "CC0"}]
        }"#;
        let prov: Provenance = serde_json::from_str(json).unwrap();
        assert_eq!(prov.source_name().as_deref(), Some("USGS"));
        assert_eq!(prov.url().as_deref(), Some("https://water.usgs.gov"));
        assert_eq!(
            prov.license(),
            (Some("CC0".to_string()), Some("dc/l/CC0".to_string()))
        );
    }
}
