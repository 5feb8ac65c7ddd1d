//! Stat var selections as made in the tools.

use serde::{Deserialize, Serialize};

use super::{Dcid, FacetId};

/// One requested series: a stat var with optional denominator, facet pin,
/// date, unit and scaling. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatVarSpec {
    pub stat_var: Dcid,

    /// Denominator stat var for per-capita values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denom: Option<Dcid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_id: Option<FacetId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<f64>,
}

impl StatVarSpec {
    pub fn new(stat_var: Dcid) -> Self {
        Self {
            stat_var,
            denom: None,
            facet_id: None,
            date: None,
            unit: None,
            scaling: None,
        }
    }

    /// Set the denominator stat var.
    pub fn with_denom(mut self, denom: Dcid) -> Self {
        self.denom = Some(denom);
        self
    }

    /// Pin the series to one facet.
    pub fn with_facet_id(mut self, facet_id: impl Into<FacetId>) -> Self {
        self.facet_id = Some(facet_id.into());
        self
    }

    /// Set an explicit date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Set the display unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the scaling factor.
    pub fn with_scaling(mut self, scaling: f64) -> Self {
        self.scaling = Some(scaling);
        self
    }
}
