//! Grouping of stat var selections into observation specs.
//!
//! Stat vars that share a date, an entity selection and a facet filter can be
//! fetched with a single call to the observation endpoint. The builder keeps
//! numerators and denominators in separate groups so that a denominator spec
//! can record which numerators it serves.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ObspecError, Result};
use crate::types::{Dcid, FacetId, StatVarFacetMap, StatVarSpec};

/// Date sentinel meaning "the date with the best coverage". The v2
/// observation endpoint has no such mode, so it resolves to latest.
pub const HIGHEST_COVERAGE_DATE: &str = "HIGHEST_COVERAGE";

/// Role of a spec in a (possibly per-capita) calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationRole {
    Numerator,
    Denominator,
}

/// Which entities a spec covers. The two forms are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntitySelector {
    /// Explicit list of entity DCIDs.
    #[serde(rename = "entityDcids")]
    Dcids(Vec<Dcid>),
    /// Graph expression such as `country/USA<-containedInPlace+{typeOf:State}`.
    #[serde(rename = "entityExpression")]
    Expression(String),
}

impl EntitySelector {
    fn group_key(&self) -> String {
        match self {
            EntitySelector::Dcids(dcids) => {
                let ids: Vec<&str> = dcids.iter().map(Dcid::as_str).collect();
                format!("dcids:{}", ids.join(","))
            }
            EntitySelector::Expression(expr) => format!("expr:{}", expr),
        }
    }

    pub fn dcids(&self) -> Option<&[Dcid]> {
        match self {
            EntitySelector::Dcids(dcids) => Some(dcids),
            EntitySelector::Expression(_) => None,
        }
    }

    pub fn expression(&self) -> Option<&str> {
        match self {
            EntitySelector::Dcids(_) => None,
            EntitySelector::Expression(expr) => Some(expr),
        }
    }
}

/// Facet restriction applied to an observation query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationFilter {
    pub facet_ids: Vec<FacetId>,
}

/// A single observation query covering one or more stat vars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationSpec {
    pub role: ObservationRole,

    /// Stat vars fetched by this query, first-seen order, no duplicates.
    pub stat_var_dcids: Vec<Dcid>,

    #[serde(flatten)]
    pub entity: EntitySelector,

    /// `YYYY[-MM[-DD]]`, or empty for the latest observation.
    #[serde(default)]
    pub date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ObservationFilter>,

    /// Numerators served by a denominator spec.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to: Vec<Dcid>,
}

impl ObservationSpec {
    /// Facet ids of the filter, empty when unfiltered.
    pub fn facet_ids(&self) -> &[FacetId] {
        self.filter
            .as_ref()
            .map(|f| f.facet_ids.as_slice())
            .unwrap_or(&[])
    }
}

/// Inputs to [`build_observation_specs`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationSpecOptions {
    pub stat_var_specs: Vec<StatVarSpec>,

    /// Facets selected per stat var; consulted for denominators.
    #[serde(default)]
    pub stat_var_to_facets: Option<StatVarFacetMap>,

    #[serde(default)]
    pub place_dcids: Vec<Dcid>,

    /// Cannot be combined with `place_dcids`.
    #[serde(default)]
    pub entity_expression: Option<String>,

    /// Date for stat vars that do not carry one.
    #[serde(default)]
    pub default_date: Option<String>,
}

impl ObservationSpecOptions {
    pub fn new(stat_var_specs: Vec<StatVarSpec>) -> Self {
        Self {
            stat_var_specs,
            ..Self::default()
        }
    }

    /// Select entities by DCID.
    pub fn with_places(mut self, places: Vec<Dcid>) -> Self {
        self.place_dcids = places;
        self
    }

    /// Select entities by expression.
    pub fn with_entity_expression(mut self, expression: impl Into<String>) -> Self {
        self.entity_expression = Some(expression.into());
        self
    }

    /// Set the stat var → facets map.
    pub fn with_facets(mut self, facets: StatVarFacetMap) -> Self {
        self.stat_var_to_facets = Some(facets);
        self
    }

    /// Set the default date.
    pub fn with_default_date(mut self, date: impl Into<String>) -> Self {
        self.default_date = Some(date.into());
        self
    }
}

/// Distinct terms referenced by a set of specs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationSpecManifest {
    pub entities: Vec<Dcid>,
    pub entity_expressions: Vec<String>,
    pub stat_vars: Vec<Dcid>,
}

/// Group stat var selections into the minimal set of observation specs.
///
/// Exactly one of `place_dcids` and `entity_expression` must be provided.
/// The result lists every numerator group, then every denominator group,
/// each in first-seen order.
///
/// # Example
///
/// ```
/// use obspec::{build_observation_specs, Dcid, ObservationSpecOptions, StatVarSpec};
///
/// let options = ObservationSpecOptions::new(vec![
///     StatVarSpec::new(Dcid::new("Count_Person_Male")?),
///     StatVarSpec::new(Dcid::new("Count_Person_Female")?),
/// ])
/// .with_places(Dcid::parse_all(["geoId/06"])?);
///
/// let specs = build_observation_specs(&options)?;
/// assert_eq!(specs.len(), 1);
/// assert_eq!(specs[0].stat_var_dcids.len(), 2);
/// # Ok::<(), obspec::ObspecError>(())
/// ```
pub fn build_observation_specs(options: &ObservationSpecOptions) -> Result<Vec<ObservationSpec>> {
    let entity = resolve_entities(&options.place_dcids, options.entity_expression.as_deref())?;
    let entity_key = entity.group_key();

    let mut numerators: IndexMap<String, ObservationSpec> = IndexMap::new();
    let mut denominators: IndexMap<String, ObservationSpec> = IndexMap::new();

    for sv_spec in &options.stat_var_specs {
        group_numerator(
            sv_spec,
            options.default_date.as_deref(),
            &entity,
            &entity_key,
            &mut numerators,
        );

        if let Some(denom) = &sv_spec.denom {
            group_denominator(
                sv_spec,
                denom,
                options.stat_var_to_facets.as_ref(),
                &entity,
                &entity_key,
                &mut denominators,
            );
        }
    }

    debug!(
        numerators = numerators.len(),
        denominators = denominators.len(),
        "built observation specs"
    );

    Ok(numerators
        .into_values()
        .chain(denominators.into_values())
        .collect())
}

/// Collect the distinct entities, expressions and stat vars of `specs`.
pub fn build_observation_spec_manifest(specs: &[ObservationSpec]) -> ObservationSpecManifest {
    let mut entities = IndexSet::new();
    let mut expressions = IndexSet::new();
    let mut stat_vars = IndexSet::new();

    for spec in specs {
        match &spec.entity {
            EntitySelector::Dcids(dcids) => entities.extend(dcids.iter().cloned()),
            EntitySelector::Expression(expr) if !expr.is_empty() => {
                expressions.insert(expr.clone());
            }
            EntitySelector::Expression(_) => {}
        }
        stat_vars.extend(spec.stat_var_dcids.iter().cloned());
    }

    ObservationSpecManifest {
        entities: entities.into_iter().collect(),
        entity_expressions: expressions.into_iter().collect(),
        stat_vars: stat_vars.into_iter().collect(),
    }
}

fn resolve_entities(places: &[Dcid], expression: Option<&str>) -> Result<EntitySelector> {
    let expression = expression.filter(|e| !e.is_empty());
    match (places.is_empty(), expression) {
        (false, None) => Ok(EntitySelector::Dcids(places.to_vec())),
        (true, Some(expr)) => Ok(EntitySelector::Expression(expr.to_string())),
        _ => Err(ObspecError::EntitySelection(
            "provide either place DCIDs or an entity expression (but not both)".to_string(),
        )),
    }
}

fn resolve_date(sv_date: Option<&str>, default_date: Option<&str>) -> String {
    let effective = sv_date.filter(|d| !d.is_empty()).or(default_date);
    match effective {
        Some(HIGHEST_COVERAGE_DATE) | None => String::new(),
        Some(date) => date.to_string(),
    }
}

fn group_numerator(
    sv_spec: &StatVarSpec,
    default_date: Option<&str>,
    entity: &EntitySelector,
    entity_key: &str,
    groups: &mut IndexMap<String, ObservationSpec>,
) {
    let date = resolve_date(sv_spec.date.as_deref(), default_date);
    let facet_ids: Option<Vec<FacetId>> = sv_spec
        .facet_id
        .as_ref()
        .filter(|id| !id.is_empty())
        .map(|id| vec![id.clone()]);
    let facet_key = facet_ids.as_ref().map(|ids| ids.join(",")).unwrap_or_default();
    let key = format!("num|date:{}|{}|facet:{}", date, entity_key, facet_key);

    let group = groups.entry(key).or_insert_with(|| ObservationSpec {
        role: ObservationRole::Numerator,
        stat_var_dcids: Vec::new(),
        entity: entity.clone(),
        date,
        filter: facet_ids.map(|facet_ids| ObservationFilter { facet_ids }),
        applies_to: Vec::new(),
    });

    if !group.stat_var_dcids.contains(&sv_spec.stat_var) {
        group.stat_var_dcids.push(sv_spec.stat_var.clone());
    }
}

fn group_denominator(
    sv_spec: &StatVarSpec,
    denom: &Dcid,
    stat_var_to_facets: Option<&StatVarFacetMap>,
    entity: &EntitySelector,
    entity_key: &str,
    groups: &mut IndexMap<String, ObservationSpec>,
) {
    let facet_ids: Option<Vec<FacetId>> = stat_var_to_facets
        .and_then(|map| map.facet_ids(denom.as_str()))
        .map(|set| {
            let mut ids: Vec<FacetId> = set.iter().cloned().collect();
            ids.sort();
            ids
        });
    let facet_key = facet_ids.as_ref().map(|ids| ids.join(",")).unwrap_or_default();
    let key = format!("{}|{}|{}", denom, entity_key, facet_key);

    match groups.get_mut(&key) {
        Some(group) => {
            if !group.applies_to.contains(&sv_spec.stat_var) {
                group.applies_to.push(sv_spec.stat_var.clone());
            }
        }
        None => {
            groups.insert(
                key,
                ObservationSpec {
                    role: ObservationRole::Denominator,
                    stat_var_dcids: vec![denom.clone()],
                    entity: entity.clone(),
                    date: String::new(),
                    filter: facet_ids.map(|facet_ids| ObservationFilter { facet_ids }),
                    applies_to: vec![sv_spec.stat_var.clone()],
                },
            );
        }
    }
}
