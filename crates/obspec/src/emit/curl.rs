//! cURL commands for the v2 observation endpoint.

use crate::spec::{ApiTarget, EntitySelector, ObservationSpec};

/// Fields requested from the observation endpoint, in request order.
pub const SELECT_FIELDS: [&str; 5] = ["entity", "variable", "date", "value", "facet"];

/// Render one spec as a POST request against the observation endpoint.
///
/// The body always carries `date`, `variable`, the entity selector and
/// `select`; `filter` only appears when the spec pins facets. Standard
/// targets get an `X-API-Key` header, custom instances do not.
pub fn observation_spec_to_curl(spec: &ObservationSpec, target: &ApiTarget) -> String {
    let mut params = vec![
        format!("\"date\": \"{}\"", spec.date),
        format!("\"variable\": {{\"dcids\": [{}]}}", quote_list(&spec.stat_var_dcids)),
    ];

    match &spec.entity {
        EntitySelector::Dcids(dcids) if !dcids.is_empty() => {
            params.push(format!("\"entity\": {{\"dcids\": [{}]}}", quote_list(dcids)));
        }
        EntitySelector::Expression(expr) if !expr.is_empty() => {
            params.push(format!("\"entity\": {{\"expression\": \"{}\"}}", expr));
        }
        _ => {}
    }

    params.push(format!("\"select\": [{}]", quote_list(&SELECT_FIELDS[..])));

    let facet_ids = spec.facet_ids();
    if !facet_ids.is_empty() {
        params.push(format!("\"filter\": {{\"facet_ids\": [{}]}}", quote_list(facet_ids)));
    }

    let json_body = params
        .iter()
        .map(|p| format!("    {}", p))
        .collect::<Vec<_>>()
        .join(",\n");

    let mut lines = vec!["curl -X POST \\".to_string()];
    if !target.is_custom() {
        lines.push("  -H \"X-API-Key: ${API_KEY}\" \\".to_string());
    }
    lines.push("  -H \"Content-Type: application/json\" \\".to_string());
    lines.push(format!("  \"{}\" \\", target.observation_url()));
    lines.push(format!("  -d '{{\n{}\n  }}'", json_body));
    lines.join("\n")
}

/// One cURL command per spec, in spec order.
pub fn observation_specs_to_curl(specs: &[ObservationSpec], target: &ApiTarget) -> Vec<String> {
    specs
        .iter()
        .map(|spec| observation_spec_to_curl(spec, target))
        .collect()
}

fn quote_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("\"{}\"", item.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}
