//! Python snippets for the v2 observation endpoint.
//!
//! Two flavours are produced: raw `requests` calls mirroring the cURL body,
//! and calls through the Data Commons Python client.

use std::collections::HashMap;

use crate::locale::{LocaleContext, MessageId};
use crate::spec::{ApiTarget, EntitySelector, ObservationRole, ObservationSpec};
use crate::types::Dcid;

use super::curl::SELECT_FIELDS;

const API_KEY_LINES: [&str; 2] = ["api_key = \"API_KEY\" # Replace with your API key", ""];

/// Placeholder used when the custom instance hostname is unknown.
const HOSTNAME_PLACEHOLDER: &str = "DC_HOSTNAME";

/// Render specs as a script of raw `requests.post` calls.
///
/// With more than one spec each block is titled with the stat var names and
/// its variables are suffixed `_1`, `_2`, ...
pub fn observation_specs_to_python_script(
    specs: &[ObservationSpec],
    stat_var_names: &HashMap<Dcid, String>,
    target: &ApiTarget,
    locale: &LocaleContext,
) -> String {
    let is_custom = target.is_custom();

    let mut intro = vec!["import requests".to_string(), String::new()];
    if !is_custom {
        intro.extend(API_KEY_LINES.iter().map(|l| l.to_string()));
    }
    intro.push(format!("url = \"{}\"", target.observation_url()));
    intro.push(if is_custom {
        "headers = {'Content-Type': 'application/json'}".to_string()
    } else {
        "headers = {'Content-Type': 'application/json', 'X-API-Key': f'{api_key}'}".to_string()
    });

    let multiple = specs.len() > 1;
    let blocks = specs.iter().enumerate().map(|(i, spec)| {
        let suffix = block_suffix(multiple, i);
        let mut lines = Vec::new();
        if multiple {
            lines.push(format!("# {}", block_title(spec, stat_var_names, locale)));
        }
        lines.push(format!("payload{} = {}", suffix, format_payload(spec)));
        lines.push(format!(
            "response{s} = requests.post(url, json=payload{s}, headers=headers)",
            s = suffix
        ));
        lines.push(format!("print(response{}.json())", suffix));
        lines.join("\n")
    });

    std::iter::once(intro.join("\n"))
        .chain(blocks)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render specs as a script using `DataCommonsClient.observation.fetch`.
pub fn observation_specs_to_client_script(
    specs: &[ObservationSpec],
    stat_var_names: &HashMap<Dcid, String>,
    target: &ApiTarget,
    locale: &LocaleContext,
) -> String {
    let is_custom = target.is_custom();

    let mut intro = vec![
        "# Requirements: pip install \"datacommons-client[Pandas]\"".to_string(),
        "import pandas as pd".to_string(),
        "from datacommons_client.client import DataCommonsClient".to_string(),
        String::new(),
    ];
    if is_custom {
        let hostname = target
            .custom_hostname()
            .unwrap_or_else(|| HOSTNAME_PLACEHOLDER.to_string());
        intro.push(format!("client = DataCommonsClient(dc_instance=\"{}\")", hostname));
    } else {
        intro.extend(API_KEY_LINES.iter().map(|l| l.to_string()));
        intro.push("client = DataCommonsClient(api_key=api_key)".to_string());
    }

    let multiple = specs.len() > 1;
    let blocks = specs.iter().enumerate().map(|(i, spec)| {
        let suffix = block_suffix(multiple, i);

        let mut params = vec![format!(
            "    variable_dcids={}",
            json_list(&spec.stat_var_dcids)
        )];
        if !spec.date.is_empty() {
            params.push(format!("    date='{}'", spec.date));
        }
        match &spec.entity {
            EntitySelector::Dcids(dcids) => {
                params.push(format!("    entity_dcids={}", json_list(dcids)));
            }
            EntitySelector::Expression(expr) => {
                params.push(format!("    entity_expression=\"{}\"", expr));
            }
        }
        let facet_ids = spec.facet_ids();
        if !facet_ids.is_empty() {
            params.push(format!("    filter_facet_ids={}", json_list(facet_ids)));
        }

        let mut lines = Vec::new();
        if multiple {
            lines.push(format!("# {}", block_title(spec, stat_var_names, locale)));
        }
        lines.push(format!("response{} = client.observation.fetch(", suffix));
        lines.push(params.join(",\n"));
        lines.push(")".to_string());
        lines.push(format!(
            "df{s} = pd.DataFrame(response{s}.to_observation_records().model_dump())",
            s = suffix
        ));
        lines.push(format!("print(df{})", suffix));
        lines.join("\n")
    });

    std::iter::once(intro.join("\n"))
        .chain(blocks)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn block_suffix(multiple: bool, index: usize) -> String {
    if multiple {
        format!("_{}", index + 1)
    } else {
        String::new()
    }
}

/// Comma-separated stat var names, with the denominator helper text
/// appended for denominator specs.
fn block_title(
    spec: &ObservationSpec,
    stat_var_names: &HashMap<Dcid, String>,
    locale: &LocaleContext,
) -> String {
    let names = spec
        .stat_var_dcids
        .iter()
        .map(|dcid| match stat_var_names.get(dcid) {
            Some(name) => name.as_str(),
            None => locale.stat_var_label(dcid.as_str()),
        })
        .collect::<Vec<_>>()
        .join(", ");
    match spec.role {
        ObservationRole::Numerator => names,
        ObservationRole::Denominator => {
            format!("{} {}", names, locale.message(MessageId::DenomHelperText))
        }
    }
}

/// The request payload as a Python dict literal.
fn format_payload(spec: &ObservationSpec) -> String {
    let mut entries = vec![format!("    \"select\": {}", json_list(&SELECT_FIELDS[..]))];
    if !spec.date.is_empty() {
        entries.push(format!("    \"date\": {}", json_string(&spec.date)));
    }
    entries.push(format!(
        "    \"variable\": {{\n        \"dcids\": {}\n    }}",
        json_list(&spec.stat_var_dcids)
    ));
    match &spec.entity {
        EntitySelector::Dcids(dcids) => entries.push(format!(
            "    \"entity\": {{\n        \"dcids\": {}\n    }}",
            json_list(dcids)
        )),
        EntitySelector::Expression(expr) => entries.push(format!(
            "    \"entity\": {{\n        \"expression\": {}\n    }}",
            json_string(expr)
        )),
    }
    let facet_ids = spec.facet_ids();
    if !facet_ids.is_empty() {
        entries.push(format!(
            "    \"filter\": {{\n        \"facet_ids\": {}\n    }}",
            json_list(facet_ids)
        ));
    }
    format!("{{\n{}\n}}", entries.join(",\n"))
}

/// Compact JSON array of strings, e.g. `["a","b"]`.
fn json_list<S: AsRef<str>>(items: &[S]) -> String {
    let items: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string())
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
