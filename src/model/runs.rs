//! Run listing, selection, and the adapter-spec comparison table.

use crate::artifacts::{Field, RunSpec, Schema};
use crate::format;
use crate::route::RunSpecSelector;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// Runs whose name matches `query` anywhere. An unparsable query filters nothing.
pub fn filter_runs<'a>(run_specs: &'a [RunSpec], query: &str) -> Vec<&'a RunSpec> {
    let re = match Regex::new(query) {
        Ok(re) => re,
        Err(e) => {
            warn!("ignoring invalid run filter {:?}: {}", query, e);
            return run_specs.iter().collect();
        }
    };
    run_specs.iter().filter(|r| re.is_match(&r.name)).collect()
}

pub fn select_runs(run_specs: &[RunSpec], selector: &RunSpecSelector) -> Vec<RunSpec> {
    run_specs
        .iter()
        .filter(|r| selector.matches(&r.name))
        .cloned()
        .collect()
}

/// Short labels for each run, built from the adapter settings where runs differ.
pub fn run_display_names(run_specs: &[RunSpec]) -> Vec<String> {
    let specs: Vec<_> = run_specs.iter().map(|r| r.adapter_spec.clone()).collect();
    format::find_diff(&specs)
        .iter()
        .map(format::render_dict)
        .collect()
}

#[derive(Debug, Clone)]
pub struct AdapterRow {
    pub key: String,
    pub help: String,
    pub values: Vec<AdapterValue>,
}

#[derive(Debug, Clone)]
pub struct AdapterValue {
    pub text: String,
    /// Tooltip for enumerated values.
    pub title: Option<String>,
}

/// One row per adapter key present in any run, in schema order.
pub fn adapter_rows(schema: &Schema, run_specs: &[RunSpec]) -> Vec<AdapterRow> {
    let key_lists: Vec<Vec<String>> = run_specs
        .iter()
        .map(|r| r.adapter_spec.keys().cloned().collect())
        .collect();
    let mut keys = format::canonicalize_list(&key_lists);
    format::sort_by_reference_order(&mut keys, &schema.adapter_field_names());

    keys.into_iter()
        .map(|key| {
            let field = schema.adapter_field(&key);
            let values = run_specs
                .iter()
                .map(|r| render_field_value(&field, r.adapter_spec.get(&key)))
                .collect();
            AdapterRow {
                help: field.describe(),
                key,
                values,
            }
        })
        .collect()
}

fn render_field_value(field: &Field, value: Option<&Value>) -> AdapterValue {
    let Some(value) = value else {
        return AdapterValue {
            text: String::new(),
            title: None,
        };
    };
    match &field.values {
        None => {
            let text = if field.name == "stop_sequences" {
                value.to_string()
            } else {
                format::value_text(value)
            };
            AdapterValue { text, title: None }
        }
        Some(values) => {
            let text = format::value_text(value);
            let title = values
                .iter()
                .find(|v| v.name == text)
                .and_then(|v| v.description.clone())
                .unwrap_or_else(|| "(no description)".to_string());
            AdapterValue {
                text,
                title: Some(title),
            }
        }
    }
}
