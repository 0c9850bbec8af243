//! Turns any accepted document shape into summary rows.

use crate::kv::parse_key_value_list;
use crate::order::{OrderRecord, SummaryRow, project_summary};
use crate::statics;
use serde_json::Value;
use tracing::debug;

/// Normalizes a raw document into the ordered summary rows.
///
/// Never fails: unparseable or mis-shaped parts contribute nothing.
pub fn normalize_document(doc: &Value) -> Vec<SummaryRow> {
    if let Value::Object(wrapper) = doc
        && let Some(text) = wrapper.get(statics::F_TEXT)
    {
        let rows = rows_from_text(wrapper, text);
        if !rows.is_empty() {
            debug!(rows = rows.len(), "normalized from text payload");
            return rows;
        }
        debug!("text payload yielded no rows, falling back to document shape");
    }

    match doc {
        Value::Array(items) => {
            let rows: Vec<SummaryRow> = items.iter().filter_map(row_from_element).collect();
            debug!(elements = items.len(), rows = rows.len(), "normalized array document");
            rows
        }
        Value::Object(order) => vec![project_summary(order)],
        _ => {
            debug!("document is neither object nor array");
            Vec::new()
        }
    }
}

/// Shallow merge: `base` first, then `overlay` fields win.
pub(crate) fn merged(base: &OrderRecord, overlay: &OrderRecord) -> OrderRecord {
    let mut out = base.clone();
    for (k, v) in overlay {
        out.insert(k.clone(), v.clone());
    }
    out
}

fn rows_from_text(wrapper: &OrderRecord, text: &Value) -> Vec<SummaryRow> {
    match text {
        Value::String(s) => rows_from_text_string(wrapper, s),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(order) => Some(project_summary(&merged(order, wrapper))),
                Value::String(s) => {
                    parse_key_value_list(s).map(|parsed| project_summary(&merged(&parsed, wrapper)))
                }
                _ => None,
            })
            .collect(),
        Value::Object(order) => vec![project_summary(&merged(order, wrapper))],
        _ => Vec::new(),
    }
}

fn rows_from_text_string(wrapper: &OrderRecord, text: &str) -> Vec<SummaryRow> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => {
            let rows: Vec<SummaryRow> = items
                .iter()
                .filter_map(Value::as_object)
                .map(|order| project_summary(&merged(order, wrapper)))
                .collect();
            if !rows.is_empty() {
                return rows;
            }
        }
        Ok(Value::Object(order)) => return vec![project_summary(&merged(&order, wrapper))],
        _ => {}
    }

    match parse_key_value_list(text) {
        Some(parsed) => vec![project_summary(&merged(&parsed, wrapper))],
        None => Vec::new(),
    }
}

fn row_from_element(item: &Value) -> Option<SummaryRow> {
    match item {
        Value::Object(element) => match element.get(statics::F_TEXT) {
            Some(Value::String(text)) => {
                let parsed = parse_key_value_list(text)?;
                Some(project_summary(&merged(&parsed, element)))
            }
            _ => Some(project_summary(element)),
        },
        Value::String(s) => parse_key_value_list(s).map(|parsed| project_summary(&parsed)),
        _ => None,
    }
}
