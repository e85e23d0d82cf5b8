use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::scalar_text;

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    println!("{}", render(value));
}

fn render(value: &Value) -> String {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => render_envelope(result, map),
            _ => render_object(map),
        },
        Value::Array(arr) => render_array(arr),
        other => scalar_text(other, "null"),
    }
}

/// Scalar fields as a Field/Value table; nested arrays of rows (the
/// amortization schedule, imported companies) as their own tables below it.
fn render_object(map: &Map<String, Value>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut sections = Vec::new();

    for (key, val) in map {
        match val {
            Value::Array(rows) if rows.iter().all(Value::is_object) && !rows.is_empty() => {
                sections.push(format!("\n{}:\n{}", key, render_array(rows)));
            }
            _ => builder.push_record([key.as_str(), &cell(val)]),
        }
    }

    let mut out = Table::from(builder).to_string();
    for section in sections {
        out.push_str(&section);
    }
    out
}

fn render_envelope(result: &Map<String, Value>, envelope: &Map<String, Value>) -> String {
    let mut out = render_object(result);

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            out.push_str("\n\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                out.push_str(&format!("\n  - {}", w));
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        out.push_str(&format!("\n\nMethodology: {}", meth));
    }
    out
}

fn render_array(arr: &[Value]) -> String {
    let Some(Value::Object(first)) = arr.first() else {
        if arr.is_empty() {
            return "(empty)".to_string();
        }
        return arr.iter().map(cell).collect::<Vec<_>>().join("\n");
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(cell).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    Table::from(builder).to_string()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Array(arr) => arr.iter().map(cell).collect::<Vec<_>>().join(", "),
        other => scalar_text(other, "null"),
    }
}
