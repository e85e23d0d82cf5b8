use serde_json::Value;

use super::scalar_text;

/// Key answer fields, most important first.
const PRIORITY_KEYS: &[&str] = &[
    "installment_display",
    "installment",
    "analise",
    "mensagem",
    "valor_display",
    "valor_sugerido",
    "imported",
    "version",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_text(value));
}

/// Look for well-known answer fields in priority order, then fall back to the
/// first field. Listings print one company per line.
fn minimal_text(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Object(map) => {
            for key in PRIORITY_KEYS {
                if let Some(val) = map.get(*key) {
                    if !val.is_null() {
                        return scalar_text(val, "null");
                    }
                }
            }
            match map.iter().next() {
                Some((key, val)) => format!("{}: {}", key, scalar_text(val, "null")),
                None => String::new(),
            }
        }
        Value::Array(items) => items
            .iter()
            .map(|item| match (item.get("id"), item.get("empresa")) {
                (Some(id), Some(name)) => {
                    format!("{}\t{}", scalar_text(id, ""), scalar_text(name, ""))
                }
                _ => scalar_text(item, "null"),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => scalar_text(other, "null"),
    }
}
