use serde_json::Value;
use std::io::{self, Write};

use super::scalar_text;

/// Keys whose array value is the main payload of a command's output.
const ROW_KEYS: &[&str] = &["schedule", "companies"];

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(stdout.lock(), value) {
        eprintln!("CSV output error: {}", e);
    }
}

fn write_csv<W: Write>(out: W, value: &Value) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);

    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            let rows = ROW_KEYS
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_array));

            match rows {
                Some(rows) => write_rows(&mut wtr, rows)?,
                None => {
                    wtr.write_record(["field", "value"])?;
                    for (key, val) in body {
                        wtr.write_record([key.as_str(), &scalar_text(val, "")])?;
                    }
                }
            }
        }
        Value::Array(arr) => write_rows(&mut wtr, arr)?,
        other => wtr.write_record([&scalar_text(other, "")])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> Result<(), csv::Error> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([&scalar_text(item, "")])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(|v| scalar_text(v, "")).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn csv_string(value: &Value) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, value).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_schedule_rows() {
        let value = json!({
            "result": {
                "installment": "945.60",
                "schedule": [
                    { "period": 1, "payment": "945.60" },
                    { "period": 2, "payment": "945.60" }
                ]
            }
        });
        assert_eq!(
            csv_string(&value),
            "payment,period\n945.60,1\n945.60,2\n"
        );
    }

    #[test]
    fn test_flat_object_as_field_value() {
        let value = json!({ "analise": "Boa, estável", "id": 5001 });
        assert_eq!(
            csv_string(&value),
            "field,value\nanalise,\"Boa, estável\"\nid,5001\n"
        );
    }
}
