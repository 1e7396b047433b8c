use serde_json::Value;
use std::io::{self, Write};

use super::{result_of, scalar_text};

/// Keys whose record lists are emitted as rows instead of field/value pairs.
const ROW_KEYS: [&str; 2] = ["offers", "existing_loans"];

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(stdout.lock(), value) {
        eprintln!("CSV output error: {e}");
    }
}

/// Offer comparisons and consolidations become one row per record; every
/// other result becomes two-column `field,value` rows.
pub fn write_csv<W: Write>(writer: W, value: &Value) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    let result = result_of(value);

    match result {
        Value::Object(map) => {
            let rows = ROW_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array));
            match rows {
                Some(records) => write_records(&mut wtr, records)?,
                None => {
                    wtr.write_record(["field", "value"])?;
                    for (key, val) in map {
                        wtr.write_record([key.as_str(), &scalar_text(val)])?;
                    }
                }
            }
        }
        Value::Array(records) => write_records(&mut wtr, records)?,
        other => wtr.write_record([scalar_text(other)])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_records<W: Write>(wtr: &mut csv::Writer<W>, records: &[Value]) -> Result<(), csv::Error> {
    let Some(Value::Object(first)) = records.first() else {
        return Ok(());
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for item in records {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(scalar_text).unwrap_or_default())
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

    fn render(value: &Value) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, value).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_field_value_rows() {
        let out = render(&json!({"result": {"ltv_ceiling": "75", "approved": true}}));
        assert_eq!(out, "field,value\napproved,true\nltv_ceiling,75\n");
    }

    #[test]
    fn test_offers_become_rows() {
        let out = render(&json!({"result": {
            "best_offer": "Bank Leumi",
            "offers": [
                {"bank": "Bank Leumi", "monthly_payment": "5061"},
                {"bank": "Discount Bank", "monthly_payment": "5280"}
            ]
        }}));
        assert_eq!(
            out,
            "bank,monthly_payment\nBank Leumi,5061\nDiscount Bank,5280\n"
        );
    }
}
