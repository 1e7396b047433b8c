use colored::Colorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{result_of, scalar_text};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    print!("{}", render_table(value));
}

/// Scalar fields of the result go in one Field/Value table, nested objects
/// are flattened with dotted keys, and lists of records (offers, criteria,
/// bank quotes) get a table each.
pub fn render_table(value: &Value) -> String {
    let mut out = String::new();
    let result = result_of(value);

    match result {
        Value::Object(map) => {
            let mut fields = Vec::new();
            let mut lists = Vec::new();
            collect_fields("", map, &mut fields, &mut lists);

            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in fields {
                builder.push_record([key, val]);
            }
            out.push_str(&Table::from(builder).to_string());
            out.push('\n');

            for (key, records) in lists {
                out.push_str(&format!("\n{key}:\n"));
                out.push_str(&records_table(records));
            }
        }
        Value::Array(records) => out.push_str(&records_table(records)),
        other => {
            out.push_str(&scalar_text(other));
            out.push('\n');
        }
    }

    if let Some(envelope) = value.as_object() {
        if let Some(Value::Array(warnings)) = envelope.get("warnings") {
            if !warnings.is_empty() {
                out.push_str("\nWarnings:\n");
                for w in warnings.iter().filter_map(Value::as_str) {
                    out.push_str(&format!("  - {w}\n"));
                }
            }
        }
        if let Some(Value::String(meth)) = envelope.get("methodology") {
            out.push_str(&format!("\nMethodology: {meth}\n"));
        }
    }
    out
}

fn collect_fields<'a>(
    prefix: &str,
    map: &'a Map<String, Value>,
    fields: &mut Vec<(String, String)>,
    lists: &mut Vec<(String, &'a [Value])>,
) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => collect_fields(&name, inner, fields, lists),
            Value::Array(items) if items.iter().any(Value::is_object) => {
                lists.push((name, items.as_slice()))
            }
            Value::Array(items) => {
                let joined: Vec<String> = items.iter().map(scalar_text).collect();
                fields.push((name, joined.join("; ")));
            }
            Value::Bool(flag) if is_verdict(key) => fields.push((name, verdict(*flag))),
            other => fields.push((name, scalar_text(other))),
        }
    }
}

fn is_verdict(key: &str) -> bool {
    matches!(key, "approved" | "passed" | "worthwhile" | "meets_requirement")
}

fn verdict(flag: bool) -> String {
    if flag {
        "yes".green().bold().to_string()
    } else {
        "no".red().bold().to_string()
    }
}

fn records_table(records: &[Value]) -> String {
    let Some(Value::Object(first)) = records.first() else {
        return "(empty)\n".to_string();
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in records {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(scalar_text).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    let mut out = Table::from(builder).to_string();
    out.push('\n');
    out
}
