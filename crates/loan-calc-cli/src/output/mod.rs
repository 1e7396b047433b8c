pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Plain text for a scalar; compact JSON for anything nested.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// The `result` of an envelope, or the value itself when it is not one.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!("5280")), "5280");
        assert_eq!(scalar_text(&json!(true)), "true");
        assert_eq!(scalar_text(&Value::Null), "");
        assert_eq!(scalar_text(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_result_of_envelope() {
        let envelope = json!({"result": {"monthly_payment": "5280"}, "warnings": []});
        assert_eq!(result_of(&envelope)["monthly_payment"], "5280");
        let bare = json!({"ltv_ceiling": "75"});
        assert_eq!(result_of(&bare), &bare);
    }
}
