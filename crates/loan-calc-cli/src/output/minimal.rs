use serde_json::Value;

use super::{result_of, scalar_text};

/// Fields that answer the question each command asks, most specific first.
const PRIORITY_KEYS: [&str; 12] = [
    "approval_probability",
    "approved",
    "best_offer",
    "monthly_savings",
    "monthly_payment",
    "term_years",
    "remaining_balance",
    "minimum_down_payment",
    "ltv_ceiling",
    "ratio",
    "current_interest_rate",
    "payment_headroom",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

/// First non-null priority field of the result, else `key: value` for the
/// first non-null field, else the value itself.
pub fn minimal_line(value: &Value) -> String {
    let result = result_of(value);
    let Value::Object(map) = result else {
        return scalar_text(result);
    };

    PRIORITY_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|val| !val.is_null())
        .map(scalar_text)
        .or_else(|| {
            map.iter()
                .find(|(_, val)| !val.is_null())
                .map(|(key, val)| format!("{key}: {}", scalar_text(val)))
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_is_the_answer() {
        let v = json!({"result": {"monthly_payment": "5280", "total_payment": "1267200"}});
        assert_eq!(minimal_line(&v), "5280");
    }

    #[test]
    fn test_approval_wins_over_payment() {
        let v = json!({"result": {"loan": {"monthly_payment": "3960"}, "approved": false}});
        assert_eq!(minimal_line(&v), "false");
    }

    #[test]
    fn test_null_best_offer_is_skipped() {
        let v = json!({"result": {"best_offer": null, "monthly_spread": "442"}});
        assert_eq!(minimal_line(&v), "monthly_spread: 442");
    }

    #[test]
    fn test_all_null_result_is_blank() {
        let v = json!({"result": {"best_offer": null}});
        assert_eq!(minimal_line(&v), "");
    }

    #[test]
    fn test_fallback_to_first_field() {
        let v = json!({"business_path": "credit"});
        assert_eq!(minimal_line(&v), "business_path: credit");
    }
}
