use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::LoanCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::validate::{out_of_range, require_non_negative, require_positive};
use crate::LoanCalcResult;

// ---------------------------------------------------------------------------
// Ownership rules
// ---------------------------------------------------------------------------

const NO_PROPERTY_LTV: Percent = dec!(75);
const HAS_PROPERTY_LTV: Percent = dec!(50);
const SELLING_PROPERTY_LTV: Percent = dec!(70);

const PERCENT: Decimal = dec!(100);

/// Borrower's existing property situation, which caps the loan-to-value
/// ratio for a mortgage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyOwnershipStatus {
    /// First property: up to 75% financing.
    NoProperty,
    /// Already owns a property: up to 50% financing.
    HasProperty,
    /// Selling the current property to buy: up to 70% financing.
    SellingProperty,
}

impl PropertyOwnershipStatus {
    pub const ALL: [PropertyOwnershipStatus; 3] = [
        PropertyOwnershipStatus::NoProperty,
        PropertyOwnershipStatus::HasProperty,
        PropertyOwnershipStatus::SellingProperty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyOwnershipStatus::NoProperty => "no_property",
            PropertyOwnershipStatus::HasProperty => "has_property",
            PropertyOwnershipStatus::SellingProperty => "selling_property",
        }
    }
}

impl fmt::Display for PropertyOwnershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyOwnershipStatus {
    type Err = LoanCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "no_property" => Ok(PropertyOwnershipStatus::NoProperty),
            "has_property" => Ok(PropertyOwnershipStatus::HasProperty),
            "selling_property" => Ok(PropertyOwnershipStatus::SellingProperty),
            other => Err(LoanCalcError::invalid(
                "ownership_status",
                format!(
                    "unrecognised ownership status '{other}' \
                     (expected no_property, has_property or selling_property)"
                ),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownPaymentInput {
    pub property_value: Money,
    pub ownership_status: PropertyOwnershipStatus,
    /// Optional down payment to check against the minimum.
    #[serde(default)]
    pub proposed_down_payment: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownPaymentOutput {
    pub ltv_ceiling: Percent,
    pub minimum_down_payment: Money,
    pub maximum_loan: Money,
    pub proposed_ltv: Option<Percent>,
    pub meets_requirement: Option<bool>,
}

// ---------------------------------------------------------------------------
// Scalar API
// ---------------------------------------------------------------------------

/// Maximum loan-to-value percentage for an ownership status.
pub fn resolve_ltv_ceiling(status: PropertyOwnershipStatus) -> Percent {
    match status {
        PropertyOwnershipStatus::NoProperty => NO_PROPERTY_LTV,
        PropertyOwnershipStatus::HasProperty => HAS_PROPERTY_LTV,
        PropertyOwnershipStatus::SellingProperty => SELLING_PROPERTY_LTV,
    }
}

/// Ceiling lookup from a textual status. Unknown names are rejected rather
/// than mapped to a default ceiling.
pub fn resolve_ltv_ceiling_by_name(name: &str) -> LoanCalcResult<Percent> {
    name.parse::<PropertyOwnershipStatus>()
        .map(resolve_ltv_ceiling)
}

/// `property_value * (1 - ceiling / 100)`, unrounded.
pub fn compute_minimum_down_payment(
    property_value: Money,
    status: PropertyOwnershipStatus,
) -> LoanCalcResult<Money> {
    require_positive("property_value", property_value)?;
    Ok(property_value * (Decimal::ONE - resolve_ltv_ceiling(status) / PERCENT))
}

/// Largest loan the ownership ceiling allows on a property.
pub fn maximum_loan_amount(
    property_value: Money,
    status: PropertyOwnershipStatus,
) -> LoanCalcResult<Money> {
    require_positive("property_value", property_value)?;
    property_value
        .checked_mul(resolve_ltv_ceiling(status))
        .map(|v| v / PERCENT)
        .ok_or_else(|| out_of_range("property_value"))
}

/// Loan-to-value ratio as a percentage.
pub fn ltv_ratio(loan_amount: Money, property_value: Money) -> LoanCalcResult<Percent> {
    require_non_negative("loan_amount", loan_amount)?;
    require_positive("property_value", property_value)?;
    loan_amount
        .checked_div(property_value)
        .and_then(|share| share.checked_mul(PERCENT))
        .ok_or_else(|| out_of_range("loan_amount"))
}

// ---------------------------------------------------------------------------
// Envelope API
// ---------------------------------------------------------------------------

/// Minimum down payment and loan ceiling for a purchase, optionally checking
/// a proposed down payment against them.
pub fn calculate_down_payment(
    input: &DownPaymentInput,
) -> LoanCalcResult<ComputationOutput<DownPaymentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let ltv_ceiling = resolve_ltv_ceiling(input.ownership_status);
    let minimum_down_payment =
        compute_minimum_down_payment(input.property_value, input.ownership_status)?;
    let maximum_loan = input.property_value - minimum_down_payment;

    let (proposed_ltv, meets_requirement) = match input.proposed_down_payment {
        Some(down) => {
            require_non_negative("proposed_down_payment", down)?;
            if down > input.property_value {
                return Err(LoanCalcError::invalid(
                    "proposed_down_payment",
                    "cannot exceed the property value",
                ));
            }
            let ltv = ltv_ratio(input.property_value - down, input.property_value)?;
            let meets = down >= minimum_down_payment;
            if !meets {
                warnings.push(format!(
                    "Proposed down payment {down} is below the required {}; LTV {} exceeds the {ltv_ceiling}% ceiling.",
                    minimum_down_payment.round_dp(2),
                    ltv.round_dp(2),
                ));
            }
            (Some(ltv.round_dp(2)), Some(meets))
        }
        None => (None, None),
    };

    let output = DownPaymentOutput {
        ltv_ceiling,
        minimum_down_payment,
        maximum_loan,
        proposed_ltv,
        meets_requirement,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "ownership_status": input.ownership_status.as_str(),
        "ltv_ceilings": {
            "no_property": NO_PROPERTY_LTV.to_string(),
            "has_property": HAS_PROPERTY_LTV.to_string(),
            "selling_property": SELLING_PROPERTY_LTV.to_string(),
        },
    });

    Ok(with_metadata(
        "Ownership-based LTV ceiling",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ceilings_by_status() {
        assert_eq!(resolve_ltv_ceiling(PropertyOwnershipStatus::NoProperty), dec!(75));
        assert_eq!(resolve_ltv_ceiling(PropertyOwnershipStatus::HasProperty), dec!(50));
        assert_eq!(resolve_ltv_ceiling(PropertyOwnershipStatus::SellingProperty), dec!(70));
    }

    #[test]
    fn test_ceiling_ordering() {
        let none = resolve_ltv_ceiling(PropertyOwnershipStatus::NoProperty);
        let selling = resolve_ltv_ceiling(PropertyOwnershipStatus::SellingProperty);
        let owned = resolve_ltv_ceiling(PropertyOwnershipStatus::HasProperty);
        assert!(none > selling && selling > owned);
    }

    #[test]
    fn test_ceiling_by_name() {
        assert_eq!(resolve_ltv_ceiling_by_name("no_property").unwrap(), dec!(75));
        assert_eq!(resolve_ltv_ceiling_by_name("Selling-Property").unwrap(), dec!(70));
        match resolve_ltv_ceiling_by_name("renting").unwrap_err() {
            LoanCalcError::InvalidArgument { field, .. } => assert_eq!(field, "ownership_status"),
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_status_round_trips_through_names() {
        for status in PropertyOwnershipStatus::ALL {
            assert_eq!(status.as_str().parse::<PropertyOwnershipStatus>().unwrap(), status);
        }
        let json = serde_json::to_string(&PropertyOwnershipStatus::HasProperty).unwrap();
        assert_eq!(json, "\"has_property\"");
    }

    #[test]
    fn test_minimum_down_payments_on_million() {
        let value = dec!(1_000_000);
        assert_eq!(
            compute_minimum_down_payment(value, PropertyOwnershipStatus::NoProperty).unwrap(),
            dec!(250_000)
        );
        assert_eq!(
            compute_minimum_down_payment(value, PropertyOwnershipStatus::HasProperty).unwrap(),
            dec!(500_000)
        );
        assert_eq!(
            compute_minimum_down_payment(value, PropertyOwnershipStatus::SellingProperty).unwrap(),
            dec!(300_000)
        );
    }

    #[test]
    fn test_down_payment_plus_max_loan_is_value() {
        let value = dec!(1_234_567.89);
        for status in PropertyOwnershipStatus::ALL {
            let down = compute_minimum_down_payment(value, status).unwrap();
            let max_loan = maximum_loan_amount(value, status).unwrap();
            assert_eq!(down + max_loan, value);
        }
    }

    #[test]
    fn test_non_positive_property_value_rejected() {
        assert!(compute_minimum_down_payment(Decimal::ZERO, PropertyOwnershipStatus::NoProperty)
            .is_err());
        assert!(ltv_ratio(dec!(100), dec!(-5)).is_err());
    }

    #[test]
    fn test_ltv_ratio() {
        assert_eq!(ltv_ratio(dec!(600_000), dec!(800_000)).unwrap(), dec!(75));
    }

    #[test]
    fn test_ratios_beyond_decimal_range_rejected() {
        let err = ltv_ratio(dec!(1e27), dec!(0.001)).unwrap_err();
        match err {
            LoanCalcError::InvalidArgument { field, reason } => {
                assert_eq!(field, "loan_amount");
                assert!(reason.contains("decimal range"));
            }
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
        assert!(maximum_loan_amount(Decimal::MAX, PropertyOwnershipStatus::NoProperty).is_err());
    }

    #[test]
    fn test_proposed_down_payment_check() {
        let output = calculate_down_payment(&DownPaymentInput {
            property_value: dec!(1_000_000),
            ownership_status: PropertyOwnershipStatus::NoProperty,
            proposed_down_payment: Some(dec!(200_000)),
        })
        .unwrap();
        let result = &output.result;
        assert_eq!(result.maximum_loan, dec!(750_000));
        assert_eq!(result.proposed_ltv, Some(dec!(80)));
        assert_eq!(result.meets_requirement, Some(false));
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_proposed_down_payment_above_value_rejected() {
        let err = calculate_down_payment(&DownPaymentInput {
            property_value: dec!(500_000),
            ownership_status: PropertyOwnershipStatus::HasProperty,
            proposed_down_payment: Some(dec!(600_000)),
        })
        .unwrap_err();
        match err {
            LoanCalcError::InvalidArgument { field, .. } => {
                assert_eq!(field, "proposed_down_payment")
            }
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
    }
}
