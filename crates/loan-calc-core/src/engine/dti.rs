use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::validate::{out_of_range, require_non_negative, require_positive};
use crate::LoanCalcResult;

const PERCENT: Decimal = dec!(100);

/// Above this ratio lenders usually ask for extra income verification.
const ELEVATED_DTI: Percent = dec!(35);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DtiEvaluation {
    /// `(obligations + new payment) / income * 100`, unrounded.
    pub ratio: Percent,
    pub approved: bool,
    /// Additional monthly payment the borrower could take on before reaching
    /// the limit. Negative when already over it.
    pub payment_headroom: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtiInput {
    pub monthly_income: Money,
    #[serde(default)]
    pub existing_obligations: Money,
    pub new_payment: Money,
    pub max_dti_percent: Percent,
}

// ---------------------------------------------------------------------------
// Scalar API
// ---------------------------------------------------------------------------

/// Debt-to-income check. Approved when the ratio is at or below the limit.
pub fn evaluate_dti(
    monthly_income: Money,
    existing_obligations: Money,
    new_payment: Money,
    max_dti_percent: Percent,
) -> LoanCalcResult<DtiEvaluation> {
    require_positive("monthly_income", monthly_income)?;
    require_non_negative("existing_obligations", existing_obligations)?;
    require_non_negative("new_payment", new_payment)?;
    require_positive("max_dti_percent", max_dti_percent)?;

    let total_debt = existing_obligations
        .checked_add(new_payment)
        .ok_or_else(|| out_of_range("new_payment"))?;
    let ratio = total_debt
        .checked_div(monthly_income)
        .and_then(|share| share.checked_mul(PERCENT))
        .ok_or_else(|| out_of_range("monthly_income"))?;
    let payment_headroom = monthly_income
        .checked_mul(max_dti_percent)
        .map(|limit| limit / PERCENT)
        .and_then(|limit| limit.checked_sub(total_debt))
        .ok_or_else(|| out_of_range("max_dti_percent"))?;

    Ok(DtiEvaluation {
        ratio,
        approved: ratio <= max_dti_percent,
        payment_headroom,
    })
}

// ---------------------------------------------------------------------------
// Envelope API
// ---------------------------------------------------------------------------

pub fn calculate_dti(input: &DtiInput) -> LoanCalcResult<ComputationOutput<DtiEvaluation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let evaluation = evaluate_dti(
        input.monthly_income,
        input.existing_obligations,
        input.new_payment,
        input.max_dti_percent,
    )?;

    if !evaluation.approved {
        warnings.push(format!(
            "DTI {}% exceeds the {}% limit.",
            evaluation.ratio.round_dp(2),
            input.max_dti_percent
        ));
    } else if evaluation.ratio > ELEVATED_DTI {
        warnings.push(format!(
            "DTI {}% is above {ELEVATED_DTI}%; expect additional income verification.",
            evaluation.ratio.round_dp(2)
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "income_basis": "gross monthly",
        "max_dti_percent": input.max_dti_percent.to_string(),
    });

    Ok(with_metadata(
        "Debt-to-income ratio",
        &assumptions,
        warnings,
        elapsed,
        evaluation,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoanCalcError;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_dti_within_limit() {
        let eval = evaluate_dti(dec!(20_000), dec!(1_500), dec!(5_000), dec!(42)).unwrap();
        assert_eq!(eval.ratio, dec!(32.5));
        assert!(eval.approved);
        assert_eq!(eval.payment_headroom, dec!(1_900));
    }

    #[test]
    fn test_new_payment_only() {
        let eval = evaluate_dti(dec!(20_000), Decimal::ZERO, dec!(6_500), dec!(42)).unwrap();
        assert_eq!(eval.ratio, dec!(32.5));
        assert!(eval.approved);
    }

    #[test]
    fn test_dti_at_limit_is_approved() {
        let eval = evaluate_dti(dec!(10_000), dec!(0), dec!(4_200), dec!(42)).unwrap();
        assert_eq!(eval.ratio, dec!(42));
        assert!(eval.approved);
        assert_eq!(eval.payment_headroom, Decimal::ZERO);
    }

    #[test]
    fn test_dti_over_limit() {
        let eval = evaluate_dti(dec!(10_000), dec!(2_000), dec!(3_000), dec!(42)).unwrap();
        assert_eq!(eval.ratio, dec!(50));
        assert!(!eval.approved);
        assert!(eval.payment_headroom < Decimal::ZERO);
    }

    #[test]
    fn test_zero_income_rejected() {
        match evaluate_dti(Decimal::ZERO, dec!(0), dec!(1000), dec!(42)).unwrap_err() {
            LoanCalcError::InvalidArgument { field, .. } => assert_eq!(field, "monthly_income"),
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_obligations_rejected() {
        assert!(evaluate_dti(dec!(10_000), dec!(-1), dec!(1000), dec!(42)).is_err());
        assert!(evaluate_dti(dec!(10_000), dec!(0), dec!(-1000), dec!(42)).is_err());
        assert!(evaluate_dti(dec!(10_000), dec!(0), dec!(1000), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_ratio_beyond_decimal_range_rejected() {
        let err = evaluate_dti(dec!(0.0001), Decimal::ZERO, dec!(1e26), dec!(42)).unwrap_err();
        match err {
            LoanCalcError::InvalidArgument { field, reason } => {
                assert_eq!(field, "monthly_income");
                assert!(reason.contains("decimal range"));
            }
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
        assert!(evaluate_dti(dec!(1000), Decimal::MAX, Decimal::MAX, dec!(42)).is_err());
    }

    #[test]
    fn test_envelope_warnings() {
        let elevated = calculate_dti(&DtiInput {
            monthly_income: dec!(10_000),
            existing_obligations: dec!(1_000),
            new_payment: dec!(2_800),
            max_dti_percent: dec!(42),
        })
        .unwrap();
        assert!(elevated.result.approved);
        assert_eq!(elevated.warnings.len(), 1);

        let comfortable = calculate_dti(&DtiInput {
            monthly_income: dec!(20_000),
            existing_obligations: dec!(0),
            new_payment: dec!(3_000),
            max_dti_percent: dec!(42),
        })
        .unwrap();
        assert!(comfortable.warnings.is_empty());
    }
}
