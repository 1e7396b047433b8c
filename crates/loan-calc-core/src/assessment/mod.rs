//! Lender-style approval checks for mortgage and consumer credit requests.
//!
//! Each assessment runs a fixed list of criteria, reports every result, and
//! approves only when all of them pass. Payments are always priced through
//! [`crate::engine`].

pub mod credit;
pub mod mortgage;
pub mod probability;
pub mod scoring;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::engine::calculate_monthly_payment;
use crate::error::LoanCalcError;
use crate::types::{Money, Percent, Years};
use crate::validate::{require_non_negative, require_positive};
use crate::LoanCalcResult;

pub use credit::{assess_credit, CreditAssessment, CreditAssessmentInput, CreditStandards};
pub use mortgage::{
    assess_mortgage, MortgageAssessment, MortgageAssessmentInput, MortgageStandards,
};
pub use probability::{estimate_approval, ApprovalCategory, ApprovalEstimate, ApprovalEstimateInput};
pub use scoring::{BankRecommendation, CreditRiskLevel, CreditScoreTiers};

const PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// Lowest and highest scores on the bureau scale.
const CREDIT_SCORE_RANGE: (u32, u32) = (300, 850);

pub(crate) fn default_credit_score() -> u32 {
    750
}

pub(crate) fn default_employment_years() -> Years {
    Decimal::from(5)
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Ltv,
    Dti,
    AgeAtMaturity,
    StressTest,
    CreditScore,
    Employment,
    CreditToIncome,
    BreakEven,
    CashOut,
    Savings,
    DtiImprovement,
}

/// Outcome of one criterion. `actual` is rounded to one decimal place for
/// display; `passed` is decided on the unrounded value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion: Criterion,
    pub passed: bool,
    pub actual: Decimal,
    pub limit: Decimal,
}

impl CriterionResult {
    pub fn at_most(criterion: Criterion, actual: Decimal, limit: Decimal) -> Self {
        Self {
            criterion,
            passed: actual <= limit,
            actual: round_ratio(actual),
            limit: limit.normalize(),
        }
    }

    pub fn at_least(criterion: Criterion, actual: Decimal, limit: Decimal) -> Self {
        Self {
            criterion,
            passed: actual >= limit,
            actual: round_ratio(actual),
            limit: limit.normalize(),
        }
    }

    pub fn rejection_reason(&self) -> String {
        let (a, l) = (self.actual, self.limit);
        match self.criterion {
            Criterion::Ltv => format!("LTV ratio {a}% exceeds maximum {l}%"),
            Criterion::Dti => format!("DTI ratio {a}% exceeds maximum {l}%"),
            Criterion::AgeAtMaturity => format!("Age at maturity {a} exceeds maximum {l}"),
            Criterion::StressTest => format!("Stress test DTI {a}% exceeds maximum {l}%"),
            Criterion::CreditScore => {
                format!("Credit score {a} below minimum requirement {l}")
            }
            Criterion::Employment => {
                format!("Employment history {a} years below minimum {l} years")
            }
            Criterion::CreditToIncome => {
                format!("Credit amount {a}% of annual income exceeds maximum {l}%")
            }
            Criterion::BreakEven => {
                format!("Break-even period {a} months exceeds maximum {l} months")
            }
            Criterion::CashOut => {
                format!("Cash-out amount {a}% of annual income exceeds maximum {l}%")
            }
            Criterion::Savings => "Refinance does not provide monthly payment savings".into(),
            Criterion::DtiImprovement => "Refinance worsens debt-to-income ratio".into(),
        }
    }
}

/// Rejection reasons for every failed criterion, in evaluation order.
pub fn rejection_reasons(criteria: &[CriterionResult]) -> Vec<String> {
    criteria
        .iter()
        .filter(|c| !c.passed)
        .map(CriterionResult::rejection_reason)
        .collect()
}

pub fn all_passed(criteria: &[CriterionResult]) -> bool {
    criteria.iter().all(|c| c.passed)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// One decimal place, halves away from zero, trailing zeros dropped.
pub fn round_ratio(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// `debt / income * 100`. Income must already be validated as positive.
pub(crate) fn percent_of_income(debt: Money, monthly_income: Money) -> Percent {
    debt / monthly_income * PERCENT
}

/// Payment at a stressed rate and the DTI it implies.
pub(crate) fn stress_test(
    principal: Money,
    stress_rate: Percent,
    term_years: Years,
    other_monthly_debt: Money,
    monthly_income: Money,
) -> LoanCalcResult<(Money, Percent)> {
    let payment = calculate_monthly_payment(principal, stress_rate, term_years)?;
    Ok((
        payment,
        percent_of_income(payment + other_monthly_debt, monthly_income),
    ))
}

/// Borrower fields every assessment validates the same way.
pub(crate) fn validate_applicant(
    monthly_income: Money,
    monthly_expenses: Money,
    credit_score: u32,
    employment_years: Years,
    age: u32,
) -> LoanCalcResult<()> {
    require_positive("monthly_income", monthly_income)?;
    require_non_negative("monthly_expenses", monthly_expenses)?;
    require_non_negative("employment_years", employment_years)?;
    let (low, high) = CREDIT_SCORE_RANGE;
    if !(low..=high).contains(&credit_score) {
        return Err(LoanCalcError::invalid(
            "credit_score",
            format!("must be between {low} and {high} (got {credit_score})"),
        ));
    }
    if age < 18 {
        return Err(LoanCalcError::invalid(
            "age",
            format!("applicant must be an adult (got {age})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_at_most_boundary_passes() {
        let c = CriterionResult::at_most(Criterion::Dti, dec!(42), dec!(42));
        assert!(c.passed);
        let c = CriterionResult::at_most(Criterion::Dti, dec!(42.04), dec!(42));
        assert!(!c.passed);
        assert_eq!(c.actual, dec!(42.0));
    }

    #[test]
    fn test_rejection_reason_text() {
        let c = CriterionResult::at_most(Criterion::Ltv, dec!(87.5), dec!(80));
        assert_eq!(c.rejection_reason(), "LTV ratio 87.5% exceeds maximum 80%");
        let c = CriterionResult::at_least(Criterion::Employment, dec!(1), dec!(2));
        assert_eq!(
            c.rejection_reason(),
            "Employment history 1 years below minimum 2 years"
        );
    }

    #[test]
    fn test_reasons_only_for_failures() {
        let criteria = vec![
            CriterionResult::at_most(Criterion::Ltv, dec!(70), dec!(80)),
            CriterionResult::at_most(Criterion::Dti, dec!(45), dec!(42)),
            CriterionResult::at_least(Criterion::CreditScore, dec!(600), dec!(620)),
        ];
        assert!(!all_passed(&criteria));
        let reasons = rejection_reasons(&criteria);
        assert_eq!(reasons.len(), 2);
        assert!(reasons[0].starts_with("DTI ratio"));
    }

    #[test]
    fn test_round_ratio() {
        assert_eq!(round_ratio(dec!(32.45)), dec!(32.5));
        assert_eq!(round_ratio(dec!(26.4)), dec!(26.4));
        assert_eq!(round_ratio(dec!(85.00)).to_string(), "85");
    }

    #[test]
    fn test_validate_applicant() {
        assert!(validate_applicant(dec!(20_000), dec!(0), 750, dec!(5), 35).is_ok());
        assert!(validate_applicant(dec!(0), dec!(0), 750, dec!(5), 35).is_err());
        assert!(validate_applicant(dec!(20_000), dec!(0), 900, dec!(5), 35).is_err());
        assert!(validate_applicant(dec!(20_000), dec!(0), 750, dec!(5), 16).is_err());
    }
}
