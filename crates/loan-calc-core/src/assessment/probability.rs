//! Weighted approval-likelihood estimate for a prospective applicant.
//!
//! Each criterion is scored 0-100 by how much room it leaves under its limit,
//! and the scores are blended with fixed weights per loan type.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use super::credit::CreditStandards;
use super::mortgage::MortgageStandards;
use super::{
    default_credit_score, default_employment_years, percent_of_income, validate_applicant,
};
use crate::engine::{calculate_monthly_payment, ltv};
use crate::error::LoanCalcError;
use crate::types::{with_metadata, BusinessPath, ComputationOutput, Money, Percent, Years};
use crate::validate::{require_non_negative, require_positive};
use crate::LoanCalcResult;

const HUNDRED: Decimal = dec!(100);
const MONTHS_PER_YEAR: Decimal = dec!(12);

const DEFAULT_MORTGAGE_TERM: Years = dec!(25);
const DEFAULT_CREDIT_TERM: Years = dec!(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalCategory {
    Low,
    Fair,
    Good,
    Excellent,
}

impl ApprovalCategory {
    pub fn from_probability(probability: Decimal) -> Self {
        if probability >= dec!(80) {
            ApprovalCategory::Excellent
        } else if probability >= dec!(65) {
            ApprovalCategory::Good
        } else if probability >= dec!(45) {
            ApprovalCategory::Fair
        } else {
            ApprovalCategory::Low
        }
    }

    /// Indicative annual rate quoted alongside the category.
    pub fn estimated_rate(&self) -> Percent {
        match self {
            ApprovalCategory::Excellent => dec!(3.5),
            ApprovalCategory::Good => dec!(4.0),
            ApprovalCategory::Fair => dec!(4.5),
            ApprovalCategory::Low => dec!(5.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalEstimateInput {
    /// Mortgage paths use mortgage weights; credit paths use credit weights.
    pub business_path: BusinessPath,
    pub amount: Money,
    #[serde(default)]
    pub property_value: Option<Money>,
    pub annual_rate_percent: Percent,
    /// Defaults to 25 years for mortgages and 10 for credit.
    #[serde(default)]
    pub term_years: Option<Years>,
    pub monthly_income: Money,
    #[serde(default)]
    pub monthly_expenses: Money,
    #[serde(default)]
    pub existing_debts: Money,
    pub age: u32,
    #[serde(default = "default_credit_score")]
    pub credit_score: u32,
    #[serde(default = "default_employment_years")]
    pub employment_years: Years,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalEstimate {
    /// Whole percentage, 0-100.
    pub approval_probability: Decimal,
    pub category: ApprovalCategory,
    pub estimated_rate: Percent,
    pub estimated_payment: Money,
    pub criteria_scores: BTreeMap<String, Decimal>,
    pub main_concerns: Vec<String>,
    pub approval_tips: Vec<String>,
    pub next_steps: Vec<String>,
}

pub fn estimate_approval(
    input: &ApprovalEstimateInput,
) -> LoanCalcResult<ComputationOutput<ApprovalEstimate>> {
    let start = Instant::now();
    validate_input(input)?;

    let secured = input.business_path.is_secured();
    let term_years = input.term_years.unwrap_or(if secured {
        DEFAULT_MORTGAGE_TERM
    } else {
        DEFAULT_CREDIT_TERM
    });
    let estimated_payment =
        calculate_monthly_payment(input.amount, input.annual_rate_percent, term_years)?;
    let age_at_maturity = Decimal::from(input.age) + term_years;

    let mut scores: Vec<(&str, Decimal, Decimal)> = Vec::new();
    let mut main_concerns = Vec::new();
    let mut approval_tips = Vec::new();

    if secured {
        let standards = MortgageStandards::default();
        let property_value = input.property_value.ok_or_else(|| {
            LoanCalcError::invalid("property_value", "required for mortgage estimates")
        })?;
        let ltv_ratio = ltv::ltv_ratio(input.amount, property_value)?;
        let dti_ratio = percent_of_income(
            estimated_payment + input.monthly_expenses + input.existing_debts,
            input.monthly_income,
        );
        let tiers = standards.credit_tiers;

        scores.push(("ltv", headroom_score(ltv_ratio, standards.max_ltv), dec!(0.25)));
        scores.push(("dti", headroom_score(dti_ratio, standards.max_dti), dec!(0.25)));
        scores.push((
            "age",
            headroom_score(age_at_maturity, Decimal::from(standards.max_age_at_maturity)),
            dec!(0.15),
        ));
        scores.push((
            "credit",
            score_position(input.credit_score, tiers.minimum, tiers.excellent),
            dec!(0.25),
        ));
        scores.push((
            "employment",
            employment_score(input.employment_years, standards.min_employment_years),
            dec!(0.10),
        ));

        if ltv_ratio > standards.max_ltv * dec!(0.9) {
            main_concerns.push("High loan-to-value ratio".to_string());
        }
        if dti_ratio > standards.max_dti * dec!(0.9) {
            main_concerns.push("High debt-to-income ratio".to_string());
        }
        if input.credit_score < tiers.minimum + 50 {
            main_concerns.push("Credit score could be improved".to_string());
        }
        if ltv_ratio > standards.max_ltv * dec!(0.8) {
            approval_tips.push("Consider increasing down payment".to_string());
        }
        if dti_ratio > standards.max_dti * dec!(0.8) {
            approval_tips.push("Consider reducing monthly expenses".to_string());
        }
        if input.credit_score < tiers.excellent {
            approval_tips.push("Improving credit score can get better rates".to_string());
        }
    } else {
        let standards = CreditStandards::default();
        let dti_ratio = percent_of_income(
            estimated_payment + input.monthly_expenses + input.existing_debts,
            input.monthly_income,
        );
        let credit_to_income =
            percent_of_income(input.amount, input.monthly_income * MONTHS_PER_YEAR);
        let tiers = standards.credit_tiers;

        scores.push(("dti", headroom_score(dti_ratio, standards.max_dti), dec!(0.30)));
        scores.push((
            "credit_amount",
            headroom_score(credit_to_income, standards.max_credit_to_income),
            dec!(0.25),
        ));
        scores.push((
            "age",
            headroom_score(age_at_maturity, Decimal::from(standards.max_age_at_maturity)),
            dec!(0.10),
        ));
        scores.push((
            "credit",
            score_position(input.credit_score, tiers.minimum, tiers.excellent),
            dec!(0.25),
        ));
        scores.push((
            "employment",
            employment_score(input.employment_years, standards.min_employment_years),
            dec!(0.10),
        ));

        if dti_ratio > standards.max_dti * dec!(0.9) {
            main_concerns.push("High debt-to-income ratio".to_string());
        }
        if credit_to_income > standards.max_credit_to_income * dec!(0.8) {
            main_concerns.push("Credit amount high relative to income".to_string());
        }
        if input.credit_score < tiers.minimum + 60 {
            main_concerns.push("Credit score needs improvement".to_string());
        }
        if dti_ratio > standards.max_dti * dec!(0.8) {
            approval_tips.push("Consider reducing existing debts".to_string());
        }
        if credit_to_income > standards.max_credit_to_income * dec!(0.7) {
            approval_tips.push("Consider reducing loan amount".to_string());
        }
        if input.credit_score < tiers.excellent {
            approval_tips.push("Improving credit score can get better rates".to_string());
        }
    }

    let weighted: Decimal = scores.iter().map(|(_, score, weight)| *score * *weight).sum();
    let approval_probability =
        weighted.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let category = ApprovalCategory::from_probability(weighted);

    let next_steps = if category >= ApprovalCategory::Good {
        vec![
            "Proceed with application".to_string(),
            "Gather required documents".to_string(),
        ]
    } else {
        vec![
            "Improve criteria above".to_string(),
            "Consider adjusting loan parameters".to_string(),
        ]
    };

    let output = ApprovalEstimate {
        approval_probability,
        category,
        estimated_rate: category.estimated_rate(),
        estimated_payment,
        criteria_scores: scores
            .iter()
            .map(|(name, score, _)| (name.to_string(), score.round_dp(1)))
            .collect(),
        main_concerns,
        approval_tips,
        next_steps,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "term_years": term_years.to_string(),
        "weights": scores
            .iter()
            .map(|(name, _, weight)| (name.to_string(), weight.to_string()))
            .collect::<BTreeMap<_, _>>(),
    });

    Ok(with_metadata(
        "Weighted criterion headroom scoring",
        &assumptions,
        Vec::new(),
        elapsed,
        output,
    ))
}

/// `(limit - actual) / limit * 100`, clamped to 0-100.
fn headroom_score(actual: Decimal, limit: Decimal) -> Decimal {
    if limit <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((limit - actual) / limit * HUNDRED).clamp(Decimal::ZERO, HUNDRED)
}

/// Where a credit score sits between the minimum and excellent thresholds.
fn score_position(score: u32, minimum: u32, excellent: u32) -> Decimal {
    if excellent <= minimum {
        return if score >= minimum { HUNDRED } else { Decimal::ZERO };
    }
    let offset = Decimal::from(score) - Decimal::from(minimum);
    let span = Decimal::from(excellent - minimum);
    (offset / span * HUNDRED).clamp(Decimal::ZERO, HUNDRED)
}

fn employment_score(years: Years, required: Years) -> Decimal {
    if required <= Decimal::ZERO {
        return HUNDRED;
    }
    (years / required * HUNDRED).min(HUNDRED)
}

fn validate_input(input: &ApprovalEstimateInput) -> LoanCalcResult<()> {
    require_positive("amount", input.amount)?;
    require_non_negative("existing_debts", input.existing_debts)?;
    validate_applicant(
        input.monthly_income,
        input.monthly_expenses,
        input.credit_score,
        input.employment_years,
        input.age,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mortgage_input() -> ApprovalEstimateInput {
        ApprovalEstimateInput {
            business_path: BusinessPath::Mortgage,
            amount: dec!(600_000),
            property_value: Some(dec!(1_000_000)),
            annual_rate_percent: dec!(5),
            term_years: None,
            monthly_income: dec!(25_000),
            monthly_expenses: dec!(2_000),
            existing_debts: Decimal::ZERO,
            age: 35,
            credit_score: 760,
            employment_years: dec!(8),
        }
    }

    #[test]
    fn test_headroom_score_clamps() {
        assert_eq!(headroom_score(dec!(60), dec!(80)), dec!(25));
        assert_eq!(headroom_score(dec!(90), dec!(80)), Decimal::ZERO);
        assert_eq!(headroom_score(dec!(-10), dec!(80)), HUNDRED);
    }

    #[test]
    fn test_score_position() {
        assert_eq!(score_position(680, 620, 740), dec!(50));
        assert_eq!(score_position(800, 620, 740), HUNDRED);
        assert_eq!(score_position(500, 620, 740), Decimal::ZERO);
    }

    #[test]
    fn test_mortgage_estimate() {
        let est = estimate_approval(&mortgage_input()).unwrap().result;
        // 600k at 5% over the default 25 years
        assert_eq!(est.estimated_payment, dec!(3508));
        assert_eq!(est.criteria_scores["ltv"], dec!(25));
        assert_eq!(est.criteria_scores["credit"], dec!(100));
        assert_eq!(est.criteria_scores["employment"], dec!(100));
        assert_eq!(est.approval_probability, dec!(56));
        assert_eq!(est.category, ApprovalCategory::Fair);
        assert_eq!(est.next_steps[0], "Improve criteria above");
        assert!(est.main_concerns.is_empty());
    }

    #[test]
    fn test_mortgage_requires_property_value() {
        let input = ApprovalEstimateInput {
            property_value: None,
            ..mortgage_input()
        };
        match estimate_approval(&input).unwrap_err() {
            LoanCalcError::InvalidArgument { field, .. } => assert_eq!(field, "property_value"),
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_weak_mortgage_collects_concerns() {
        let input = ApprovalEstimateInput {
            amount: dec!(780_000),
            credit_score: 640,
            ..mortgage_input()
        };
        let est = estimate_approval(&input).unwrap().result;
        assert!(est.main_concerns.contains(&"High loan-to-value ratio".to_string()));
        assert!(est.main_concerns.contains(&"Credit score could be improved".to_string()));
        assert!(est.approval_tips.contains(&"Consider increasing down payment".to_string()));
        assert_eq!(est.category, ApprovalCategory::Low);
    }

    #[test]
    fn test_credit_estimate_uses_credit_weights() {
        let input = ApprovalEstimateInput {
            business_path: BusinessPath::Credit,
            amount: dec!(60_000),
            property_value: None,
            annual_rate_percent: dec!(8.5),
            monthly_income: dec!(30_000),
            monthly_expenses: Decimal::ZERO,
            age: 30,
            ..mortgage_input()
        };
        let est = estimate_approval(&input).unwrap().result;
        assert!(est.criteria_scores.contains_key("credit_amount"));
        assert!(!est.criteria_scores.contains_key("ltv"));
        assert!(est.approval_probability >= dec!(80));
        assert_eq!(est.category, ApprovalCategory::Excellent);
        assert_eq!(est.estimated_rate, dec!(3.5));
        assert_eq!(est.next_steps[0], "Proceed with application");
    }

    #[test]
    fn test_category_thresholds() {
        assert_eq!(ApprovalCategory::from_probability(dec!(80)), ApprovalCategory::Excellent);
        assert_eq!(ApprovalCategory::from_probability(dec!(79.9)), ApprovalCategory::Good);
        assert_eq!(ApprovalCategory::from_probability(dec!(45)), ApprovalCategory::Fair);
        assert_eq!(ApprovalCategory::from_probability(dec!(44.9)), ApprovalCategory::Low);
    }

    #[test]
    fn test_estimated_rate_by_category() {
        assert_eq!(ApprovalCategory::Excellent.estimated_rate(), dec!(3.5));
        assert_eq!(ApprovalCategory::Good.estimated_rate(), dec!(4.0));
        assert_eq!(ApprovalCategory::Fair.estimated_rate(), dec!(4.5));
        assert_eq!(ApprovalCategory::Low.estimated_rate(), dec!(5.0));
    }
}
