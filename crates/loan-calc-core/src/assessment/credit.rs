use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::scoring::{BankRecommendation, CreditRiskLevel, CreditScoreTiers, CREDIT_BANKS};
use super::{
    all_passed, default_credit_score, default_employment_years, percent_of_income,
    rejection_reasons, round_ratio, stress_test, validate_applicant, Criterion, CriterionResult,
};
use crate::engine::{calculate_loan, CalculationResult, LoanRequest};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::validate::{require_non_negative, require_positive};
use crate::LoanCalcResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Lending rules for unsecured consumer credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditStandards {
    pub max_dti: Percent,
    /// Credit amount as a percentage of annual income.
    pub max_credit_to_income: Percent,
    pub max_age_at_maturity: u32,
    /// Added to the offered rate for the stress test.
    pub stress_rate_margin: Percent,
    pub min_employment_years: Years,
    pub credit_tiers: CreditScoreTiers,
    pub rate_premium_score: u32,
    /// Above this DTI a co-signer may be required.
    pub cosigner_dti: Percent,
    /// Above this credit-to-income ratio collateral is required.
    pub collateral_credit_to_income: Percent,
    pub premium_score: u32,
    pub premium_max_dti: Percent,
}

impl Default for CreditStandards {
    fn default() -> Self {
        Self {
            max_dti: dec!(42),
            max_credit_to_income: dec!(300),
            max_age_at_maturity: 70,
            stress_rate_margin: dec!(2),
            min_employment_years: dec!(2),
            credit_tiers: CreditScoreTiers::CREDIT,
            rate_premium_score: 700,
            cosigner_dti: dec!(35),
            collateral_credit_to_income: dec!(200),
            premium_score: 750,
            premium_max_dti: dec!(30),
        }
    }
}

#[cfg(feature = "parameters")]
impl CreditStandards {
    pub fn from_parameters(params: &crate::parameters::CalculationParameters) -> Self {
        use crate::parameters::standard;
        let defaults = Self::default();
        Self {
            max_dti: params
                .standard(standard::DTI, standard::MAX_DTI)
                .unwrap_or(defaults.max_dti),
            ..defaults
        }
    }
}

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditAssessmentInput {
    pub amount: Money,
    pub annual_rate_percent: Percent,
    pub term_years: Years,
    pub monthly_income: Money,
    #[serde(default)]
    pub monthly_expenses: Money,
    /// Monthly payments on debts the borrower already carries.
    #[serde(default)]
    pub existing_debts: Money,
    pub age: u32,
    #[serde(default = "default_credit_score")]
    pub credit_score: u32,
    #[serde(default = "default_employment_years")]
    pub employment_years: Years,
    #[serde(default)]
    pub standards: Option<CreditStandards>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditAssessment {
    pub loan: CalculationResult,
    pub approved: bool,
    pub dti_ratio: Percent,
    pub credit_to_income_ratio: Percent,
    pub credit_score: u32,
    pub credit_risk_level: CreditRiskLevel,
    pub age_at_maturity: Years,
    pub stress_rate: Percent,
    pub stress_monthly_payment: Money,
    pub stress_test_dti: Percent,
    pub criteria: Vec<CriterionResult>,
    pub rejection_reasons: Vec<String>,
    pub approval_conditions: Vec<String>,
    pub recommended_banks: Vec<BankRecommendation>,
}

/// Run the consumer credit criteria: DTI with existing debts, credit amount
/// against annual income, age at maturity, stress test at the offered rate
/// plus a margin, credit score and employment history.
pub fn assess_credit(
    input: &CreditAssessmentInput,
) -> LoanCalcResult<ComputationOutput<CreditAssessment>> {
    let start = Instant::now();
    let standards = input.standards.clone().unwrap_or_default();
    validate_input(input)?;

    let loan = calculate_loan(&LoanRequest {
        principal: input.amount,
        annual_rate_percent: input.annual_rate_percent,
        term_years: input.term_years,
    })?;
    let warnings = loan.warnings;
    let loan = loan.result;

    let other_debt = input.monthly_expenses + input.existing_debts;
    let dti_ratio = percent_of_income(loan.monthly_payment + other_debt, input.monthly_income);
    let credit_to_income_ratio =
        percent_of_income(input.amount, input.monthly_income * MONTHS_PER_YEAR);
    let age_at_maturity = Decimal::from(input.age) + input.term_years;
    let stress_rate = input.annual_rate_percent + standards.stress_rate_margin;
    let (stress_monthly_payment, stress_dti) = stress_test(
        input.amount,
        stress_rate,
        input.term_years,
        other_debt,
        input.monthly_income,
    )?;
    let credit_risk_level = standards.credit_tiers.classify(input.credit_score);

    let criteria = vec![
        CriterionResult::at_most(Criterion::Dti, dti_ratio, standards.max_dti),
        CriterionResult::at_most(
            Criterion::CreditToIncome,
            credit_to_income_ratio,
            standards.max_credit_to_income,
        ),
        CriterionResult::at_most(
            Criterion::AgeAtMaturity,
            age_at_maturity,
            Decimal::from(standards.max_age_at_maturity),
        ),
        CriterionResult::at_most(Criterion::StressTest, stress_dti, standards.max_dti),
        CriterionResult::at_least(
            Criterion::CreditScore,
            Decimal::from(input.credit_score),
            Decimal::from(standards.credit_tiers.minimum),
        ),
        CriterionResult::at_least(
            Criterion::Employment,
            input.employment_years,
            standards.min_employment_years,
        ),
    ];
    let approved = all_passed(&criteria);

    let mut approval_conditions = Vec::new();
    if input.credit_score < standards.rate_premium_score {
        approval_conditions.push("Higher interest rate due to credit score".to_string());
    }
    if dti_ratio > standards.cosigner_dti {
        approval_conditions.push("Co-signer may be required".to_string());
    }
    if credit_to_income_ratio > standards.collateral_credit_to_income {
        approval_conditions.push("Additional collateral required".to_string());
    }

    let recommended_banks = if approved {
        let premium = input.credit_score >= standards.premium_score
            && dti_ratio <= standards.premium_max_dti;
        CREDIT_BANKS.recommend(
            premium,
            input.credit_score,
            input.annual_rate_percent,
            input.amount,
            input.term_years,
        )?
    } else {
        Vec::new()
    };

    debug!(approved, dti = %round_ratio(dti_ratio), "credit assessment");

    let output = CreditAssessment {
        loan,
        approved,
        dti_ratio: round_ratio(dti_ratio),
        credit_to_income_ratio: round_ratio(credit_to_income_ratio),
        credit_score: input.credit_score,
        credit_risk_level,
        age_at_maturity,
        stress_rate,
        stress_monthly_payment,
        stress_test_dti: round_ratio(stress_dti),
        rejection_reasons: rejection_reasons(&criteria),
        criteria,
        approval_conditions,
        recommended_banks,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "dti_basis": "new payment plus monthly expenses plus existing debts",
        "credit_to_income_basis": "amount over twelve months of income",
        "standards": standards,
    });

    Ok(with_metadata(
        "Consumer credit approval criteria (DTI, credit-to-income, age, stress test, credit, employment)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &CreditAssessmentInput) -> LoanCalcResult<()> {
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
