use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::scoring::{BankRecommendation, CreditRiskLevel, CreditScoreTiers, MORTGAGE_BANKS};
use super::{
    all_passed, default_credit_score, default_employment_years, percent_of_income,
    rejection_reasons, round_ratio, stress_test, validate_applicant, Criterion, CriterionResult,
};
use crate::engine::{calculate_loan, ltv, resolve_ltv_ceiling, CalculationResult, LoanRequest};
use crate::engine::PropertyOwnershipStatus;
use crate::error::LoanCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::validate::{require_non_negative, require_positive};
use crate::LoanCalcResult;

// ---------------------------------------------------------------------------
// Standards
// ---------------------------------------------------------------------------

/// Lending rules applied to a mortgage application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MortgageStandards {
    pub max_ltv: Percent,
    pub max_dti: Percent,
    pub max_age_at_maturity: u32,
    /// Rate the payment is re-priced at for the stress test.
    pub stress_rate: Percent,
    pub min_employment_years: Years,
    pub credit_tiers: CreditScoreTiers,
    /// Above this LTV mortgage insurance is required.
    pub insurance_ltv: Percent,
    /// Below this score the rate carries a premium.
    pub rate_premium_score: u32,
    /// Above this DTI additional income verification is requested.
    pub verification_dti: Percent,
    /// Premium bank quotes need this score and at most `premium_max_ltv`.
    pub premium_score: u32,
    pub premium_max_ltv: Percent,
}

impl Default for MortgageStandards {
    fn default() -> Self {
        Self {
            max_ltv: dec!(80),
            max_dti: dec!(42),
            max_age_at_maturity: 75,
            stress_rate: dec!(6.5),
            min_employment_years: dec!(2),
            credit_tiers: CreditScoreTiers::MORTGAGE,
            insurance_ltv: dec!(75),
            rate_premium_score: 700,
            verification_dti: dec!(35),
            premium_score: 740,
            premium_max_ltv: dec!(70),
        }
    }
}

#[cfg(feature = "parameters")]
impl MortgageStandards {
    /// Defaults overridden by whatever LTV and DTI limits the parameters carry.
    pub fn from_parameters(params: &crate::parameters::CalculationParameters) -> Self {
        use crate::parameters::standard;
        let defaults = Self::default();
        Self {
            max_ltv: params
                .standard(standard::LTV, standard::MAX_LTV)
                .unwrap_or(defaults.max_ltv),
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
pub struct MortgageAssessmentInput {
    /// Purchase amount being financed before the initial payment.
    pub amount: Money,
    #[serde(default)]
    pub initial_payment: Money,
    pub property_value: Money,
    pub annual_rate_percent: Percent,
    pub term_years: Years,
    pub monthly_income: Money,
    #[serde(default)]
    pub monthly_expenses: Money,
    pub age: u32,
    #[serde(default = "default_credit_score")]
    pub credit_score: u32,
    #[serde(default = "default_employment_years")]
    pub employment_years: Years,
    /// When given, the ownership ceiling replaces the standard LTV limit.
    #[serde(default)]
    pub ownership_status: Option<PropertyOwnershipStatus>,
    #[serde(default)]
    pub standards: Option<MortgageStandards>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageAssessment {
    pub principal: Money,
    pub loan: CalculationResult,
    pub approved: bool,
    pub ltv_ratio: Percent,
    pub ltv_ceiling: Percent,
    pub dti_ratio: Percent,
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

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Run the mortgage approval criteria: LTV, DTI, age at maturity, stress
/// test, credit score and employment history.
pub fn assess_mortgage(
    input: &MortgageAssessmentInput,
) -> LoanCalcResult<ComputationOutput<MortgageAssessment>> {
    let start = Instant::now();
    let standards = input.standards.clone().unwrap_or_default();
    validate_input(input)?;

    let principal = input.amount - input.initial_payment;
    let loan = calculate_loan(&LoanRequest {
        principal,
        annual_rate_percent: input.annual_rate_percent,
        term_years: input.term_years,
    })?;
    let mut warnings = loan.warnings;
    let loan = loan.result;

    let ltv_ratio = ltv::ltv_ratio(principal, input.property_value)?;
    let ltv_ceiling = input
        .ownership_status
        .map(resolve_ltv_ceiling)
        .unwrap_or(standards.max_ltv);
    let dti_ratio = percent_of_income(
        loan.monthly_payment + input.monthly_expenses,
        input.monthly_income,
    );
    let age_at_maturity = Decimal::from(input.age) + input.term_years;
    let (stress_monthly_payment, stress_dti) = stress_test(
        principal,
        standards.stress_rate,
        input.term_years,
        input.monthly_expenses,
        input.monthly_income,
    )?;
    let credit_risk_level = standards.credit_tiers.classify(input.credit_score);

    let criteria = vec![
        CriterionResult::at_most(Criterion::Ltv, ltv_ratio, ltv_ceiling),
        CriterionResult::at_most(Criterion::Dti, dti_ratio, standards.max_dti),
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
    if ltv_ratio > standards.insurance_ltv {
        approval_conditions.push("Mortgage insurance required".to_string());
    }
    if input.credit_score < standards.rate_premium_score {
        approval_conditions.push("Higher interest rate due to credit score".to_string());
    }
    if dti_ratio > standards.verification_dti {
        approval_conditions.push("Additional income verification required".to_string());
    }

    let recommended_banks = if approved {
        let premium = input.credit_score >= standards.premium_score
            && ltv_ratio <= standards.premium_max_ltv;
        MORTGAGE_BANKS.recommend(
            premium,
            input.credit_score,
            input.annual_rate_percent,
            principal,
            input.term_years,
        )?
    } else {
        Vec::new()
    };

    if input.initial_payment.is_zero() {
        warnings.push("No initial payment: the full amount is financed.".into());
    }
    debug!(
        approved,
        ltv = %round_ratio(ltv_ratio),
        dti = %round_ratio(dti_ratio),
        "mortgage assessment"
    );

    let output = MortgageAssessment {
        principal,
        loan,
        approved,
        ltv_ratio: round_ratio(ltv_ratio),
        ltv_ceiling,
        dti_ratio: round_ratio(dti_ratio),
        credit_score: input.credit_score,
        credit_risk_level,
        age_at_maturity,
        stress_rate: standards.stress_rate,
        stress_monthly_payment,
        stress_test_dti: round_ratio(stress_dti),
        rejection_reasons: rejection_reasons(&criteria),
        criteria,
        approval_conditions,
        recommended_banks,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "ltv_basis": "financed principal over property value",
        "dti_basis": "new payment plus monthly expenses",
        "standards": standards,
    });

    Ok(with_metadata(
        "Mortgage approval criteria (LTV, DTI, age, stress test, credit, employment)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &MortgageAssessmentInput) -> LoanCalcResult<()> {
    require_positive("amount", input.amount)?;
    require_non_negative("initial_payment", input.initial_payment)?;
    if input.initial_payment >= input.amount {
        return Err(LoanCalcError::invalid(
            "initial_payment",
            "must be less than the amount",
        ));
    }
    require_positive("property_value", input.property_value)?;
    validate_applicant(
        input.monthly_income,
        input.monthly_expenses,
        input.credit_score,
        input.employment_years,
        input.age,
    )
}
