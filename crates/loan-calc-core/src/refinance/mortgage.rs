use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::RefinanceType;
use crate::assessment::scoring::{
    BankRecommendation, CreditRiskLevel, CreditScoreTiers, MORTGAGE_REFINANCE_BANKS,
};
use crate::assessment::{
    all_passed, default_credit_score, default_employment_years, percent_of_income,
    rejection_reasons, round_ratio, stress_test, validate_applicant, Criterion, CriterionResult,
};
use crate::engine::{
    calculate_loan, calculate_monthly_payment, calculate_remaining_balance, ltv,
    CalculationResult, LoanRequest,
};
use crate::error::LoanCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::validate::{require_non_negative, require_positive};
use crate::LoanCalcResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

fn default_closing_costs() -> Money {
    dec!(5000)
}

// ---------------------------------------------------------------------------
// Standards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MortgageRefinanceStandards {
    pub max_ltv: Percent,
    pub cash_out_max_ltv: Percent,
    pub max_dti: Percent,
    pub max_age_at_maturity: u32,
    pub stress_rate: Percent,
    pub min_employment_years: Years,
    pub credit_tiers: CreditScoreTiers,
    /// Closing costs must be recovered from savings within this many months.
    pub max_break_even_months: Decimal,
    /// Beyond this the borrower is asked to confirm long-term occupancy.
    pub long_break_even_months: Decimal,
    /// Cash paid out, as a percentage of annual income.
    pub max_cash_out_to_income: Percent,
    /// Savings below this share of the current payment are not worth it.
    pub min_savings_percent: Percent,
    pub insurance_ltv: Percent,
    pub rate_premium_score: u32,
    pub premium_score: u32,
    pub premium_max_ltv: Percent,
}

impl Default for MortgageRefinanceStandards {
    fn default() -> Self {
        Self {
            max_ltv: dec!(80),
            cash_out_max_ltv: dec!(75),
            max_dti: dec!(42),
            max_age_at_maturity: 75,
            stress_rate: dec!(6.5),
            min_employment_years: dec!(2),
            credit_tiers: CreditScoreTiers::MORTGAGE_REFINANCE,
            max_break_even_months: dec!(36),
            long_break_even_months: dec!(24),
            max_cash_out_to_income: dec!(50),
            min_savings_percent: dec!(2),
            insurance_ltv: dec!(75),
            rate_premium_score: 700,
            premium_score: 740,
            premium_max_ltv: dec!(70),
        }
    }
}

#[cfg(feature = "parameters")]
impl MortgageRefinanceStandards {
    pub fn from_parameters(params: &crate::parameters::CalculationParameters) -> Self {
        use crate::parameters::standard;
        let defaults = Self::default();
        Self {
            max_ltv: params
                .standard(standard::REFINANCE, standard::MAX_LTV)
                .unwrap_or(defaults.max_ltv),
            cash_out_max_ltv: params
                .standard(standard::REFINANCE, standard::CASH_OUT_MAX_LTV)
                .unwrap_or(defaults.cash_out_max_ltv),
            max_dti: params
                .standard(standard::DTI, standard::MAX_DTI)
                .unwrap_or(defaults.max_dti),
            min_savings_percent: params
                .standard(standard::REFINANCE, standard::MIN_SAVINGS_PERCENT)
                .unwrap_or(defaults.min_savings_percent),
            ..defaults
        }
    }
}

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageRefinanceInput {
    /// Outstanding balance of the mortgage being replaced.
    pub current_loan_amount: Money,
    pub current_rate: Percent,
    /// When absent the current payment is priced from `remaining_years`.
    #[serde(default)]
    pub current_monthly_payment: Option<Money>,
    #[serde(default)]
    pub remaining_years: Option<Years>,
    pub property_value: Money,
    #[serde(default)]
    pub refinance_type: RefinanceType,
    /// Required for a cash-out refinance, ignored otherwise.
    #[serde(default)]
    pub new_loan_amount: Option<Money>,
    pub new_rate: Percent,
    pub new_years: Years,
    pub monthly_income: Money,
    #[serde(default)]
    pub monthly_expenses: Money,
    pub age: u32,
    #[serde(default = "default_credit_score")]
    pub credit_score: u32,
    #[serde(default = "default_employment_years")]
    pub employment_years: Years,
    #[serde(default = "default_closing_costs")]
    pub closing_costs: Money,
    #[serde(default)]
    pub standards: Option<MortgageRefinanceStandards>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageRefinanceAnalysis {
    pub refinance_type: RefinanceType,
    pub new_loan_amount: Money,
    pub new_loan: CalculationResult,
    pub current_monthly_payment: Money,
    /// Negative when the new payment is higher.
    pub monthly_savings: Money,
    pub savings_percent: Percent,
    pub total_savings_over_term: Money,
    pub worthwhile: bool,
    pub closing_costs: Money,
    /// `None` when the refinance saves nothing per month.
    pub break_even_months: Option<Decimal>,
    pub cash_out_amount: Money,
    /// Simple-interest projection of the current balance over the remaining
    /// years, when those are known.
    pub projected_current_balance: Option<Money>,
    pub approved: bool,
    pub ltv_ratio: Percent,
    pub ltv_ceiling: Percent,
    pub dti_ratio: Percent,
    pub credit_score: u32,
    pub credit_risk_level: CreditRiskLevel,
    pub age_at_maturity: Years,
    pub stress_monthly_payment: Money,
    pub stress_test_dti: Percent,
    pub criteria: Vec<CriterionResult>,
    pub rejection_reasons: Vec<String>,
    pub approval_conditions: Vec<String>,
    pub recommended_banks: Vec<BankRecommendation>,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Compare the current mortgage against a rate-and-term or cash-out
/// replacement and decide whether the new loan would be approved.
pub fn compare_mortgage_refinance(
    input: &MortgageRefinanceInput,
) -> LoanCalcResult<ComputationOutput<MortgageRefinanceAnalysis>> {
    let start = Instant::now();
    let standards = input.standards.clone().unwrap_or_default();
    validate_input(input)?;
    let mut warnings: Vec<String> = Vec::new();

    let current_monthly_payment = current_payment(input)?;
    let new_loan_amount = match input.refinance_type {
        RefinanceType::RateAndTerm => {
            if input.new_loan_amount.is_some() {
                warnings.push(
                    "new_loan_amount is ignored for a rate-and-term refinance.".into(),
                );
            }
            input.current_loan_amount
        }
        RefinanceType::CashOut => cash_out_loan_amount(input)?,
    };

    let new_loan = calculate_loan(&LoanRequest {
        principal: new_loan_amount,
        annual_rate_percent: input.new_rate,
        term_years: input.new_years,
    })?;
    warnings.extend(new_loan.warnings);
    let new_loan = new_loan.result;

    let monthly_savings = current_monthly_payment - new_loan.monthly_payment;
    let savings_percent = monthly_savings / current_monthly_payment * Decimal::ONE_HUNDRED;
    let total_savings_over_term = monthly_savings * Decimal::from(new_loan.number_of_payments);
    let worthwhile = savings_percent >= standards.min_savings_percent;

    // Savings under one unit a month are treated as one unit.
    let break_even = input.closing_costs / monthly_savings.max(Decimal::ONE);
    let cash_out_amount = new_loan_amount - input.current_loan_amount;
    let projected_current_balance = input
        .remaining_years
        .map(|years| {
            calculate_remaining_balance(input.current_loan_amount, years, input.current_rate)
        })
        .transpose()?;

    let ltv_ratio = ltv::ltv_ratio(new_loan_amount, input.property_value)?;
    let ltv_ceiling = match input.refinance_type {
        RefinanceType::RateAndTerm => standards.max_ltv,
        RefinanceType::CashOut => standards.cash_out_max_ltv,
    };
    let dti_ratio = percent_of_income(
        new_loan.monthly_payment + input.monthly_expenses,
        input.monthly_income,
    );
    let age_at_maturity = Decimal::from(input.age) + input.new_years;
    let (stress_monthly_payment, stress_dti) = stress_test(
        new_loan_amount,
        standards.stress_rate,
        input.new_years,
        input.monthly_expenses,
        input.monthly_income,
    )?;

    let mut criteria = vec![
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
        CriterionResult::at_most(
            Criterion::BreakEven,
            break_even,
            standards.max_break_even_months,
        ),
    ];
    if input.refinance_type == RefinanceType::CashOut {
        let annual_income = input.monthly_income * MONTHS_PER_YEAR;
        criteria.push(CriterionResult::at_most(
            Criterion::CashOut,
            cash_out_amount / annual_income * Decimal::ONE_HUNDRED,
            standards.max_cash_out_to_income,
        ));
    }
    let approved = all_passed(&criteria);

    let mut approval_conditions = Vec::new();
    if ltv_ratio > standards.insurance_ltv {
        approval_conditions.push("Mortgage insurance required".to_string());
    }
    if input.credit_score < standards.rate_premium_score {
        approval_conditions.push("Higher interest rate due to credit score".to_string());
    }
    if break_even > standards.long_break_even_months {
        approval_conditions
            .push("Long break-even period - ensure long-term occupancy".to_string());
    }
    if input.refinance_type == RefinanceType::CashOut {
        approval_conditions.push("Cash-out funds usage documentation required".to_string());
    }

    let recommended_banks = if approved {
        let premium = input.credit_score >= standards.premium_score
            && ltv_ratio <= standards.premium_max_ltv;
        MORTGAGE_REFINANCE_BANKS.recommend(
            premium,
            input.credit_score,
            input.new_rate,
            new_loan_amount,
            input.new_years,
        )?
    } else {
        Vec::new()
    };

    if !worthwhile {
        warnings.push(format!(
            "Monthly savings of {}% are below the {}% minimum.",
            round_ratio(savings_percent),
            standards.min_savings_percent.normalize()
        ));
    }
    debug!(
        approved,
        worthwhile,
        savings = %monthly_savings,
        "mortgage refinance comparison"
    );

    let output = MortgageRefinanceAnalysis {
        refinance_type: input.refinance_type,
        new_loan_amount,
        new_loan,
        current_monthly_payment,
        monthly_savings,
        savings_percent: round_ratio(savings_percent),
        total_savings_over_term,
        worthwhile,
        closing_costs: input.closing_costs,
        break_even_months: (monthly_savings > Decimal::ZERO).then(|| round_ratio(break_even)),
        cash_out_amount,
        projected_current_balance,
        approved,
        ltv_ratio: round_ratio(ltv_ratio),
        ltv_ceiling,
        dti_ratio: round_ratio(dti_ratio),
        credit_score: input.credit_score,
        credit_risk_level: standards.credit_tiers.classify(input.credit_score),
        age_at_maturity,
        stress_monthly_payment,
        stress_test_dti: round_ratio(stress_dti),
        rejection_reasons: rejection_reasons(&criteria),
        criteria,
        approval_conditions,
        recommended_banks,
    };

    let payment_source = if input.current_monthly_payment.is_some() {
        "given"
    } else {
        "priced from remaining_years"
    };
    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "break_even": "closing costs over monthly savings (savings floored at 1)",
        "current_payment_source": payment_source,
        "standards": standards,
    });

    Ok(with_metadata(
        "Mortgage refinance comparison with approval criteria",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn current_payment(input: &MortgageRefinanceInput) -> LoanCalcResult<Money> {
    match (input.current_monthly_payment, input.remaining_years) {
        (Some(payment), _) => {
            require_positive("current_monthly_payment", payment)?;
            Ok(payment)
        }
        (None, Some(years)) => {
            calculate_monthly_payment(input.current_loan_amount, input.current_rate, years)
        }
        (None, None) => Err(LoanCalcError::invalid(
            "current_monthly_payment",
            "required when remaining_years is not given",
        )),
    }
}

fn cash_out_loan_amount(input: &MortgageRefinanceInput) -> LoanCalcResult<Money> {
    let amount = input.new_loan_amount.ok_or_else(|| {
        LoanCalcError::invalid("new_loan_amount", "required for a cash-out refinance")
    })?;
    if amount <= input.current_loan_amount {
        return Err(LoanCalcError::invalid(
            "new_loan_amount",
            format!(
                "must exceed the current loan amount {} for a cash-out refinance",
                input.current_loan_amount.normalize()
            ),
        ));
    }
    Ok(amount)
}

fn validate_input(input: &MortgageRefinanceInput) -> LoanCalcResult<()> {
    require_positive("current_loan_amount", input.current_loan_amount)?;
    require_non_negative("current_rate", input.current_rate)?;
    require_positive("property_value", input.property_value)?;
    require_non_negative("closing_costs", input.closing_costs)?;
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

    fn rate_and_term() -> MortgageRefinanceInput {
        MortgageRefinanceInput {
            current_loan_amount: dec!(800_000),
            current_rate: dec!(6.5),
            current_monthly_payment: None,
            remaining_years: Some(dec!(25)),
            property_value: dec!(1_200_000),
            refinance_type: RefinanceType::RateAndTerm,
            new_loan_amount: None,
            new_rate: dec!(4.5),
            new_years: dec!(25),
            monthly_income: dec!(30_000),
            monthly_expenses: dec!(1_000),
            age: 40,
            credit_score: 760,
            employment_years: dec!(8),
            closing_costs: dec!(5_000),
            standards: None,
        }
    }

    #[test]
    fn test_rate_and_term_savings() {
        let out = compare_mortgage_refinance(&rate_and_term()).unwrap();
        let r = &out.result;
        // 800k over 25 years: 5402 at 6.5%, 4447 at 4.5%
        assert_eq!(r.current_monthly_payment, dec!(5402));
        assert_eq!(r.new_loan.monthly_payment, dec!(4447));
        assert_eq!(r.monthly_savings, dec!(955));
        assert_eq!(r.savings_percent, dec!(17.7));
        assert_eq!(r.total_savings_over_term, dec!(286_500));
        assert!(r.worthwhile);
        // 5000 / 955
        assert_eq!(r.break_even_months, Some(dec!(5.2)));
        assert_eq!(r.cash_out_amount, Decimal::ZERO);
        assert_eq!(r.projected_current_balance, Some(dec!(2_100_000)));
    }

    #[test]
    fn test_rate_and_term_is_approved_with_premium_quotes() {
        let r = compare_mortgage_refinance(&rate_and_term()).unwrap().result;
        assert_eq!(r.ltv_ratio, dec!(66.7));
        assert_eq!(r.ltv_ceiling, dec!(80));
        // (4447 + 1000) / 30000
        assert_eq!(r.dti_ratio, dec!(18.2));
        assert_eq!(r.stress_monthly_payment, dec!(5402));
        assert_eq!(r.stress_test_dti, dec!(21.3));
        assert!(r.approved);
        assert!(r.approval_conditions.is_empty());
        assert_eq!(r.criteria.len(), 7);
        assert_eq!(r.recommended_banks[0].bank, "Bank Hapoalim");
        assert_eq!(r.recommended_banks[0].rate, dec!(4.3));
        assert_eq!(r.recommended_banks[0].reason, "Excellent refinance profile");
    }

    #[test]
    fn test_cash_out() {
        let input = MortgageRefinanceInput {
            refinance_type: RefinanceType::CashOut,
            new_loan_amount: Some(dec!(900_000)),
            ..rate_and_term()
        };
        let r = compare_mortgage_refinance(&input).unwrap().result;
        assert_eq!(r.new_loan.monthly_payment, dec!(5002));
        assert_eq!(r.cash_out_amount, dec!(100_000));
        assert_eq!(r.ltv_ratio, dec!(75));
        assert_eq!(r.ltv_ceiling, dec!(75));
        assert_eq!(r.break_even_months, Some(dec!(12.5)));
        assert!(r.approved);
        let cash_out = r
            .criteria
            .iter()
            .find(|c| c.criterion == Criterion::CashOut)
            .unwrap();
        // 100k of 360k annual income
        assert_eq!(cash_out.actual, dec!(27.8));
        assert_eq!(
            r.approval_conditions,
            vec!["Cash-out funds usage documentation required".to_string()]
        );
        assert_eq!(r.recommended_banks[0].bank, "Discount Bank");
        assert_eq!(r.recommended_banks[1].rate, dec!(4.6));
    }

    #[test]
    fn test_cash_out_too_large_for_income() {
        let input = MortgageRefinanceInput {
            refinance_type: RefinanceType::CashOut,
            new_loan_amount: Some(dec!(900_000)),
            monthly_income: dec!(15_000),
            ..rate_and_term()
        };
        let r = compare_mortgage_refinance(&input).unwrap().result;
        assert!(!r.approved);
        assert!(r
            .rejection_reasons
            .iter()
            .any(|reason| reason.starts_with("Cash-out amount 55.6%")));
    }

    #[test]
    fn test_no_savings_fails_break_even() {
        let input = MortgageRefinanceInput {
            current_monthly_payment: Some(dec!(4_400)),
            ..rate_and_term()
        };
        let out = compare_mortgage_refinance(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.monthly_savings, dec!(-47));
        assert_eq!(r.break_even_months, None);
        assert!(!r.worthwhile);
        assert!(!r.approved);
        assert_eq!(
            r.rejection_reasons,
            vec!["Break-even period 5000 months exceeds maximum 36 months".to_string()]
        );
        assert!(out.warnings.iter().any(|w| w.contains("below the 2% minimum")));
    }

    #[test]
    fn test_low_score_below_refinance_floor() {
        let input = MortgageRefinanceInput {
            credit_score: 570,
            ..rate_and_term()
        };
        let r = compare_mortgage_refinance(&input).unwrap().result;
        assert!(!r.approved);
        assert_eq!(r.credit_risk_level, CreditRiskLevel::Poor);
        assert!(r
            .approval_conditions
            .contains(&"Higher interest rate due to credit score".to_string()));

        let fair = MortgageRefinanceInput {
            credit_score: 600,
            ..rate_and_term()
        };
        let r = compare_mortgage_refinance(&fair).unwrap().result;
        assert!(r.approved);
        assert!(r.recommended_banks.is_empty());
    }

    #[test]
    fn test_missing_current_payment_and_term() {
        let input = MortgageRefinanceInput {
            remaining_years: None,
            ..rate_and_term()
        };
        match compare_mortgage_refinance(&input).unwrap_err() {
            LoanCalcError::InvalidArgument { field, .. } => {
                assert_eq!(field, "current_monthly_payment")
            }
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_cash_out_requires_larger_loan() {
        let input = MortgageRefinanceInput {
            refinance_type: RefinanceType::CashOut,
            new_loan_amount: Some(dec!(700_000)),
            ..rate_and_term()
        };
        match compare_mortgage_refinance(&input).unwrap_err() {
            LoanCalcError::InvalidArgument { field, .. } => assert_eq!(field, "new_loan_amount"),
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_defaults() {
        let input: MortgageRefinanceInput = serde_json::from_str(
            r#"{
                "current_loan_amount": "800000",
                "current_rate": "6.5",
                "current_monthly_payment": "5402",
                "property_value": "1200000",
                "new_rate": "4.5",
                "new_years": "25",
                "monthly_income": "30000",
                "age": 40
            }"#,
        )
        .unwrap();
        assert_eq!(input.refinance_type, RefinanceType::RateAndTerm);
        assert_eq!(input.closing_costs, dec!(5000));
        let r = compare_mortgage_refinance(&input).unwrap().result;
        assert_eq!(r.projected_current_balance, None);
        assert_eq!(r.monthly_savings, dec!(955));
    }
}
