use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::RefinancePurpose;
use crate::assessment::scoring::{
    BankRecommendation, CreditRiskLevel, CreditScoreTiers, CREDIT_REFINANCE_BANKS,
};
use crate::assessment::{
    all_passed, default_credit_score, default_employment_years, percent_of_income,
    rejection_reasons, round_ratio, stress_test, validate_applicant, Criterion, CriterionResult,
};
use crate::engine::{
    calculate_loan, calculate_monthly_payment, evaluate_dti, CalculationResult, DtiEvaluation,
    LoanRequest,
};
use crate::error::LoanCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::validate::{require_non_negative, require_positive};
use crate::LoanCalcResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Standards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditRefinanceStandards {
    pub max_dti: Percent,
    pub max_credit_to_income: Percent,
    pub max_age_at_maturity: u32,
    pub stress_rate_margin: Percent,
    pub min_employment_years: Years,
    pub credit_tiers: CreditScoreTiers,
    pub rate_premium_score: u32,
    pub cosigner_dti: Percent,
    /// Monthly savings below this amount are flagged as marginal.
    pub minimal_savings: Money,
    pub premium_score: u32,
    pub premium_max_dti: Percent,
}

impl Default for CreditRefinanceStandards {
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
            minimal_savings: dec!(100),
            premium_score: 750,
            premium_max_dti: dec!(30),
        }
    }
}

#[cfg(feature = "parameters")]
impl CreditRefinanceStandards {
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

/// A loan to be paid off by the consolidated credit. Either the monthly
/// payment or the remaining term must be known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingLoan {
    #[serde(default)]
    pub lender: Option<String>,
    pub balance: Money,
    pub rate: Percent,
    #[serde(default)]
    pub monthly_payment: Option<Money>,
    #[serde(default)]
    pub remaining_years: Option<Years>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedLoan {
    pub lender: Option<String>,
    pub balance: Money,
    pub rate: Percent,
    pub monthly_payment: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRefinanceInput {
    pub existing_loans: Vec<ExistingLoan>,
    /// Defaults to the sum of the existing balances.
    #[serde(default)]
    pub consolidation_amount: Option<Money>,
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
    #[serde(default)]
    pub purpose: RefinancePurpose,
    #[serde(default)]
    pub standards: Option<CreditRefinanceStandards>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRefinanceAnalysis {
    pub purpose: RefinancePurpose,
    pub existing_loans: Vec<PricedLoan>,
    pub total_existing_balance: Money,
    pub current_total_monthly_payment: Money,
    pub consolidation_amount: Money,
    pub new_loan: CalculationResult,
    pub monthly_savings: Money,
    pub total_savings_over_term: Money,
    pub old_dti: Percent,
    pub dti_improvement: Percent,
    /// DTI of the consolidated payment against monthly expenses.
    pub dti: DtiEvaluation,
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

// ---------------------------------------------------------------------------
// Consolidation
// ---------------------------------------------------------------------------

/// Replace several consumer loans with one and check that the new loan both
/// saves money and would be approved.
pub fn consolidate_credit(
    input: &CreditRefinanceInput,
) -> LoanCalcResult<ComputationOutput<CreditRefinanceAnalysis>> {
    let start = Instant::now();
    let standards = input.standards.clone().unwrap_or_default();
    validate_input(input)?;

    let existing_loans = input
        .existing_loans
        .iter()
        .enumerate()
        .map(|(index, loan)| price_existing(index, loan))
        .collect::<LoanCalcResult<Vec<_>>>()?;
    let total_existing_balance: Money = existing_loans.iter().map(|l| l.balance).sum();
    let current_total_monthly_payment: Money =
        existing_loans.iter().map(|l| l.monthly_payment).sum();
    let consolidation_amount = input.consolidation_amount.unwrap_or(total_existing_balance);

    let new_loan = calculate_loan(&LoanRequest {
        principal: consolidation_amount,
        annual_rate_percent: input.new_rate,
        term_years: input.new_years,
    })?;
    let mut warnings = new_loan.warnings;
    let new_loan = new_loan.result;

    let monthly_savings = current_total_monthly_payment - new_loan.monthly_payment;
    let total_savings_over_term = monthly_savings * Decimal::from(new_loan.number_of_payments);

    let dti = evaluate_dti(
        input.monthly_income,
        input.monthly_expenses,
        new_loan.monthly_payment,
        standards.max_dti,
    )?;
    let old_dti = percent_of_income(
        current_total_monthly_payment + input.monthly_expenses,
        input.monthly_income,
    );
    let dti_improvement = old_dti - dti.ratio;
    let credit_to_income = consolidation_amount / (input.monthly_income * MONTHS_PER_YEAR)
        * Decimal::ONE_HUNDRED;
    let age_at_maturity = Decimal::from(input.age) + input.new_years;
    let stress_rate = input.new_rate + standards.stress_rate_margin;
    let (stress_monthly_payment, stress_dti) = stress_test(
        consolidation_amount,
        stress_rate,
        input.new_years,
        input.monthly_expenses,
        input.monthly_income,
    )?;

    let criteria = vec![
        CriterionResult::at_most(Criterion::Dti, dti.ratio, standards.max_dti),
        CriterionResult::at_most(
            Criterion::CreditToIncome,
            credit_to_income,
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
        // Savings must be strictly positive.
        CriterionResult {
            criterion: Criterion::Savings,
            passed: monthly_savings > Decimal::ZERO,
            actual: monthly_savings,
            limit: Decimal::ZERO,
        },
        CriterionResult::at_least(Criterion::DtiImprovement, dti_improvement, Decimal::ZERO),
    ];
    let approved = all_passed(&criteria);

    let mut approval_conditions = Vec::new();
    if input.credit_score < standards.rate_premium_score {
        approval_conditions.push("Higher interest rate due to credit score".to_string());
    }
    if dti.ratio > standards.cosigner_dti {
        approval_conditions.push("Co-signer may be required".to_string());
    }
    if monthly_savings < standards.minimal_savings {
        approval_conditions.push("Minimal savings - ensure long-term benefit".to_string());
    }

    let recommended_banks = if approved {
        let premium = input.credit_score >= standards.premium_score
            && dti.ratio <= standards.premium_max_dti;
        CREDIT_REFINANCE_BANKS.recommend(
            premium,
            input.credit_score,
            input.new_rate,
            consolidation_amount,
            input.new_years,
        )?
    } else {
        Vec::new()
    };

    if consolidation_amount < total_existing_balance {
        warnings.push(format!(
            "Consolidation amount {} does not cover the existing balance {}.",
            consolidation_amount.normalize(),
            total_existing_balance.normalize()
        ));
    }
    debug!(
        approved,
        loans = existing_loans.len(),
        savings = %monthly_savings,
        "credit consolidation"
    );

    let output = CreditRefinanceAnalysis {
        purpose: input.purpose,
        existing_loans,
        total_existing_balance,
        current_total_monthly_payment,
        consolidation_amount,
        new_loan,
        monthly_savings,
        total_savings_over_term,
        old_dti: round_ratio(old_dti),
        dti_improvement: round_ratio(dti_improvement),
        dti_ratio: round_ratio(dti.ratio),
        dti,
        approved,
        credit_to_income_ratio: round_ratio(credit_to_income),
        credit_score: input.credit_score,
        credit_risk_level: standards.credit_tiers.classify(input.credit_score),
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
        "dti_basis": "consolidated payment plus monthly expenses",
        "old_dti_basis": "existing payments plus monthly expenses",
        "standards": standards,
    });

    Ok(with_metadata(
        "Credit consolidation comparison with approval criteria",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn price_existing(index: usize, loan: &ExistingLoan) -> LoanCalcResult<PricedLoan> {
    let monthly_payment = match (loan.monthly_payment, loan.remaining_years) {
        (Some(payment), _) => payment,
        (None, Some(years)) => calculate_monthly_payment(loan.balance, loan.rate, years)?,
        (None, None) => {
            return Err(LoanCalcError::invalid(
                "existing_loans",
                format!("loan {index} needs a monthly_payment or remaining_years"),
            ))
        }
    };
    Ok(PricedLoan {
        lender: loan.lender.clone(),
        balance: loan.balance,
        rate: loan.rate,
        monthly_payment,
    })
}

fn validate_input(input: &CreditRefinanceInput) -> LoanCalcResult<()> {
    if input.existing_loans.is_empty() {
        return Err(LoanCalcError::invalid(
            "existing_loans",
            "at least one existing loan is required",
        ));
    }
    for loan in &input.existing_loans {
        require_positive("balance", loan.balance)?;
        require_non_negative("rate", loan.rate)?;
        if let Some(payment) = loan.monthly_payment {
            require_positive("monthly_payment", payment)?;
        }
    }
    if let Some(amount) = input.consolidation_amount {
        require_positive("consolidation_amount", amount)?;
    }
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

    fn two_loans() -> CreditRefinanceInput {
        CreditRefinanceInput {
            existing_loans: vec![
                ExistingLoan {
                    lender: Some("Card issuer".into()),
                    balance: dec!(50_000),
                    rate: dec!(12),
                    monthly_payment: None,
                    remaining_years: Some(dec!(5)),
                },
                ExistingLoan {
                    lender: None,
                    balance: dec!(30_000),
                    rate: dec!(15),
                    monthly_payment: None,
                    remaining_years: Some(dec!(3)),
                },
            ],
            consolidation_amount: None,
            new_rate: dec!(8),
            new_years: dec!(5),
            monthly_income: dec!(20_000),
            monthly_expenses: dec!(3_000),
            age: 40,
            credit_score: 760,
            employment_years: dec!(6),
            purpose: RefinancePurpose::Consolidation,
            standards: None,
        }
    }

    #[test]
    fn test_consolidation_savings() {
        let out = consolidate_credit(&two_loans()).unwrap();
        let r = &out.result;
        assert_eq!(r.existing_loans[0].monthly_payment, dec!(1112));
        assert_eq!(r.existing_loans[1].monthly_payment, dec!(1040));
        assert_eq!(r.current_total_monthly_payment, dec!(2152));
        assert_eq!(r.consolidation_amount, dec!(80_000));
        assert_eq!(r.new_loan.monthly_payment, dec!(1622));
        assert_eq!(r.monthly_savings, dec!(530));
        assert_eq!(r.total_savings_over_term, dec!(31_800));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_consolidation_dti_and_approval() {
        let r = consolidate_credit(&two_loans()).unwrap().result;
        // (1622 + 3000) / 20000 against (2152 + 3000) / 20000
        assert_eq!(r.dti_ratio, dec!(23.1));
        assert_eq!(r.old_dti, dec!(25.8));
        assert_eq!(r.dti_improvement, dec!(2.7));
        assert!(r.dti.approved);
        assert_eq!(r.dti.payment_headroom, dec!(3778));
        assert_eq!(r.credit_to_income_ratio, dec!(33.3));
        assert_eq!(r.stress_rate, dec!(10));
        assert_eq!(r.stress_monthly_payment, dec!(1700));
        assert!(r.approved);
        assert!(r.approval_conditions.is_empty());
        assert_eq!(r.recommended_banks.len(), 2);
        assert_eq!(r.recommended_banks[0].rate, dec!(7.5));
        assert_eq!(r.recommended_banks[0].monthly_payment, dec!(1603));
        assert_eq!(r.recommended_banks[0].reason, "Excellent credit refinance profile");
    }

    #[test]
    fn test_higher_rate_brings_no_savings() {
        let input = CreditRefinanceInput {
            new_rate: dec!(18),
            new_years: dec!(3),
            ..two_loans()
        };
        let r = consolidate_credit(&input).unwrap().result;
        assert_eq!(r.new_loan.monthly_payment, dec!(2892));
        assert_eq!(r.monthly_savings, dec!(-740));
        assert!(!r.approved);
        assert_eq!(
            r.rejection_reasons,
            vec![
                "Refinance does not provide monthly payment savings".to_string(),
                "Refinance worsens debt-to-income ratio".to_string(),
            ]
        );
        assert!(r
            .approval_conditions
            .contains(&"Minimal savings - ensure long-term benefit".to_string()));
        assert!(r.recommended_banks.is_empty());
    }

    #[test]
    fn test_minimal_savings_with_given_payments() {
        let mut input = two_loans();
        input.existing_loans[0].monthly_payment = Some(dec!(1_000));
        input.existing_loans[1].monthly_payment = Some(dec!(700));
        let r = consolidate_credit(&input).unwrap().result;
        assert_eq!(r.current_total_monthly_payment, dec!(1700));
        assert_eq!(r.monthly_savings, dec!(78));
        assert!(r.approved);
        assert_eq!(
            r.approval_conditions,
            vec!["Minimal savings - ensure long-term benefit".to_string()]
        );
    }

    #[test]
    fn test_partial_consolidation_warns() {
        let input = CreditRefinanceInput {
            consolidation_amount: Some(dec!(60_000)),
            ..two_loans()
        };
        let out = consolidate_credit(&input).unwrap();
        assert_eq!(out.result.new_loan.monthly_payment, dec!(1217));
        assert_eq!(out.result.monthly_savings, dec!(935));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_loan_without_payment_or_term() {
        let mut input = two_loans();
        input.existing_loans[1].remaining_years = None;
        match consolidate_credit(&input).unwrap_err() {
            LoanCalcError::InvalidArgument { field, reason } => {
                assert_eq!(field, "existing_loans");
                assert!(reason.contains("loan 1"));
            }
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_no_existing_loans() {
        let input = CreditRefinanceInput {
            existing_loans: Vec::new(),
            ..two_loans()
        };
        match consolidate_credit(&input).unwrap_err() {
            LoanCalcError::InvalidArgument { field, .. } => assert_eq!(field, "existing_loans"),
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_purpose() {
        let input: CreditRefinanceInput = serde_json::from_str(
            r#"{
                "existing_loans": [{"balance": "40000", "rate": "14", "monthly_payment": "1400"}],
                "new_rate": "9",
                "new_years": "4",
                "monthly_income": "15000",
                "age": 35,
                "purpose": "rate_reduction"
            }"#,
        )
        .unwrap();
        assert_eq!(input.purpose, RefinancePurpose::RateReduction);
        let r = consolidate_credit(&input).unwrap().result;
        assert_eq!(r.consolidation_amount, dec!(40_000));
        assert!(r.monthly_savings > Decimal::ZERO);
    }
}
