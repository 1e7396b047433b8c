//! Annuity payment, term inversion and balance projection.
//!
//! This is the only implementation of the amortization formula in the crate;
//! assessments, offer comparison and refinance analysis all price loans
//! through these functions. All math in `rust_decimal::Decimal`, with payments
//! rounded to whole currency units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate, Years};
use crate::validate::{out_of_range, require_non_negative, require_positive};
use crate::LoanCalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

/// Longest term most lenders will write; longer terms only produce a warning.
const CUSTOMARY_MAX_TERM_YEARS: Decimal = dec!(30);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// One payment calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequest {
    /// Amount financed.
    pub principal: Money,
    /// Nominal annual rate as a percentage (5.0 = 5%).
    pub annual_rate_percent: Percent,
    pub term_years: Years,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Whole currency units.
    pub monthly_payment: Money,
    /// `monthly_payment` times the number of payments.
    pub total_payment: Money,
    pub total_interest: Money,
    /// Effective annual rate implied by monthly compounding, as a percentage.
    pub effective_rate: Percent,
    pub number_of_payments: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodInput {
    pub principal: Money,
    pub monthly_payment: Money,
    pub annual_rate_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodOutput {
    /// Term rounded to the nearest whole year (at least one).
    pub term_years: Years,
    /// Unrounded number of monthly payments, to two decimal places.
    pub term_months: Decimal,
    /// Payment that only covers interest; any payment must exceed it.
    pub interest_only_payment: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemainingBalanceInput {
    pub initial_amount: Money,
    pub elapsed_years: Years,
    pub annual_rate_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemainingBalanceOutput {
    pub remaining_balance: Money,
    pub accrued_interest: Money,
}

// ---------------------------------------------------------------------------
// Scalar API
// ---------------------------------------------------------------------------

/// Monthly rate as a decimal from an annual percentage: `rate / 100 / 12`.
pub fn monthly_rate(annual_rate_percent: Percent) -> Rate {
    annual_rate_percent / PERCENT / MONTHS_PER_YEAR
}

/// Number of monthly payments in a term, rounded to the nearest month.
pub fn number_of_payments(term_years: Years) -> LoanCalcResult<u32> {
    require_positive("term_years", term_years)?;
    let months = (term_years * MONTHS_PER_YEAR)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .ok_or_else(|| LoanCalcError::invalid("term_years", "term is too long"))?;
    if months == 0 {
        return Err(LoanCalcError::invalid(
            "term_years",
            "term is shorter than a single monthly payment",
        ));
    }
    Ok(months)
}

/// Round to the nearest whole currency unit, halves away from zero.
pub fn round_to_unit(amount: Money) -> Money {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed monthly payment that fully amortizes `principal` over `term_years`.
///
/// `PMT = P * r(1+r)^n / ((1+r)^n - 1)` with `r` the monthly rate and `n` the
/// number of monthly payments; a zero rate degenerates to `P / n`. The result
/// is rounded to a whole currency unit and is never zero for a valid request.
pub fn calculate_monthly_payment(
    principal: Money,
    annual_rate_percent: Percent,
    term_years: Years,
) -> LoanCalcResult<Money> {
    validate_loan_terms(principal, annual_rate_percent)?;
    let n = number_of_payments(term_years)?;
    let exact = exact_payment(principal, monthly_rate(annual_rate_percent), n)?;
    Ok(round_to_unit(exact).max(Decimal::ONE))
}

/// Term in whole years that a fixed `monthly_payment` needs to repay
/// `principal`: `n = -ln(1 - P*r/PMT) / ln(1 + r)` months.
///
/// Fails when the payment does not exceed the interest-only payment, since
/// such a loan never amortizes.
pub fn calculate_period_from_payment(
    principal: Money,
    monthly_payment: Money,
    annual_rate_percent: Percent,
) -> LoanCalcResult<Years> {
    let months = amortization_months(principal, monthly_payment, annual_rate_percent)?;
    Ok(whole_years(months))
}

/// Simple-interest projection of what would be owed after `elapsed_years`
/// absent any payments: `initial * (1 + rate/100 * years)`.
///
/// Used as the refinance-comparison heuristic; it does not walk an
/// amortization table.
pub fn calculate_remaining_balance(
    initial_amount: Money,
    elapsed_years: Years,
    annual_rate_percent: Percent,
) -> LoanCalcResult<Money> {
    require_positive("initial_amount", initial_amount)?;
    require_non_negative("elapsed_years", elapsed_years)?;
    require_non_negative("annual_rate_percent", annual_rate_percent)?;
    (annual_rate_percent / PERCENT)
        .checked_mul(elapsed_years)
        .and_then(|accrual| accrual.checked_add(Decimal::ONE))
        .and_then(|growth| initial_amount.checked_mul(growth))
        .ok_or_else(|| out_of_range("initial_amount"))
}

// ---------------------------------------------------------------------------
// Envelope API
// ---------------------------------------------------------------------------

/// Price a loan: rounded monthly payment, totals and effective annual rate.
pub fn calculate_loan(
    request: &LoanRequest,
) -> LoanCalcResult<ComputationOutput<CalculationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let monthly_payment = calculate_monthly_payment(
        request.principal,
        request.annual_rate_percent,
        request.term_years,
    )?;
    let n = number_of_payments(request.term_years)?;
    let r = monthly_rate(request.annual_rate_percent);

    if request.annual_rate_percent.is_zero() {
        warnings.push(
            "Zero interest rate: payment is principal divided by the number of payments.".into(),
        );
    }
    if request.term_years > CUSTOMARY_MAX_TERM_YEARS {
        warnings.push(format!(
            "Term of {} years exceeds the customary {CUSTOMARY_MAX_TERM_YEARS}-year maximum.",
            request.term_years
        ));
    }

    let total_payment = monthly_payment
        .checked_mul(Decimal::from(n))
        .ok_or_else(|| out_of_range("principal"))?;
    let effective_rate = (Decimal::ONE + r)
        .checked_powi(12)
        .and_then(|growth| (growth - Decimal::ONE).checked_mul(PERCENT))
        .map(|rate| rate.round_dp(4))
        .unwrap_or(request.annual_rate_percent);

    let output = CalculationResult {
        monthly_payment,
        total_payment,
        total_interest: (total_payment - request.principal).max(Decimal::ZERO),
        effective_rate,
        number_of_payments: n,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "monthly_rate": r.round_dp(10).to_string(),
        "rounding": "nearest whole currency unit",
    });

    Ok(with_metadata(
        "Fixed-rate annuity (equal monthly installments)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Solve for the term that a target monthly payment implies.
pub fn calculate_period(input: &PeriodInput) -> LoanCalcResult<ComputationOutput<PeriodOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let months = amortization_months(
        input.principal,
        input.monthly_payment,
        input.annual_rate_percent,
    )?;
    let term_years = whole_years(months);
    if months < MONTHS_PER_YEAR {
        warnings.push("Payment repays the loan in under a year; term reported as 1 year.".into());
    }

    let output = PeriodOutput {
        term_years,
        term_months: months.round_dp(2),
        interest_only_payment: (input.principal * monthly_rate(input.annual_rate_percent))
            .round_dp(2),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "rounding": "nearest whole year",
    });

    Ok(with_metadata(
        "Annuity term inversion (logarithmic)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Project an outstanding amount forward with simple interest.
pub fn project_remaining_balance(
    input: &RemainingBalanceInput,
) -> LoanCalcResult<ComputationOutput<RemainingBalanceOutput>> {
    let start = Instant::now();

    let remaining_balance = calculate_remaining_balance(
        input.initial_amount,
        input.elapsed_years,
        input.annual_rate_percent,
    )?;

    let output = RemainingBalanceOutput {
        remaining_balance,
        accrued_interest: remaining_balance - input.initial_amount,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "interest": "simple, non-compounding",
        "payments": "none assumed during the projection",
    });

    Ok(with_metadata(
        "Simple-interest balance projection",
        &assumptions,
        Vec::new(),
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_loan_terms(principal: Money, annual_rate_percent: Percent) -> LoanCalcResult<()> {
    require_positive("principal", principal)?;
    require_non_negative("annual_rate_percent", annual_rate_percent)?;
    Ok(())
}

/// Unrounded annuity payment.
fn exact_payment(principal: Money, r: Rate, n: u32) -> LoanCalcResult<Decimal> {
    let straight_line = principal / Decimal::from(n);
    if r.is_zero() {
        return Ok(straight_line);
    }

    let growth = (Decimal::ONE + r).checked_powi(n as i64).ok_or_else(|| {
        LoanCalcError::invalid("term_years", "compounding factor exceeds decimal range")
    })?;
    let denominator = growth - Decimal::ONE;
    // rate below decimal resolution: (1+r)^n rounds back to 1
    if denominator.is_zero() {
        return Ok(straight_line);
    }

    principal
        .checked_mul(r)
        .and_then(|v| v.checked_mul(growth))
        .and_then(|numerator| numerator.checked_div(denominator))
        .ok_or_else(|| out_of_range("principal"))
}

/// Exact number of monthly payments needed to repay `principal`.
fn amortization_months(
    principal: Money,
    monthly_payment: Money,
    annual_rate_percent: Percent,
) -> LoanCalcResult<Decimal> {
    validate_loan_terms(principal, annual_rate_percent)?;
    require_positive("monthly_payment", monthly_payment)?;

    let r = monthly_rate(annual_rate_percent);
    let straight_line = principal
        .checked_div(monthly_payment)
        .ok_or_else(|| out_of_range("monthly_payment"))?;
    if r.is_zero() {
        return Ok(straight_line);
    }

    let interest_only = principal
        .checked_mul(r)
        .ok_or_else(|| out_of_range("annual_rate_percent"))?;
    if monthly_payment <= interest_only {
        return Err(LoanCalcError::invalid(
            "monthly_payment",
            format!(
                "payment too low to amortize: must exceed the interest-only payment of {}",
                interest_only.round_dp(2)
            ),
        ));
    }

    let remaining_fraction = Decimal::ONE - interest_only / monthly_payment;
    let numerator = remaining_fraction.checked_ln().ok_or_else(|| {
        LoanCalcError::invalid("monthly_payment", "logarithm undefined for this payment")
    })?;
    let denominator = (Decimal::ONE + r).checked_ln().ok_or_else(|| {
        LoanCalcError::invalid("annual_rate_percent", "logarithm undefined for this rate")
    })?;
    if denominator.is_zero() {
        return Ok(straight_line);
    }

    (-numerator)
        .checked_div(denominator)
        .ok_or_else(|| out_of_range("monthly_payment"))
}

fn whole_years(months: Decimal) -> Years {
    (months / MONTHS_PER_YEAR)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .max(Decimal::ONE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
