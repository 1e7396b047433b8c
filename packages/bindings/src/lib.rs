use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::prelude::ToPrimitive;

use loan_calc_core::validate::decimal_from_f64;
use loan_calc_core::BusinessPath;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Deserialize the JSON input, run the calculation and serialize its envelope.
fn run_json<I, O>(
    input_json: &str,
    calculate: impl FnOnce(&I) -> loan_calc_core::LoanCalcResult<O>,
) -> NapiResult<String>
where
    I: serde::de::DeserializeOwned,
    O: serde::Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calculate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Rounded monthly payment for plain numbers, for callers that do not need
/// the full envelope.
#[napi]
pub fn monthly_payment(principal: f64, annual_rate_percent: f64, term_years: f64) -> NapiResult<f64> {
    let principal = decimal_from_f64("principal", principal).map_err(to_napi_error)?;
    let rate = decimal_from_f64("annual_rate_percent", annual_rate_percent).map_err(to_napi_error)?;
    let years = decimal_from_f64("term_years", term_years).map_err(to_napi_error)?;
    let payment = loan_calc_core::calculate_monthly_payment(principal, rate, years)
        .map_err(to_napi_error)?;
    payment
        .to_f64()
        .ok_or_else(|| napi::Error::from_reason("payment is not representable as a number"))
}

#[napi]
pub fn calculate_loan(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loan_calc_core::engine::calculate_loan)
}

#[napi]
pub fn calculate_period(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loan_calc_core::engine::calculate_period)
}

#[napi]
pub fn remaining_balance(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loan_calc_core::engine::project_remaining_balance)
}

#[napi]
pub fn down_payment(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loan_calc_core::engine::calculate_down_payment)
}

#[napi]
pub fn debt_to_income(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loan_calc_core::engine::calculate_dti)
}

/// LTV ceiling for an ownership status name, as a decimal string.
#[napi]
pub fn ltv_ceiling(status: String) -> NapiResult<String> {
    let ceiling =
        loan_calc_core::engine::resolve_ltv_ceiling_by_name(&status).map_err(to_napi_error)?;
    Ok(ceiling.to_string())
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Built-in parameters for a business path.
#[napi]
pub fn fallback_parameters(path: String) -> NapiResult<String> {
    let path: BusinessPath = path.parse().map_err(to_napi_error)?;
    let params = loan_calc_core::parameters::fallback::parameters_for(path);
    serde_json::to_string(&params).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

#[napi]
pub fn assess_mortgage(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loan_calc_core::assessment::assess_mortgage)
}

#[napi]
pub fn assess_credit(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loan_calc_core::assessment::assess_credit)
}

#[napi]
pub fn estimate_approval(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loan_calc_core::assessment::estimate_approval)
}

// ---------------------------------------------------------------------------
// Offers and refinance
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_offers(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loan_calc_core::offers::compare_offers)
}

#[napi]
pub fn refinance_mortgage(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loan_calc_core::refinance::compare_mortgage_refinance)
}

#[napi]
pub fn refinance_credit(input_json: String) -> NapiResult<String> {
    run_json(&input_json, loan_calc_core::refinance::consolidate_credit)
}
