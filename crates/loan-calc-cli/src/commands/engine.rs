use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use loan_calc_core::engine::annuity::{PeriodInput, RemainingBalanceInput};
use loan_calc_core::engine::{
    self, DownPaymentInput, DtiInput, LoanRequest, PropertyOwnershipStatus,
};
use loan_calc_core::parameters::standard;
use loan_calc_core::BusinessPath;

use super::Context;
use crate::input;

/// Arguments for a payment calculation
#[derive(Args)]
pub struct PaymentArgs {
    /// Amount financed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate in percent (5 = 5%); defaults to the current rate for --path
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Business path whose current rate is used when --rate is absent
    #[arg(long, default_value = "mortgage")]
    pub path: String,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the term needed at a given payment
#[derive(Args)]
pub struct PeriodArgs {
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Fixed monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Annual rate in percent; defaults to the current mortgage rate
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a simple-interest balance projection
#[derive(Args)]
pub struct RemainingArgs {
    /// Amount outstanding today
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Years to project forward
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Annual rate in percent; defaults to the current mortgage rate
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for an LTV ceiling lookup
#[derive(Args)]
pub struct LtvArgs {
    /// no_property, has_property or selling_property
    #[arg(long)]
    pub status: String,

    /// Look the ceiling up in the parameters for this path instead of the
    /// fixed policy table
    #[arg(long)]
    pub path: Option<String>,
}

/// Arguments for a down payment calculation
#[derive(Args)]
pub struct DownPaymentArgs {
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// no_property, has_property or selling_property
    #[arg(long)]
    pub status: Option<String>,

    /// Down payment to check against the minimum
    #[arg(long)]
    pub proposed: Option<Decimal>,

    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a debt-to-income check
#[derive(Args)]
pub struct DtiArgs {
    /// Gross monthly income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Existing monthly obligations
    #[arg(long, default_value = "0")]
    pub obligations: Decimal,

    /// Proposed new monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Maximum DTI in percent; defaults to the mortgage standard
    #[arg(long)]
    pub max_dti: Option<Decimal>,

    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_payment(args: PaymentArgs, ctx: &mut Context) -> Result<Value, Box<dyn std::error::Error>> {
    let request: LoanRequest = match input::read_input(args.input.as_deref())? {
        Some(request) => request,
        None => {
            let path: BusinessPath = args.path.parse()?;
            LoanRequest {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                annual_rate_percent: match args.rate {
                    Some(rate) => rate,
                    None => ctx.service.current_rate(path),
                },
                term_years: args.years.ok_or("--years is required (or provide --input)")?,
            }
        }
    };
    let result = engine::calculate_loan(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_period(args: PeriodArgs, ctx: &mut Context) -> Result<Value, Box<dyn std::error::Error>> {
    let period_input: PeriodInput = match input::read_input(args.input.as_deref())? {
        Some(data) => data,
        None => PeriodInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            monthly_payment: args.payment.ok_or("--payment is required (or provide --input)")?,
            annual_rate_percent: match args.rate {
                Some(rate) => rate,
                None => ctx.service.current_rate(BusinessPath::Mortgage),
            },
        },
    };
    let result = engine::calculate_period(&period_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_remaining(
    args: RemainingArgs,
    ctx: &mut Context,
) -> Result<Value, Box<dyn std::error::Error>> {
    let balance_input: RemainingBalanceInput = match input::read_input(args.input.as_deref())? {
        Some(data) => data,
        None => RemainingBalanceInput {
            initial_amount: args.amount.ok_or("--amount is required (or provide --input)")?,
            elapsed_years: args.years.ok_or("--years is required (or provide --input)")?,
            annual_rate_percent: match args.rate {
                Some(rate) => rate,
                None => ctx.service.current_rate(BusinessPath::Mortgage),
            },
        },
    };
    let result = engine::project_remaining_balance(&balance_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_ltv(args: LtvArgs, ctx: &mut Context) -> Result<Value, Box<dyn std::error::Error>> {
    let status: PropertyOwnershipStatus = args.status.parse()?;
    let ltv_ceiling = match args.path {
        Some(ref path) => ctx.service.property_ownership_ltv(status, path.parse()?),
        None => engine::resolve_ltv_ceiling(status),
    };
    Ok(serde_json::json!({
        "ownership_status": status,
        "ltv_ceiling": ltv_ceiling,
        "min_down_payment_percent": dec!(100) - ltv_ceiling,
    }))
}

pub fn run_down_payment(args: DownPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dp_input: DownPaymentInput = match input::read_input(args.input.as_deref())? {
        Some(data) => data,
        None => DownPaymentInput {
            property_value: args
                .property_value
                .ok_or("--property-value is required (or provide --input)")?,
            ownership_status: args
                .status
                .as_deref()
                .ok_or("--status is required (or provide --input)")?
                .parse()?,
            proposed_down_payment: args.proposed,
        },
    };
    let result = engine::calculate_down_payment(&dp_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_dti(args: DtiArgs, ctx: &mut Context) -> Result<Value, Box<dyn std::error::Error>> {
    let dti_input: DtiInput = match input::read_input(args.input.as_deref())? {
        Some(data) => data,
        None => DtiInput {
            monthly_income: args.income.ok_or("--income is required (or provide --input)")?,
            existing_obligations: args.obligations,
            new_payment: args.payment.ok_or("--payment is required (or provide --input)")?,
            max_dti_percent: match args.max_dti {
                Some(max) => max,
                None => ctx
                    .service
                    .standard_value(standard::DTI, standard::MAX_DTI, BusinessPath::Mortgage)
                    .unwrap_or(dec!(42)),
            },
        },
    };
    let result = engine::calculate_dti(&dti_input)?;
    Ok(serde_json::to_value(result)?)
}
