use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_calc_core::BusinessPath;

use super::Context;

/// Arguments for showing parameters
#[derive(Args)]
pub struct ParamsArgs {
    /// mortgage, credit, mortgage_refinance or credit_refinance
    #[arg(long, default_value = "mortgage")]
    pub path: String,
}

/// Arguments for a quote at the current rate
#[derive(Args)]
pub struct QuoteArgs {
    /// mortgage or credit
    #[arg(long, default_value = "mortgage")]
    pub path: String,

    /// Property value (mortgage) or credit amount (credit)
    #[arg(long)]
    pub amount: Decimal,

    /// Initial payment, mortgage only
    #[arg(long, default_value = "0")]
    pub initial_payment: Decimal,

    /// Term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Overrides the current rate
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Instead of a payment, report the whole-year mortgage term this
    /// monthly payment needs
    #[arg(long, conflicts_with = "years")]
    pub target_payment: Option<Decimal>,
}

pub fn run_params(args: ParamsArgs, ctx: &mut Context) -> Result<Value, Box<dyn std::error::Error>> {
    let path: BusinessPath = args.path.parse()?;
    Ok(serde_json::to_value(ctx.service.parameters(path))?)
}

pub fn run_quote(args: QuoteArgs, ctx: &mut Context) -> Result<Value, Box<dyn std::error::Error>> {
    let path: BusinessPath = args.path.parse()?;

    if let Some(target) = args.target_payment {
        if path != BusinessPath::Mortgage {
            return Err("--target-payment is only available for mortgage quotes".into());
        }
        let term_years = ctx
            .service
            .loan_period(args.amount, args.initial_payment, target)?;
        return Ok(serde_json::json!({
            "business_path": path,
            "rate": ctx.service.current_rate(path),
            "monthly_payment": target,
            "term_years": term_years,
        }));
    }

    let years = args.years.ok_or("--years or --target-payment is required")?;
    let monthly_payment = match path {
        BusinessPath::Mortgage => {
            ctx.service
                .mortgage_payment(args.amount, args.initial_payment, years, args.rate)?
        }
        BusinessPath::Credit => ctx.service.credit_payment(args.amount, years, args.rate)?,
        other => return Err(format!("quotes are not available for {other}").into()),
    };
    let rate = match args.rate {
        Some(rate) => rate,
        None => ctx.service.current_rate(path),
    };

    Ok(serde_json::json!({
        "business_path": path,
        "rate": rate,
        "term_years": years,
        "monthly_payment": monthly_payment,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;
    use rust_decimal_macros::dec;

    fn quote(path: &str) -> QuoteArgs {
        QuoteArgs {
            path: path.into(),
            amount: dec!(1_000_000),
            initial_payment: dec!(200_000),
            years: Some(dec!(20)),
            rate: None,
            target_payment: None,
        }
    }

    #[test]
    fn test_mortgage_quote_at_current_rate() {
        let mut ctx = test_context();
        let value = run_quote(quote("mortgage"), &mut ctx).unwrap();
        // 800k at 5% over 20 years
        assert_eq!(value["monthly_payment"], "5280");
        assert_eq!(value["rate"], "5.0");
    }

    #[test]
    fn test_target_payment_gives_term() {
        let mut ctx = test_context();
        let args = QuoteArgs {
            years: None,
            target_payment: Some(dec!(5279)),
            ..quote("mortgage")
        };
        let value = run_quote(args, &mut ctx).unwrap();
        assert_eq!(value["term_years"], "20");
    }

    #[test]
    fn test_refinance_paths_have_no_quote() {
        let mut ctx = test_context();
        assert!(run_quote(quote("credit_refinance"), &mut ctx).is_err());
    }

    #[test]
    fn test_params_for_path() {
        let mut ctx = test_context();
        let value = run_params(
            ParamsArgs {
                path: "credit".into(),
            },
            &mut ctx,
        )
        .unwrap();
        assert_eq!(value["business_path"], "credit");
        assert_eq!(value["current_interest_rate"], "8.5");
        assert_eq!(value["is_fallback"], false);
    }
}
