use clap::Args;
use serde_json::Value;

use loan_calc_core::refinance::{
    self, CreditRefinanceInput, CreditRefinanceStandards, MortgageRefinanceInput,
    MortgageRefinanceStandards,
};
use loan_calc_core::BusinessPath;

use super::Context;
use crate::input;

/// Arguments for a mortgage refinance comparison
#[derive(Args)]
pub struct RefinanceMortgageArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a credit consolidation
#[derive(Args)]
pub struct RefinanceCreditArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_refinance_mortgage(
    args: RefinanceMortgageArgs,
    ctx: &mut Context,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut rm_input: MortgageRefinanceInput =
        input::require_input(args.input.as_deref(), "mortgage refinance")?;
    if rm_input.standards.is_none() {
        let params = ctx.service.parameters(BusinessPath::MortgageRefinance);
        rm_input.standards = Some(MortgageRefinanceStandards::from_parameters(&params));
    }
    let result = refinance::compare_mortgage_refinance(&rm_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_refinance_credit(
    args: RefinanceCreditArgs,
    ctx: &mut Context,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut rc_input: CreditRefinanceInput =
        input::require_input(args.input.as_deref(), "credit consolidation")?;
    if rc_input.standards.is_none() {
        let params = ctx.service.parameters(BusinessPath::CreditRefinance);
        rc_input.standards = Some(CreditRefinanceStandards::from_parameters(&params));
    }
    let result = refinance::consolidate_credit(&rc_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;
    use std::fs;

    #[test]
    fn test_cash_out_uses_refinance_ceiling() {
        let path = std::env::temp_dir().join(format!("lcalc-rm-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{
                "current_loan_amount": "800000",
                "current_rate": "6.5",
                "remaining_years": "25",
                "property_value": "1200000",
                "refinance_type": "cash_out",
                "new_loan_amount": "900000",
                "new_rate": "4.5",
                "new_years": "25",
                "monthly_income": "30000",
                "monthly_expenses": "1000",
                "age": 40,
                "credit_score": 760
            }"#,
        )
        .unwrap();
        let mut ctx = test_context();
        let value = run_refinance_mortgage(
            RefinanceMortgageArgs {
                input: Some(path.to_str().unwrap().to_string()),
            },
            &mut ctx,
        )
        .unwrap();
        assert_eq!(value["result"]["ltv_ceiling"], "75");
        assert_eq!(value["result"]["approved"], true);
        assert_eq!(value["result"]["cash_out_amount"], "100000");
        fs::remove_file(path).unwrap();
    }
}
