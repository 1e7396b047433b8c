use clap::Args;
use serde_json::Value;

use loan_calc_core::assessment::{
    self, ApprovalEstimateInput, CreditAssessmentInput, CreditStandards, MortgageAssessmentInput,
    MortgageStandards,
};
use loan_calc_core::BusinessPath;

use super::Context;
use crate::input;

/// Arguments for a mortgage assessment
#[derive(Args)]
pub struct AssessMortgageArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a consumer credit assessment
#[derive(Args)]
pub struct AssessCreditArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for an approval probability estimate
#[derive(Args)]
pub struct ApprovalEstimateArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_assess_mortgage(
    args: AssessMortgageArgs,
    ctx: &mut Context,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut am_input: MortgageAssessmentInput =
        input::require_input(args.input.as_deref(), "mortgage assessment")?;
    if am_input.standards.is_none() {
        let params = ctx.service.parameters(BusinessPath::Mortgage);
        am_input.standards = Some(MortgageStandards::from_parameters(&params));
    }
    let result = assessment::assess_mortgage(&am_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_assess_credit(
    args: AssessCreditArgs,
    ctx: &mut Context,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut ac_input: CreditAssessmentInput =
        input::require_input(args.input.as_deref(), "credit assessment")?;
    if ac_input.standards.is_none() {
        let params = ctx.service.parameters(BusinessPath::Credit);
        ac_input.standards = Some(CreditStandards::from_parameters(&params));
    }
    let result = assessment::assess_credit(&ac_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_approval_estimate(
    args: ApprovalEstimateArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let ae_input: ApprovalEstimateInput =
        input::require_input(args.input.as_deref(), "approval estimate")?;
    let result = assessment::estimate_approval(&ae_input)?;
    Ok(serde_json::to_value(result)?)
}
