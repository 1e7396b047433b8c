use clap::Args;
use serde_json::Value;

use loan_calc_core::offers::{self, OfferComparisonInput};

use crate::input;

/// Arguments for a bank quote comparison
#[derive(Args)]
pub struct CompareOffersArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_compare_offers(args: CompareOffersArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let oc_input: OfferComparisonInput =
        input::require_input(args.input.as_deref(), "offer comparison")?;
    let result = offers::compare_offers(&oc_input)?;
    Ok(serde_json::to_value(result)?)
}
