mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::assessment::{ApprovalEstimateArgs, AssessCreditArgs, AssessMortgageArgs};
use commands::engine::{DownPaymentArgs, DtiArgs, LtvArgs, PaymentArgs, PeriodArgs, RemainingArgs};
use commands::offers::CompareOffersArgs;
use commands::parameters::{ParamsArgs, QuoteArgs};
use commands::refinance::{RefinanceCreditArgs, RefinanceMortgageArgs};

/// Mortgage and consumer credit calculations
#[derive(Parser)]
#[command(
    name = "lcalc",
    version,
    about = "Mortgage and consumer credit calculations",
    long_about = "A CLI for loan payment, LTV and DTI calculations with decimal precision. \
                  Also runs mortgage and credit approval checks, compares bank quotes and \
                  evaluates refinancing."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML or JSON file with rate and standards per business path
    #[arg(long, env = "LCALC_PARAMS", global = true)]
    params: Option<String>,

    /// How long fetched parameters stay cached
    #[arg(long, default_value_t = 300, global = true)]
    cache_ttl_secs: i64,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly payment and totals for a fixed-rate loan
    Payment(PaymentArgs),
    /// Term needed to repay a loan with a given monthly payment
    Period(PeriodArgs),
    /// Simple-interest projection of an outstanding amount
    Remaining(RemainingArgs),
    /// LTV ceiling for a property ownership status
    Ltv(LtvArgs),
    /// Minimum down payment for a purchase
    DownPayment(DownPaymentArgs),
    /// Debt-to-income check for a new payment
    Dti(DtiArgs),
    /// Mortgage approval criteria
    AssessMortgage(AssessMortgageArgs),
    /// Consumer credit approval criteria
    AssessCredit(AssessCreditArgs),
    /// Quick approval probability estimate
    ApprovalEstimate(ApprovalEstimateArgs),
    /// Price and rank bank quotes
    CompareOffers(CompareOffersArgs),
    /// Compare the current mortgage against a refinance
    RefinanceMortgage(RefinanceMortgageArgs),
    /// Consolidate existing consumer loans into one
    RefinanceCredit(RefinanceCreditArgs),
    /// Show the parameters in effect for a business path
    Params(ParamsArgs),
    /// Payment at the current rate for a business path
    Quote(QuoteArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut ctx = commands::Context::new(cli.params.as_deref(), cli.cache_ttl_secs);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::engine::run_payment(args, &mut ctx),
        Commands::Period(args) => commands::engine::run_period(args, &mut ctx),
        Commands::Remaining(args) => commands::engine::run_remaining(args, &mut ctx),
        Commands::Ltv(args) => commands::engine::run_ltv(args, &mut ctx),
        Commands::DownPayment(args) => commands::engine::run_down_payment(args),
        Commands::Dti(args) => commands::engine::run_dti(args, &mut ctx),
        Commands::AssessMortgage(args) => commands::assessment::run_assess_mortgage(args, &mut ctx),
        Commands::AssessCredit(args) => commands::assessment::run_assess_credit(args, &mut ctx),
        Commands::ApprovalEstimate(args) => commands::assessment::run_approval_estimate(args),
        Commands::CompareOffers(args) => commands::offers::run_compare_offers(args),
        Commands::RefinanceMortgage(args) => {
            commands::refinance::run_refinance_mortgage(args, &mut ctx)
        }
        Commands::RefinanceCredit(args) => commands::refinance::run_refinance_credit(args, &mut ctx),
        Commands::Params(args) => commands::parameters::run_params(args, &mut ctx),
        Commands::Quote(args) => commands::parameters::run_quote(args, &mut ctx),
        Commands::Version => {
            println!("lcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
