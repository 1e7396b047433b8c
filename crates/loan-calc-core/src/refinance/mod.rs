//! Refinancing an existing mortgage and consolidating consumer credit.
//!
//! Both comparisons price the old and the new obligation through
//! [`crate::engine`] and then run the same kind of approval criteria as
//! [`crate::assessment`], with refinance-specific checks on top (break-even,
//! cash-out size, savings, DTI improvement).

pub mod credit;
pub mod mortgage;

use serde::{Deserialize, Serialize};

pub use credit::{
    consolidate_credit, CreditRefinanceAnalysis, CreditRefinanceInput, CreditRefinanceStandards,
    ExistingLoan, PricedLoan,
};
pub use mortgage::{
    compare_mortgage_refinance, MortgageRefinanceAnalysis, MortgageRefinanceInput,
    MortgageRefinanceStandards,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinanceType {
    /// Same balance, new rate and term.
    #[default]
    RateAndTerm,
    /// New loan larger than the balance; the difference is paid out.
    CashOut,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinancePurpose {
    #[default]
    Consolidation,
    RateReduction,
    PaymentReduction,
}
