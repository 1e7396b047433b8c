//! Pure loan math. Nothing in here performs I/O or looks up rates; callers
//! pass every input explicitly.

pub mod annuity;
pub mod dti;
pub mod ltv;

pub use annuity::{
    calculate_loan, calculate_monthly_payment, calculate_period, calculate_period_from_payment,
    calculate_remaining_balance, project_remaining_balance, CalculationResult, LoanRequest,
};
pub use dti::{calculate_dti, evaluate_dti, DtiEvaluation, DtiInput};
pub use ltv::{
    calculate_down_payment, compute_minimum_down_payment, resolve_ltv_ceiling,
    resolve_ltv_ceiling_by_name, DownPaymentInput, PropertyOwnershipStatus,
};
