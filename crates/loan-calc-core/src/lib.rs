pub mod engine;
pub mod error;
pub mod types;
pub mod validate;

#[cfg(feature = "parameters")]
pub mod parameters;

#[cfg(feature = "assessment")]
pub mod assessment;

#[cfg(feature = "offers")]
pub mod offers;

#[cfg(feature = "refinance")]
pub mod refinance;

pub use engine::{
    calculate_monthly_payment, calculate_period_from_payment, calculate_remaining_balance,
    compute_minimum_down_payment, evaluate_dti, resolve_ltv_ceiling, DtiEvaluation,
    PropertyOwnershipStatus,
};
pub use error::LoanCalcError;
pub use types::*;

/// Standard result type for all loan-calc operations
pub type LoanCalcResult<T> = Result<T, LoanCalcError>;
