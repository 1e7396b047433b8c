//! Shared input guards. Every guard fails with `InvalidArgument` naming the
//! offending field.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::error::LoanCalcError;
use crate::LoanCalcResult;

pub fn require_positive(field: &str, value: Decimal) -> LoanCalcResult<()> {
    if value <= Decimal::ZERO {
        return Err(LoanCalcError::invalid(
            field,
            format!("must be greater than zero (got {value})"),
        ));
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: Decimal) -> LoanCalcResult<()> {
    if value < Decimal::ZERO {
        return Err(LoanCalcError::invalid(
            field,
            format!("cannot be negative (got {value})"),
        ));
    }
    Ok(())
}

/// Error for an intermediate result that does not fit in a `Decimal`.
pub fn out_of_range(field: &str) -> LoanCalcError {
    LoanCalcError::invalid(field, "exceeds decimal range")
}

/// Convert a binary float into a decimal, rejecting NaN and infinities.
///
/// `Decimal` has no non-finite values, so this is the single place where a
/// non-finite rate or amount coming from a JavaScript caller is caught.
pub fn decimal_from_f64(field: &str, value: f64) -> LoanCalcResult<Decimal> {
    if !value.is_finite() {
        return Err(LoanCalcError::invalid(field, "must be a finite number"));
    }
    Decimal::from_f64(value)
        .ok_or_else(|| LoanCalcError::invalid(field, "is outside the decimal range"))
}
