use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanCalcError {
    /// A precondition on caller-supplied input was violated. This is the only
    /// kind the calculation engine itself produces.
    #[error("Invalid argument `{field}`: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Parameter source unavailable: {0}")]
    ParameterSource(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LoanCalcError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LoanCalcError::InvalidArgument {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LoanCalcError {
    fn from(e: serde_json::Error) -> Self {
        LoanCalcError::Serialization(e.to_string())
    }
}
