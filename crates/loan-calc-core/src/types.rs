use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LoanCalcError;

/// All monetary values, in whole currency units (shekels) unless stated.
pub type Money = Decimal;

/// Percentages as whole numbers (5.0 = 5%). Rate tables, LTV ceilings and DTI
/// limits are all quoted this way.
pub type Percent = Decimal;

/// Periodic rates as decimals (0.004167 = 0.4167% per month).
pub type Rate = Decimal;

/// Year counts, possibly fractional on input
pub type Years = Decimal;

/// Loan product a calculation belongs to. Each path has its own rate and
/// banking standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessPath {
    Mortgage,
    Credit,
    MortgageRefinance,
    CreditRefinance,
}

impl BusinessPath {
    pub const ALL: [BusinessPath; 4] = [
        BusinessPath::Mortgage,
        BusinessPath::Credit,
        BusinessPath::MortgageRefinance,
        BusinessPath::CreditRefinance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessPath::Mortgage => "mortgage",
            BusinessPath::Credit => "credit",
            BusinessPath::MortgageRefinance => "mortgage_refinance",
            BusinessPath::CreditRefinance => "credit_refinance",
        }
    }

    /// Mortgage paths are secured by property and carry ownership LTV rules.
    pub fn is_secured(&self) -> bool {
        matches!(
            self,
            BusinessPath::Mortgage | BusinessPath::MortgageRefinance
        )
    }
}

impl fmt::Display for BusinessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusinessPath {
    type Err = LoanCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mortgage" => Ok(BusinessPath::Mortgage),
            "credit" => Ok(BusinessPath::Credit),
            "mortgage_refinance" => Ok(BusinessPath::MortgageRefinance),
            "credit_refinance" => Ok(BusinessPath::CreditRefinance),
            other => Err(LoanCalcError::InvalidArgument {
                field: "business_path".into(),
                reason: format!("unrecognised business path '{other}'"),
            }),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
