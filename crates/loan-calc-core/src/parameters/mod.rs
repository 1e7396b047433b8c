//! Rate and banking-standard parameters per business path.
//!
//! Parameters live outside the engine: a [`ParameterSource`] supplies them,
//! a [`ParameterCache`] keeps them for a configurable TTL, and the
//! [`CalculationService`] falls back to the constant table in [`fallback`]
//! when the source fails. The engine itself only ever sees plain numbers.

pub mod cache;
pub mod fallback;
pub mod service;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::engine::PropertyOwnershipStatus;
use crate::error::LoanCalcError;
use crate::types::{BusinessPath, Percent};
use crate::LoanCalcResult;

pub use cache::ParameterCache;
pub use service::CalculationService;

/// Standard category / name pairs used by the calculators.
pub mod standard {
    pub const LTV: &str = "ltv";
    pub const MAX_LTV: &str = "max_ltv";
    pub const DTI: &str = "dti";
    pub const MAX_DTI: &str = "max_dti";
    pub const REFINANCE: &str = "refinance";
    pub const MIN_SAVINGS_PERCENT: &str = "min_savings_percent";
    pub const CASH_OUT_MAX_LTV: &str = "cash_out_max_ltv";
}

// ---------------------------------------------------------------------------
// Parameter types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipLtv {
    pub ltv: Percent,
    pub min_down_payment: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardValue {
    pub value: Decimal,
    #[serde(rename = "type", default)]
    pub value_type: String,
    #[serde(default)]
    pub description: String,
}

impl StandardValue {
    pub fn percentage(value: Decimal, description: &str) -> Self {
        Self {
            value,
            value_type: "percentage".into(),
            description: description.into(),
        }
    }
}

/// Everything a calculator needs to know about one business path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationParameters {
    pub business_path: BusinessPath,
    pub current_interest_rate: Percent,
    #[serde(default)]
    pub property_ownership_ltvs: BTreeMap<PropertyOwnershipStatus, OwnershipLtv>,
    /// category -> name -> value
    #[serde(default)]
    pub standards: BTreeMap<String, BTreeMap<String, StandardValue>>,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub is_fallback: bool,
}

impl CalculationParameters {
    /// Reject parameters that answer for another path or carry a negative
    /// rate. Sources that return such data are treated as failed.
    pub fn validate(&self, expected: BusinessPath) -> LoanCalcResult<()> {
        if self.business_path != expected {
            return Err(LoanCalcError::ParameterSource(format!(
                "requested {expected} parameters but received {}",
                self.business_path
            )));
        }
        if self.current_interest_rate < Decimal::ZERO {
            return Err(LoanCalcError::ParameterSource(format!(
                "negative interest rate {} for {expected}",
                self.current_interest_rate
            )));
        }
        for (status, entry) in &self.property_ownership_ltvs {
            if entry.ltv <= Decimal::ZERO || entry.ltv > Decimal::ONE_HUNDRED {
                return Err(LoanCalcError::ParameterSource(format!(
                    "LTV {} for {status} is outside (0, 100]",
                    entry.ltv
                )));
            }
        }
        Ok(())
    }

    pub fn ownership_ltv(&self, status: PropertyOwnershipStatus) -> Option<Percent> {
        self.property_ownership_ltvs.get(&status).map(|e| e.ltv)
    }

    pub fn standard(&self, category: &str, name: &str) -> Option<Decimal> {
        self.standards
            .get(category)
            .and_then(|names| names.get(name))
            .map(|s| s.value)
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where parameters come from: a database, an HTTP endpoint, a file.
pub trait ParameterSource {
    fn fetch(&self, path: BusinessPath) -> LoanCalcResult<CalculationParameters>;
}

impl<S: ParameterSource + ?Sized> ParameterSource for &S {
    fn fetch(&self, path: BusinessPath) -> LoanCalcResult<CalculationParameters> {
        (**self).fetch(path)
    }
}

impl<S: ParameterSource + ?Sized> ParameterSource for Box<S> {
    fn fetch(&self, path: BusinessPath) -> LoanCalcResult<CalculationParameters> {
        (**self).fetch(path)
    }
}

/// In-memory source holding one parameter set per path. Paths with no entry
/// fail, which sends the service to its fallback table.
#[derive(Debug, Clone, Default)]
pub struct StaticParameterSource {
    entries: HashMap<BusinessPath, CalculationParameters>,
}

impl StaticParameterSource {
    pub fn new(parameters: impl IntoIterator<Item = CalculationParameters>) -> Self {
        Self {
            entries: parameters
                .into_iter()
                .map(|p| (p.business_path, p))
                .collect(),
        }
    }

    pub fn insert(&mut self, parameters: CalculationParameters) {
        self.entries.insert(parameters.business_path, parameters);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ParameterSource for StaticParameterSource {
    fn fetch(&self, path: BusinessPath) -> LoanCalcResult<CalculationParameters> {
        self.entries
            .get(&path)
            .cloned()
            .ok_or_else(|| LoanCalcError::ParameterSource(format!("no parameters for {path}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const MORTGAGE_JSON: &str = r#"{
        "business_path": "mortgage",
        "current_interest_rate": "5.0",
        "property_ownership_ltvs": {
            "no_property": { "ltv": "75.0", "min_down_payment": "25.0" },
            "has_property": { "ltv": "50.0", "min_down_payment": "50.0" },
            "selling_property": { "ltv": "70.0", "min_down_payment": "30.0" }
        },
        "standards": {
            "ltv": { "max_ltv": { "value": "80.0", "type": "percentage", "description": "Maximum LTV ratio" } },
            "dti": { "max_dti": { "value": "42.0", "type": "percentage", "description": "Maximum DTI ratio" } }
        },
        "last_updated": "2024-01-15T10:30:00Z",
        "is_fallback": false
    }"#;

    #[test]
    fn test_deserialize_source_payload() {
        let params: CalculationParameters = serde_json::from_str(MORTGAGE_JSON).unwrap();
        assert_eq!(params.business_path, BusinessPath::Mortgage);
        assert_eq!(params.current_interest_rate, dec!(5.0));
        assert_eq!(
            params.ownership_ltv(PropertyOwnershipStatus::SellingProperty),
            Some(dec!(70))
        );
        assert_eq!(params.standard(standard::DTI, standard::MAX_DTI), Some(dec!(42)));
        assert_eq!(params.standard(standard::DTI, "min_income"), None);
        assert!(params.validate(BusinessPath::Mortgage).is_ok());
    }

    #[test]
    fn test_minimal_payload_defaults() {
        let params: CalculationParameters =
            serde_json::from_str(r#"{ "business_path": "credit", "current_interest_rate": "8.5" }"#)
                .unwrap();
        assert!(params.property_ownership_ltvs.is_empty());
        assert!(params.standards.is_empty());
        assert!(!params.is_fallback);
    }

    #[test]
    fn test_validate_rejects_wrong_path() {
        let params: CalculationParameters = serde_json::from_str(MORTGAGE_JSON).unwrap();
        match params.validate(BusinessPath::Credit).unwrap_err() {
            LoanCalcError::ParameterSource(msg) => assert!(msg.contains("credit")),
            other => panic!("Expected ParameterSource, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_negative_rate() {
        let mut params: CalculationParameters = serde_json::from_str(MORTGAGE_JSON).unwrap();
        params.current_interest_rate = dec!(-0.5);
        assert!(params.validate(BusinessPath::Mortgage).is_err());
    }

    #[test]
    fn test_static_source() {
        let params: CalculationParameters = serde_json::from_str(MORTGAGE_JSON).unwrap();
        let source = StaticParameterSource::new([params.clone()]);
        assert_eq!(source.fetch(BusinessPath::Mortgage).unwrap(), params);
        assert!(source.fetch(BusinessPath::Credit).is_err());
    }
}
