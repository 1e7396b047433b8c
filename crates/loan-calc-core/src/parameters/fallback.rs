//! Emergency parameters used only when the configured source cannot answer.

use chrono::Utc;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::{standard, CalculationParameters, OwnershipLtv, StandardValue};
use crate::engine::{resolve_ltv_ceiling, PropertyOwnershipStatus};
use crate::types::{BusinessPath, Percent};

pub const MORTGAGE_RATE: Percent = dec!(5.0);
pub const CREDIT_RATE: Percent = dec!(8.5);

pub const MAX_LTV: Percent = dec!(80);
pub const MAX_DTI: Percent = dec!(42);
pub const MIN_REFINANCE_SAVINGS: Percent = dec!(2);
pub const REFINANCE_MAX_LTV: Percent = dec!(80);
pub const CASH_OUT_MAX_LTV: Percent = dec!(75);

pub fn fallback_rate(path: BusinessPath) -> Percent {
    match path {
        BusinessPath::Mortgage | BusinessPath::MortgageRefinance => MORTGAGE_RATE,
        BusinessPath::Credit | BusinessPath::CreditRefinance => CREDIT_RATE,
    }
}

/// Full fallback parameter set for a path, flagged `is_fallback`.
pub fn parameters_for(path: BusinessPath) -> CalculationParameters {
    let property_ownership_ltvs = if path.is_secured() {
        PropertyOwnershipStatus::ALL
            .into_iter()
            .map(|status| {
                let ltv = resolve_ltv_ceiling(status);
                (
                    status,
                    OwnershipLtv {
                        ltv,
                        min_down_payment: dec!(100) - ltv,
                    },
                )
            })
            .collect()
    } else {
        BTreeMap::new()
    };

    let mut standards: BTreeMap<String, BTreeMap<String, StandardValue>> = BTreeMap::new();
    if path.is_secured() {
        standards.entry(standard::LTV.into()).or_default().insert(
            standard::MAX_LTV.into(),
            StandardValue::percentage(MAX_LTV, "Maximum LTV ratio"),
        );
    }
    standards.entry(standard::DTI.into()).or_default().insert(
        standard::MAX_DTI.into(),
        StandardValue::percentage(MAX_DTI, "Maximum DTI ratio"),
    );
    if matches!(
        path,
        BusinessPath::MortgageRefinance | BusinessPath::CreditRefinance
    ) {
        let refinance = standards.entry(standard::REFINANCE.into()).or_default();
        refinance.insert(
            standard::MIN_SAVINGS_PERCENT.into(),
            StandardValue::percentage(MIN_REFINANCE_SAVINGS, "Minimum monthly savings"),
        );
        if path.is_secured() {
            refinance.insert(
                standard::MAX_LTV.into(),
                StandardValue::percentage(REFINANCE_MAX_LTV, "Maximum LTV for rate-and-term"),
            );
            refinance.insert(
                standard::CASH_OUT_MAX_LTV.into(),
                StandardValue::percentage(CASH_OUT_MAX_LTV, "Maximum LTV with cash-out"),
            );
        }
    }

    CalculationParameters {
        business_path: path,
        current_interest_rate: fallback_rate(path),
        property_ownership_ltvs,
        standards,
        last_updated: Utc::now(),
        is_fallback: true,
    }
}
