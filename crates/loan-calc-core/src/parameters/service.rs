use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::{fallback, CalculationParameters, ParameterCache, ParameterSource};
use crate::engine::{
    calculate_monthly_payment, calculate_period_from_payment, calculate_remaining_balance,
    resolve_ltv_ceiling, PropertyOwnershipStatus,
};
use crate::error::LoanCalcError;
use crate::types::{BusinessPath, Money, Percent, Years};
use crate::validate::{require_non_negative, require_positive};
use crate::LoanCalcResult;

/// Resolves parameters for each business path and prices loans with them.
///
/// Lookup order is cache, then source, then the fallback table. Fallback
/// parameters are never cached, so the next lookup retries the source.
pub struct CalculationService<S> {
    source: S,
    cache: ParameterCache,
}

impl<S: ParameterSource> CalculationService<S> {
    pub fn new(source: S) -> Self {
        Self::with_cache(source, ParameterCache::default())
    }

    pub fn with_cache(source: S, cache: ParameterCache) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &ParameterCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// All parameters for a path. Never fails: a source error yields the
    /// fallback set with `is_fallback` raised.
    pub fn parameters(&mut self, path: BusinessPath) -> CalculationParameters {
        self.parameters_at(path, Utc::now())
    }

    pub fn parameters_at(&mut self, path: BusinessPath, now: DateTime<Utc>) -> CalculationParameters {
        if let Some(cached) = self.cache.get(path, now) {
            debug!(%path, "parameter cache hit");
            return cached.clone();
        }
        debug!(%path, "parameter cache miss");

        match self
            .source
            .fetch(path)
            .and_then(|params| params.validate(path).map(|_| params))
        {
            Ok(params) => {
                self.cache.insert(path, params.clone(), now);
                params
            }
            Err(err) => {
                warn!(%path, error = %err, "parameter source failed, using fallback values");
                fallback::parameters_for(path)
            }
        }
    }

    pub fn current_rate(&mut self, path: BusinessPath) -> Percent {
        self.parameters(path).current_interest_rate
    }

    /// LTV ceiling from the path's table, or the fixed policy ceiling when
    /// the table has no entry for `status`.
    pub fn property_ownership_ltv(
        &mut self,
        status: PropertyOwnershipStatus,
        path: BusinessPath,
    ) -> Percent {
        self.parameters(path)
            .ownership_ltv(status)
            .unwrap_or_else(|| resolve_ltv_ceiling(status))
    }

    pub fn standard_value(
        &mut self,
        category: &str,
        name: &str,
        path: BusinessPath,
    ) -> Option<Decimal> {
        self.parameters(path).standard(category, name)
    }

    /// Monthly payment on `property_value - initial_payment` at the mortgage
    /// rate, or at `rate_override` when given.
    pub fn mortgage_payment(
        &mut self,
        property_value: Money,
        initial_payment: Money,
        term_years: Years,
        rate_override: Option<Percent>,
    ) -> LoanCalcResult<Money> {
        let principal = financed_amount(property_value, initial_payment)?;
        let rate = match rate_override {
            Some(rate) => rate,
            None => self.current_rate(BusinessPath::Mortgage),
        };
        calculate_monthly_payment(principal, rate, term_years)
    }

    pub fn credit_payment(
        &mut self,
        amount: Money,
        term_years: Years,
        rate_override: Option<Percent>,
    ) -> LoanCalcResult<Money> {
        let rate = match rate_override {
            Some(rate) => rate,
            None => self.current_rate(BusinessPath::Credit),
        };
        calculate_monthly_payment(amount, rate, term_years)
    }

    /// Simple-interest projection of a mortgage balance at the mortgage rate.
    pub fn remaining_mortgage(&mut self, amount: Money, years: Years) -> LoanCalcResult<Money> {
        let rate = self.current_rate(BusinessPath::Mortgage);
        calculate_remaining_balance(amount, years, rate)
    }

    /// Whole-year term for a target payment at the mortgage rate.
    pub fn loan_period(
        &mut self,
        property_value: Money,
        initial_payment: Money,
        monthly_payment: Money,
    ) -> LoanCalcResult<Years> {
        let principal = financed_amount(property_value, initial_payment)?;
        let rate = self.current_rate(BusinessPath::Mortgage);
        calculate_period_from_payment(principal, monthly_payment, rate)
    }
}

fn financed_amount(property_value: Money, initial_payment: Money) -> LoanCalcResult<Money> {
    require_positive("property_value", property_value)?;
    require_non_negative("initial_payment", initial_payment)?;
    if initial_payment >= property_value {
        return Err(LoanCalcError::invalid(
            "initial_payment",
            "must be less than the property value",
        ));
    }
    Ok(property_value - initial_payment)
}
