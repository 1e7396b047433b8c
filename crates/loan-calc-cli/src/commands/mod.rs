pub mod assessment;
pub mod engine;
pub mod offers;
pub mod parameters;
pub mod refinance;

use chrono::Duration;
use tracing::debug;

use loan_calc_core::parameters::{
    fallback, CalculationParameters, CalculationService, ParameterCache, ParameterSource,
    StaticParameterSource,
};
use loan_calc_core::BusinessPath;

use crate::input::params::FileParameterSource;

pub type Service = CalculationService<Box<dyn ParameterSource>>;

/// State shared by every subcommand.
pub struct Context {
    pub service: Service,
}

impl Context {
    /// Service over the `--params` file, or over the built-in table when no
    /// file is configured.
    pub fn new(params_file: Option<&str>, cache_ttl_secs: i64) -> Self {
        let source: Box<dyn ParameterSource> = match params_file {
            Some(path) => {
                debug!(path, "using parameter file");
                Box::new(FileParameterSource::new(path))
            }
            None => Box::new(StaticParameterSource::new(
                BusinessPath::ALL.map(builtin_parameters),
            )),
        };
        let cache = ParameterCache::new(Duration::seconds(cache_ttl_secs.max(0)));
        Self {
            service: CalculationService::with_cache(source, cache),
        }
    }
}

/// The fallback table served as regular parameters: nothing failed, so the
/// sets are not flagged as fallbacks.
fn builtin_parameters(path: BusinessPath) -> CalculationParameters {
    CalculationParameters {
        is_fallback: false,
        ..fallback::parameters_for(path)
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> Context {
    Context::new(None, 300)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_context_uses_builtin_rates() {
        let mut ctx = test_context();
        assert_eq!(ctx.service.current_rate(BusinessPath::Mortgage), dec!(5.0));
        assert_eq!(ctx.service.current_rate(BusinessPath::Credit), dec!(8.5));
        assert_eq!(ctx.service.cache().len(), 2);
    }

    #[test]
    fn test_builtin_parameters_are_not_flagged_as_fallback() {
        let mut ctx = test_context();
        for path in BusinessPath::ALL {
            assert!(!ctx.service.parameters(path).is_fallback, "{path}");
        }
    }

    #[test]
    fn test_negative_ttl_is_clamped() {
        let ctx = Context::new(None, -5);
        assert_eq!(ctx.service.cache().ttl(), Duration::zero());
    }
}
