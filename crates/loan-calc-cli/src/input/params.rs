//! Parameter sources backed by a local YAML or JSON file.
//!
//! The file holds a list of parameter sets, one per business path:
//!
//! ```yaml
//! - business_path: mortgage
//!   current_interest_rate: "4.8"
//!   standards:
//!     ltv:
//!       max_ltv: { value: "80", type: percentage }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use loan_calc_core::parameters::{CalculationParameters, ParameterSource};
use loan_calc_core::{BusinessPath, LoanCalcError, LoanCalcResult};

/// Re-reads its file on every fetch; the service cache keeps that rare.
#[derive(Debug, Clone)]
pub struct FileParameterSource {
    path: PathBuf,
}

impl FileParameterSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> LoanCalcResult<Vec<CalculationParameters>> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            LoanCalcError::ParameterSource(format!(
                "failed to read '{}': {e}",
                self.path.display()
            ))
        })?;
        parse_parameters(&contents, is_json(&self.path)).map_err(|reason| {
            LoanCalcError::ParameterSource(format!(
                "failed to parse '{}': {reason}",
                self.path.display()
            ))
        })
    }
}

impl ParameterSource for FileParameterSource {
    fn fetch(&self, path: BusinessPath) -> LoanCalcResult<CalculationParameters> {
        debug!(file = %self.path.display(), %path, "loading parameters");
        self.load()?
            .into_iter()
            .find(|p| p.business_path == path)
            .ok_or_else(|| {
                LoanCalcError::ParameterSource(format!(
                    "'{}' has no parameters for {path}",
                    self.path.display()
                ))
            })
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn parse_parameters(contents: &str, json: bool) -> Result<Vec<CalculationParameters>, String> {
    if json {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }
}
