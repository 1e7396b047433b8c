use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::engine::calculate_monthly_payment;
use crate::types::{Money, Percent, Years};
use crate::LoanCalcResult;

// ---------------------------------------------------------------------------
// Credit score tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditRiskLevel {
    Poor,
    Fair,
    Good,
    Excellent,
}

/// Score thresholds. Below `minimum` the applicant is declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditScoreTiers {
    pub minimum: u32,
    pub good: u32,
    pub excellent: u32,
}

impl CreditScoreTiers {
    pub const MORTGAGE: CreditScoreTiers = CreditScoreTiers {
        minimum: 620,
        good: 670,
        excellent: 740,
    };

    /// Unsecured credit asks for more before a score counts as good.
    pub const CREDIT: CreditScoreTiers = CreditScoreTiers {
        minimum: 620,
        good: 680,
        excellent: 750,
    };

    /// Refinancing an existing mortgage accepts a lower floor.
    pub const MORTGAGE_REFINANCE: CreditScoreTiers = CreditScoreTiers {
        minimum: 580,
        good: 670,
        excellent: 740,
    };

    pub fn classify(&self, score: u32) -> CreditRiskLevel {
        if score < self.minimum {
            CreditRiskLevel::Poor
        } else if score < self.good {
            CreditRiskLevel::Fair
        } else if score < self.excellent {
            CreditRiskLevel::Good
        } else {
            CreditRiskLevel::Excellent
        }
    }

    pub fn is_acceptable(&self, score: u32) -> bool {
        score >= self.minimum
    }
}

// ---------------------------------------------------------------------------
// Bank recommendations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecommendation {
    pub bank: String,
    pub rate: Percent,
    /// Payment at `rate`, priced through the annuity engine.
    pub monthly_payment: Money,
    pub reason: String,
}

/// One bank quote relative to the applicant's base rate.
#[derive(Debug, Clone, Copy)]
pub struct BankQuoteRule {
    pub bank: &'static str,
    pub rate_adjustment: Percent,
    pub reason: &'static str,
}

/// Two quote sets: a discounted one for premium applicants and a standard one
/// for anyone at or above `standard_min_score`. Everyone else gets none.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationTable {
    pub premium: [BankQuoteRule; 2],
    pub standard: [BankQuoteRule; 2],
    pub standard_min_score: u32,
}

pub const MORTGAGE_BANKS: RecommendationTable = RecommendationTable {
    premium: [
        BankQuoteRule {
            bank: "Bank Hapoalim",
            rate_adjustment: dec!(-0.2),
            reason: "Excellent credit profile",
        },
        BankQuoteRule {
            bank: "Bank Leumi",
            rate_adjustment: dec!(-0.1),
            reason: "Low LTV ratio",
        },
    ],
    standard: [
        BankQuoteRule {
            bank: "Discount Bank",
            rate_adjustment: dec!(0),
            reason: "Standard terms",
        },
        BankQuoteRule {
            bank: "Mizrahi Bank",
            rate_adjustment: dec!(0.1),
            reason: "Competitive rates",
        },
    ],
    standard_min_score: 670,
};

pub const CREDIT_BANKS: RecommendationTable = RecommendationTable {
    premium: [
        BankQuoteRule {
            bank: "Bank Hapoalim",
            rate_adjustment: dec!(-0.5),
            reason: "Excellent credit profile",
        },
        BankQuoteRule {
            bank: "Bank Leumi",
            rate_adjustment: dec!(-0.3),
            reason: "Low DTI ratio",
        },
    ],
    standard: [
        BankQuoteRule {
            bank: "Discount Bank",
            rate_adjustment: dec!(0),
            reason: "Standard terms",
        },
        BankQuoteRule {
            bank: "Mizrahi Bank",
            rate_adjustment: dec!(0.2),
            reason: "Competitive rates",
        },
    ],
    standard_min_score: 680,
};

pub const MORTGAGE_REFINANCE_BANKS: RecommendationTable = RecommendationTable {
    premium: [
        BankQuoteRule {
            bank: "Bank Hapoalim",
            rate_adjustment: dec!(-0.2),
            reason: "Excellent refinance profile",
        },
        BankQuoteRule {
            bank: "Bank Leumi",
            rate_adjustment: dec!(-0.1),
            reason: "Low LTV refinance",
        },
    ],
    standard: [
        BankQuoteRule {
            bank: "Discount Bank",
            rate_adjustment: dec!(0),
            reason: "Standard refinance terms",
        },
        BankQuoteRule {
            bank: "Mizrahi Bank",
            rate_adjustment: dec!(0.1),
            reason: "Competitive refinance rates",
        },
    ],
    standard_min_score: 670,
};

pub const CREDIT_REFINANCE_BANKS: RecommendationTable = RecommendationTable {
    premium: [
        BankQuoteRule {
            bank: "Bank Hapoalim",
            rate_adjustment: dec!(-0.5),
            reason: "Excellent credit refinance profile",
        },
        BankQuoteRule {
            bank: "Bank Leumi",
            rate_adjustment: dec!(-0.3),
            reason: "Low DTI ratio",
        },
    ],
    standard: [
        BankQuoteRule {
            bank: "Discount Bank",
            rate_adjustment: dec!(0),
            reason: "Standard refinance terms",
        },
        BankQuoteRule {
            bank: "Mizrahi Bank",
            rate_adjustment: dec!(0.2),
            reason: "Competitive refinance rates",
        },
    ],
    standard_min_score: 680,
};

impl RecommendationTable {
    /// Quotes for an approved applicant, each priced for `principal` over
    /// `term_years`. Adjusted rates never go below zero.
    pub fn recommend(
        &self,
        premium: bool,
        credit_score: u32,
        base_rate: Percent,
        principal: Money,
        term_years: Years,
    ) -> LoanCalcResult<Vec<BankRecommendation>> {
        let rules: &[BankQuoteRule] = if premium {
            &self.premium
        } else if credit_score >= self.standard_min_score {
            &self.standard
        } else {
            &[]
        };

        rules
            .iter()
            .map(|rule| {
                let rate = (base_rate + rule.rate_adjustment).max(Decimal::ZERO);
                Ok(BankRecommendation {
                    bank: rule.bank.to_string(),
                    rate,
                    monthly_payment: calculate_monthly_payment(principal, rate, term_years)?,
                    reason: rule.reason.to_string(),
                })
            })
            .collect()
    }
}
