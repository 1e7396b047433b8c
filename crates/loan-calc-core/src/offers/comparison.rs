use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::engine::annuity::number_of_payments;
use crate::engine::{calculate_monthly_payment, evaluate_dti, ltv};
use crate::error::LoanCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::validate::{require_non_negative, require_positive};
use crate::LoanCalcResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// A rate quoted by one bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankQuote {
    pub bank: String,
    pub interest_rate: Percent,
    /// Overrides the request term for this quote only.
    #[serde(default)]
    pub loan_term: Option<Years>,
    /// One-off fees added to the total cost.
    #[serde(default)]
    pub fees: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferComparisonInput {
    pub principal: Money,
    pub loan_term: Years,
    #[serde(default)]
    pub property_value: Option<Money>,
    #[serde(default)]
    pub monthly_income: Option<Money>,
    #[serde(default)]
    pub monthly_obligations: Money,
    #[serde(default = "default_max_ltv")]
    pub max_ltv: Percent,
    #[serde(default = "default_max_dti")]
    pub max_dti: Percent,
    pub quotes: Vec<BankQuote>,
}

fn default_max_ltv() -> Percent {
    dec!(80)
}

fn default_max_dti() -> Percent {
    dec!(42)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Eligible,
    Ineligible,
}

/// One priced offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankOffer {
    pub bank: String,
    pub interest_rate: Percent,
    pub loan_term: Years,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    /// Total payment plus fees.
    pub total_cost: Money,
    pub ltv_ratio: Option<Percent>,
    pub dti_ratio: Option<Percent>,
    pub approval_status: ApprovalStatus,
    pub ineligibility_reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferComparison {
    /// Cheapest monthly payment first; ties broken by bank name.
    pub offers: Vec<BankOffer>,
    pub best_offer: Option<String>,
    /// Dearest minus cheapest monthly payment.
    pub monthly_spread: Money,
    /// Highest minus lowest total cost.
    pub total_cost_spread: Money,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Price every quote for the same principal and rank them.
pub fn compare_offers(
    input: &OfferComparisonInput,
) -> LoanCalcResult<ComputationOutput<OfferComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_input(input)?;

    let ltv_ratio = input
        .property_value
        .map(|value| ltv::ltv_ratio(input.principal, value))
        .transpose()?;

    let mut offers = input
        .quotes
        .iter()
        .map(|quote| price_quote(input, quote, ltv_ratio))
        .collect::<LoanCalcResult<Vec<_>>>()?;

    offers.sort_by(|a, b| {
        a.monthly_payment
            .cmp(&b.monthly_payment)
            .then_with(|| a.bank.cmp(&b.bank))
    });

    let best_offer = offers
        .iter()
        .find(|o| o.approval_status == ApprovalStatus::Eligible)
        .map(|o| o.bank.clone());
    if best_offer.is_none() {
        warnings.push("No offer meets the LTV and DTI limits.".into());
    }
    if input.monthly_income.is_none() {
        warnings.push("No monthly income given: DTI not checked.".into());
    }

    let monthly_spread = spread(offers.iter().map(|o| o.monthly_payment));
    let total_cost_spread = spread(offers.iter().map(|o| o.total_cost));

    let output = OfferComparison {
        offers,
        best_offer,
        monthly_spread,
        total_cost_spread,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "principal": input.principal.to_string(),
        "loan_term": input.loan_term.to_string(),
        "max_ltv": input.max_ltv.to_string(),
        "max_dti": input.max_dti.to_string(),
    });

    Ok(with_metadata(
        "Side-by-side annuity pricing of bank quotes",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn price_quote(
    input: &OfferComparisonInput,
    quote: &BankQuote,
    ltv_ratio: Option<Percent>,
) -> LoanCalcResult<BankOffer> {
    require_non_negative("fees", quote.fees)?;
    let loan_term = quote.loan_term.unwrap_or(input.loan_term);
    let monthly_payment = calculate_monthly_payment(input.principal, quote.interest_rate, loan_term)?;
    let total_payment = monthly_payment * Decimal::from(number_of_payments(loan_term)?);

    let mut ineligibility_reasons = Vec::new();
    if let Some(ltv) = ltv_ratio {
        if ltv > input.max_ltv {
            ineligibility_reasons.push(format!(
                "LTV {}% exceeds maximum {}%",
                ltv.round_dp(1),
                input.max_ltv
            ));
        }
    }

    let dti_ratio = match input.monthly_income {
        Some(income) => {
            let eval = evaluate_dti(income, input.monthly_obligations, monthly_payment, input.max_dti)?;
            if !eval.approved {
                ineligibility_reasons.push(format!(
                    "DTI {}% exceeds maximum {}%",
                    eval.ratio.round_dp(1),
                    input.max_dti
                ));
            }
            Some(eval.ratio.round_dp(2))
        }
        None => None,
    };

    Ok(BankOffer {
        bank: quote.bank.clone(),
        interest_rate: quote.interest_rate,
        loan_term,
        monthly_payment,
        total_payment,
        total_interest: (total_payment - input.principal).max(Decimal::ZERO),
        total_cost: total_payment + quote.fees,
        ltv_ratio: ltv_ratio.map(|v| v.round_dp(2)),
        dti_ratio,
        approval_status: if ineligibility_reasons.is_empty() {
            ApprovalStatus::Eligible
        } else {
            ApprovalStatus::Ineligible
        },
        ineligibility_reasons,
    })
}

fn spread(values: impl Iterator<Item = Money>) -> Money {
    values
        .fold(None, |range: Option<(Money, Money)>, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .map(|(lo, hi)| hi - lo)
        .unwrap_or(Decimal::ZERO)
}

fn validate_input(input: &OfferComparisonInput) -> LoanCalcResult<()> {
    require_positive("principal", input.principal)?;
    require_non_negative("monthly_obligations", input.monthly_obligations)?;
    require_positive("max_ltv", input.max_ltv)?;
    require_positive("max_dti", input.max_dti)?;
    if input.quotes.is_empty() {
        return Err(LoanCalcError::invalid("quotes", "at least one bank quote is required"));
    }
    if let Some(quote) = input.quotes.iter().find(|q| q.bank.trim().is_empty()) {
        return Err(LoanCalcError::invalid(
            "quotes",
            format!("quote at {}% has no bank name", quote.interest_rate),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quote(bank: &str, rate: Decimal) -> BankQuote {
        BankQuote {
            bank: bank.to_string(),
            interest_rate: rate,
            loan_term: None,
            fees: Decimal::ZERO,
        }
    }

    fn request() -> OfferComparisonInput {
        OfferComparisonInput {
            principal: dec!(800_000),
            loan_term: dec!(20),
            property_value: Some(dec!(1_000_000)),
            monthly_income: Some(dec!(20_000)),
            monthly_obligations: Decimal::ZERO,
            max_ltv: dec!(80),
            max_dti: dec!(42),
            quotes: vec![
                quote("Mizrahi Bank", dec!(5.5)),
                quote("Bank Leumi", dec!(4.5)),
                quote("Discount Bank", dec!(5.0)),
            ],
        }
    }

    #[test]
    fn test_offers_sorted_by_payment() {
        let out = compare_offers(&request()).unwrap().result;
        let banks: Vec<&str> = out.offers.iter().map(|o| o.bank.as_str()).collect();
        assert_eq!(banks, vec!["Bank Leumi", "Discount Bank", "Mizrahi Bank"]);
        assert_eq!(out.offers[0].monthly_payment, dec!(5061));
        assert_eq!(out.offers[1].monthly_payment, dec!(5280));
        assert_eq!(out.offers[2].monthly_payment, dec!(5503));
        assert_eq!(out.monthly_spread, dec!(442));
        assert_eq!(out.best_offer.as_deref(), Some("Bank Leumi"));
    }

    #[test]
    fn test_offer_record_fields() {
        let out = compare_offers(&request()).unwrap().result;
        let discount = &out.offers[1];
        assert_eq!(discount.total_payment, dec!(5280) * dec!(240));
        assert_eq!(discount.ltv_ratio, Some(dec!(80)));
        assert_eq!(discount.dti_ratio, Some(dec!(26.4)));
        assert_eq!(discount.approval_status, ApprovalStatus::Eligible);
    }

    #[test]
    fn test_ties_break_on_bank_name() {
        let input = OfferComparisonInput {
            quotes: vec![quote("Zeta", dec!(5)), quote("Alpha", dec!(5))],
            ..request()
        };
        let out = compare_offers(&input).unwrap().result;
        assert_eq!(out.offers[0].bank, "Alpha");
        assert_eq!(out.monthly_spread, Decimal::ZERO);
    }

    #[test]
    fn test_dti_makes_offers_ineligible() {
        let input = OfferComparisonInput {
            monthly_income: Some(dec!(12_500)),
            ..request()
        };
        let out = compare_offers(&input).unwrap().result;
        // 5061 / 12500 = 40.5% passes, 5280 / 12500 = 42.2% does not
        assert_eq!(out.offers[0].approval_status, ApprovalStatus::Eligible);
        assert_eq!(out.offers[1].approval_status, ApprovalStatus::Ineligible);
        assert_eq!(out.best_offer.as_deref(), Some("Bank Leumi"));
    }

    #[test]
    fn test_no_eligible_offer_warns() {
        let input = OfferComparisonInput {
            property_value: Some(dec!(900_000)),
            ..request()
        };
        let out = compare_offers(&input).unwrap();
        assert!(out.result.best_offer.is_none());
        assert!(out.result.offers[0].ineligibility_reasons[0].starts_with("LTV 88.9%"));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_fees_and_term_override() {
        let mut cheap_but_fees = quote("Bank Hapoalim", dec!(4.5));
        cheap_but_fees.fees = dec!(50_000);
        let mut longer = quote("Bank Leumi", dec!(5));
        longer.loan_term = Some(dec!(25));
        let input = OfferComparisonInput {
            quotes: vec![cheap_but_fees, longer],
            ..request()
        };
        let out = compare_offers(&input).unwrap().result;
        let leumi = out.offers.iter().find(|o| o.bank == "Bank Leumi").unwrap();
        assert_eq!(leumi.loan_term, dec!(25));
        let hapoalim = out.offers.iter().find(|o| o.bank == "Bank Hapoalim").unwrap();
        assert_eq!(hapoalim.total_cost, hapoalim.total_payment + dec!(50_000));
    }

    #[test]
    fn test_empty_quotes_rejected() {
        let input = OfferComparisonInput {
            quotes: Vec::new(),
            ..request()
        };
        match compare_offers(&input).unwrap_err() {
            LoanCalcError::InvalidArgument { field, .. } => assert_eq!(field, "quotes"),
            other => panic!("Expected InvalidArgument, got {other:?}"),
        }
    }
}
