//! Bank quote comparison.

pub mod comparison;

pub use comparison::{
    compare_offers, ApprovalStatus, BankOffer, BankQuote, OfferComparison, OfferComparisonInput,
};
