//! # Forecast
//!
//! Stage probability table and expected revenue derivation.
//!
//! All arithmetic is integral: `expected = value * probability / 100`,
//! saturating at the `i64` bounds.

use crate::types::Stage;

/// Win probability (percent) of an opportunity at `stage`.
#[must_use]
pub const fn probability(stage: Stage) -> i64 {
    match stage {
        Stage::Qualification => 10,
        Stage::NeedsAnalysis => 20,
        Stage::ValueProposition => 40,
        Stage::IdentifyDecisionMakers => 60,
        Stage::ProposalPriceQuote => 80,
        Stage::NegotiationReview => 90,
        Stage::ClosedWon => 100,
        Stage::ClosedLost => 0,
        Stage::SowCreation => 95,
        Stage::SowAccepted => 100,
        Stage::ProjectKickoff => 100,
    }
}

/// Weighted revenue for `value` at `probability` percent.
#[must_use]
pub fn expected_revenue(value: i64, probability: i64) -> i64 {
    value.saturating_mul(probability) / 100
}

/// Probability and expected revenue for `value` at `stage`.
#[must_use]
pub fn forecast(stage: Stage, value: i64) -> (i64, i64) {
    let p = probability(stage);
    (p, expected_revenue(value, p))
}
