//! Company-name matching for identity-fraud screening.
//!
//! VIES reports the registered legal name behind a VAT number. When the
//! user knows who they expect to be dealing with, the two names are
//! compared with three fuzzy metrics and the best score decides:
//!
//! | Score | Status |
//! |-------|--------|
//! | > 60 | Verified |
//! | 20–60 | Check Manually |
//! | < 20 | Potential Fraud |
//!
//! Legal names drift from trading names in different ways (a missing
//! "A/S", reordered words, extra boilerplate), and each metric covers
//! one of them, so the maximum is taken rather than any single metric.

mod similarity;

pub use similarity::{partial_ratio, process, ratio, token_set_ratio, token_sort_ratio};

use crate::core::{FraudAssessment, FraudStatus};

/// Lower bound (exclusive) for `Verified`.
pub const VERIFIED_ABOVE: u8 = 60;
/// Lower bound (inclusive) for `CheckManually`.
pub const CHECK_MANUALLY_FROM: u8 = 20;

/// Best of token-set, partial and token-sort similarity, 0–100.
pub fn score_names(remote: &str, expected: &str) -> u8 {
    token_set_ratio(remote, expected)
        .max(partial_ratio(remote, expected))
        .max(token_sort_ratio(remote, expected))
}

/// Map a score to its status.
pub fn classify(score: u8) -> FraudStatus {
    if score > VERIFIED_ABOVE {
        FraudStatus::Verified
    } else if score >= CHECK_MANUALLY_FROM {
        FraudStatus::CheckManually
    } else {
        FraudStatus::PotentialFraud
    }
}

/// Score and classify, if both names are present.
///
/// Returns `None` when either side is missing or blank; VIES hides names
/// for some member states, and no assessment is better than a false alarm.
pub fn assess(remote: Option<&str>, expected: Option<&str>) -> Option<FraudAssessment> {
    let remote = remote.map(str::trim).filter(|s| !s.is_empty() && *s != "---")?;
    let expected = expected.map(str::trim).filter(|s| !s.is_empty())?;
    let score = score_names(remote, expected);
    Some(FraudAssessment {
        score,
        status: classify(score),
    })
}
