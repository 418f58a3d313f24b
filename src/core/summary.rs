use super::types::{ErrorType, ValidationResult};
use serde::{Deserialize, Serialize};

/// Per-category counters for a finished (or interrupted) batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub service_unavailable: usize,
    pub format_errors: usize,
}

impl BatchSummary {
    /// Count results by error type.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ValidationResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total += 1;
            match result.error_type {
                ErrorType::None => summary.valid += 1,
                ErrorType::Invalid => summary.invalid += 1,
                ErrorType::ServiceUnavailable => summary.service_unavailable += 1,
                ErrorType::FormatError => summary.format_errors += 1,
            }
        }
        summary
    }

    /// Rows that should be re-run once VIES recovers.
    pub fn needs_retry(&self) -> bool {
        self.service_unavailable > 0
    }
}
