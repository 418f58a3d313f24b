//! Retrying verification of one row.

use super::breaker::CircuitBreaker;
use super::client::{LookupOutcome, VatLookup, ViesError};
use crate::core::{EngineConfig, ValidationResult, ValidationRow};
use crate::vat::{clean_vat_number, validate_vat_format};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Where the verifier waits. Swap in [`NoDelay`] for tests.
#[async_trait]
pub trait DelayStrategy: Send + Sync {
    /// Courtesy pause before every remote call.
    async fn before_call(&self);
    /// Pause after failed attempt number `attempt` (1-based).
    async fn between_attempts(&self, attempt: u32);
}

/// Fixed sleeps on the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    pub courtesy: Duration,
    pub retry: Duration,
}

impl FixedDelay {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            courtesy: config.courtesy_delay(),
            retry: config.retry_delay(),
        }
    }
}

#[async_trait]
impl DelayStrategy for FixedDelay {
    async fn before_call(&self) {
        tokio::time::sleep(self.courtesy).await;
    }

    async fn between_attempts(&self, _attempt: u32) {
        tokio::time::sleep(self.retry).await;
    }
}

/// No waiting at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl DelayStrategy for NoDelay {
    async fn before_call(&self) {}
    async fn between_attempts(&self, _attempt: u32) {}
}

/// What one endpoint call contributed to the current attempt.
enum Step {
    Done(ValidationResult),
    Failed(String),
}

/// Runs the parse → format → remote pipeline for one row.
pub struct Verifier<L> {
    lookup: L,
    breaker: Arc<CircuitBreaker>,
    delay: Arc<dyn DelayStrategy>,
    max_retries: u32,
    authenticated: bool,
}

impl<L: VatLookup> Verifier<L> {
    pub fn new(lookup: L, config: &EngineConfig) -> Self {
        Self {
            lookup,
            breaker: Arc::new(CircuitBreaker::new(
                config.max_retries,
                config.breaker_threshold,
                config.breaker_reduced_budget,
            )),
            delay: Arc::new(FixedDelay::from_config(config)),
            max_retries: config.max_retries.max(1),
            authenticated: config.authenticated,
        }
    }

    pub fn with_delay(mut self, delay: impl DelayStrategy + 'static) -> Self {
        self.delay = Arc::new(delay);
        self
    }

    /// Share a breaker between verifiers.
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Verify one row. Never fails: every path ends in a result.
    ///
    /// Malformed rows come back as `format_error` with zero attempts.
    /// Otherwise up to `min(max_retries, breaker budget)` attempts are made;
    /// each tries the authenticated endpoint (if a requester is known) and
    /// then the anonymous one. Exhaustion yields `service_unavailable`.
    pub async fn verify(&self, row: &ValidationRow) -> ValidationResult {
        let (Some(country), Some(number)) = (row.country.as_deref(), row.number.as_deref()) else {
            let reason = clean_vat_number(&row.vat)
                .err()
                .map(|e| e.reason)
                .unwrap_or_else(|| "missing or invalid country code".into());
            return ValidationResult::format_error(row, reason, 0);
        };
        if let Err(e) = validate_vat_format(country, number) {
            return ValidationResult::format_error(row, e.reason, 0);
        }

        let budget = self.max_retries.min(self.breaker.budget(country)).max(1);
        let mut use_auth = self.authenticated && row.requester.is_some();
        let mut last_error = String::new();

        for attempt in 1..=budget {
            if use_auth {
                if let Some(requester) = &row.requester {
                    self.delay.before_call().await;
                    let outcome = self
                        .lookup
                        .check_authenticated(country, number, requester)
                        .await;
                    match outcome {
                        Ok(LookupOutcome::RequesterRejected(code)) => {
                            tracing::warn!(row = row.index, %code, "requester VAT rejected, using anonymous lookup");
                            use_auth = false;
                        }
                        other => match settle(row, attempt, other) {
                            Step::Done(result) => {
                                self.breaker.record_outcome(country, true);
                                return result;
                            }
                            Step::Failed(reason) => {
                                tracing::debug!(row = row.index, %reason, "authenticated lookup failed, falling back");
                            }
                        },
                    }
                }
            }

            self.delay.before_call().await;
            let outcome = self.lookup.check_anonymous(country, number).await;
            match settle(row, attempt, outcome) {
                Step::Done(result) => {
                    self.breaker.record_outcome(country, true);
                    return result;
                }
                Step::Failed(reason) => last_error = reason,
            }
            // Both endpoints failed: one failed attempt.
            self.breaker.record_outcome(country, false);

            if attempt < budget {
                tracing::warn!(
                    row = row.index,
                    %country,
                    attempt,
                    budget,
                    reason = %last_error,
                    "VIES unavailable, retrying"
                );
                self.delay.between_attempts(attempt).await;
            }
        }

        tracing::warn!(row = row.index, %country, attempts = budget, reason = %last_error, "giving up on row");
        ValidationResult::service_unavailable(
            row,
            format!("{last_error} after {budget} attempts"),
            budget,
        )
    }
}

fn settle(row: &ValidationRow, attempt: u32, outcome: Result<LookupOutcome, ViesError>) -> Step {
    match outcome {
        Ok(LookupOutcome::Valid(record)) => Step::Done(ValidationResult::valid(row, record, attempt)),
        Ok(LookupOutcome::Invalid { record, code }) => {
            Step::Done(ValidationResult::invalid(row, record, code, attempt))
        }
        Ok(LookupOutcome::Malformed(code)) => Step::Done(ValidationResult::format_error(row, code, attempt)),
        Ok(LookupOutcome::RequesterRejected(code) | LookupOutcome::Transient(code)) => Step::Failed(code),
        Err(e) => Step::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CompanyRecord, ErrorType, Requester, Validity};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    type Reply = Result<LookupOutcome, ViesError>;

    #[derive(Default)]
    struct Scripted {
        anonymous: Mutex<VecDeque<Reply>>,
        authenticated: Mutex<VecDeque<Reply>>,
        anonymous_calls: AtomicU32,
        authenticated_calls: AtomicU32,
    }

    impl Scripted {
        fn anonymous(replies: Vec<Reply>) -> Self {
            Self {
                anonymous: Mutex::new(replies.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl VatLookup for Scripted {
        async fn check_anonymous(&self, _country: &str, _number: &str) -> Reply {
            self.anonymous_calls.fetch_add(1, Ordering::SeqCst);
            self.anonymous
                .lock()
                .pop_front()
                .unwrap_or(Ok(LookupOutcome::Transient("MS_UNAVAILABLE".into())))
        }

        async fn check_authenticated(
            &self,
            _country: &str,
            _number: &str,
            _requester: &Requester,
        ) -> Reply {
            self.authenticated_calls.fetch_add(1, Ordering::SeqCst);
            self.authenticated
                .lock()
                .pop_front()
                .unwrap_or(Ok(LookupOutcome::Transient("MS_UNAVAILABLE".into())))
        }
    }

    fn row(vat: &str) -> ValidationRow {
        let parsed = clean_vat_number(vat).ok();
        ValidationRow {
            index: 0,
            raw: vat.into(),
            vat: vat.into(),
            country: parsed.as_ref().map(|p| p.country.clone()),
            number: parsed.map(|p| p.number),
            requester: None,
            expected_name: None,
        }
    }

    fn verifier(lookup: Scripted) -> Verifier<Scripted> {
        Verifier::new(lookup, &EngineConfig::default()).with_delay(NoDelay)
    }

    fn named(name: &str) -> CompanyRecord {
        CompanyRecord {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn malformed_row_makes_no_call() {
        let v = verifier(Scripted::default());
        let result = v.verify(&row("12345678")).await;
        assert_eq!(result.error_type, ErrorType::FormatError);
        assert_eq!(result.attempts, 0);
        assert_eq!(v.lookup.anonymous_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_length_is_format_error() {
        let v = verifier(Scripted::default());
        let result = v.verify(&row("DK1234567")).await;
        assert_eq!(result.error_type, ErrorType::FormatError);
        assert!(result.error_detail.unwrap().contains("DK"));
    }

    #[tokio::test]
    async fn transient_then_valid() {
        let v = verifier(Scripted::anonymous(vec![
            Ok(LookupOutcome::Transient("MS_MAX_CONCURRENT_REQ".into())),
            Ok(LookupOutcome::Valid(named("LEGO A/S"))),
        ]));
        let result = v.verify(&row("DK47458714")).await;
        assert_eq!(result.valid, Validity::Valid);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.name.as_deref(), Some("LEGO A/S"));
        assert_eq!(v.breaker().consecutive_failures("DK"), 0);
    }

    #[tokio::test]
    async fn exhausted_retries_are_unknown_not_invalid() {
        let v = verifier(Scripted::default());
        let result = v.verify(&row("DK47458714")).await;
        assert_eq!(result.error_type, ErrorType::ServiceUnavailable);
        assert_eq!(result.valid, Validity::Unknown);
        assert_eq!(result.attempts, 3);
        assert!(result.error_detail.unwrap().contains("MS_UNAVAILABLE"));
        assert_eq!(v.lookup.anonymous_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn network_errors_are_transient() {
        let v = verifier(Scripted::anonymous(vec![
            Err(ViesError::Timeout),
            Err(ViesError::Network("reset".into())),
            Err(ViesError::Http {
                status: 503,
                body: String::new(),
            }),
        ]));
        let result = v.verify(&row("DK47458714")).await;
        assert_eq!(result.error_type, ErrorType::ServiceUnavailable);
    }

    #[tokio::test]
    async fn definitive_invalid_is_not_retried() {
        let v = verifier(Scripted::anonymous(vec![Ok(LookupOutcome::Invalid {
            record: CompanyRecord::default(),
            code: "INVALID".into(),
        })]));
        let result = v.verify(&row("DK99999999")).await;
        assert_eq!(result.error_type, ErrorType::Invalid);
        assert_eq!(result.valid, Validity::Invalid);
        assert_eq!(result.attempts, 1);
        assert_eq!(v.lookup.anonymous_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn remote_malformed_is_format_error() {
        let v = verifier(Scripted::anonymous(vec![Ok(LookupOutcome::Malformed(
            "INVALID_INPUT".into(),
        ))]));
        let result = v.verify(&row("DK47458714")).await;
        assert_eq!(result.error_type, ErrorType::FormatError);
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn authenticated_success_keeps_consultation_id() {
        let lookup = Scripted::default();
        lookup.authenticated.lock().push_back(Ok(LookupOutcome::Valid(CompanyRecord {
            consultation_id: Some("WAPI123".into()),
            ..Default::default()
        })));
        let v = verifier(lookup);
        let mut r = row("DK47458714");
        r.requester = Some(Requester {
            country: "DK".into(),
            number: "13598562".into(),
        });
        let result = v.verify(&r).await;
        assert_eq!(result.consultation_id.as_deref(), Some("WAPI123"));
        assert_eq!(v.lookup.anonymous_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn authenticated_failure_falls_back_to_anonymous() {
        let lookup = Scripted::anonymous(vec![Ok(LookupOutcome::Valid(named("LEGO A/S")))]);
        lookup
            .authenticated
            .lock()
            .push_back(Ok(LookupOutcome::Transient("SERVICE_UNAVAILABLE".into())));
        let v = verifier(lookup);
        let mut r = row("DK47458714");
        r.requester = Some(Requester {
            country: "DK".into(),
            number: "13598562".into(),
        });
        let result = v.verify(&r).await;
        assert_eq!(result.valid, Validity::Valid);
        assert!(result.consultation_id.is_none());
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn rejected_requester_stops_authenticated_attempts() {
        let lookup = Scripted::anonymous(vec![
            Ok(LookupOutcome::Transient("TIMEOUT".into())),
            Ok(LookupOutcome::Valid(CompanyRecord::default())),
        ]);
        lookup.authenticated.lock().push_back(Ok(LookupOutcome::RequesterRejected(
            "INVALID_REQUESTER_INFO".into(),
        )));
        let v = verifier(lookup);
        let mut r = row("DK47458714");
        r.requester = Some(Requester {
            country: "DK".into(),
            number: "00000000".into(),
        });
        let result = v.verify(&r).await;
        assert_eq!(result.valid, Validity::Valid);
        assert_eq!(v.lookup.authenticated_calls.load(Ordering::SeqCst), 1);
        assert_eq!(v.lookup.anonymous_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn degraded_country_gets_reduced_budget() {
        let config = EngineConfig {
            breaker_threshold: 3,
            ..Default::default()
        };
        let v = Verifier::new(Scripted::default(), &config).with_delay(NoDelay);
        // First row burns 3 attempts and trips the breaker.
        let first = v.verify(&row("DK47458714")).await;
        assert_eq!(first.attempts, 3);
        assert!(v.breaker().is_degraded("DK"));

        let second = v.verify(&row("DK13598562")).await;
        assert_eq!(second.attempts, 1);
        assert_eq!(second.error_type, ErrorType::ServiceUnavailable);

        // Other countries keep the full budget.
        let other = v.verify(&row("SE556074308901")).await;
        assert_eq!(other.attempts, 3);
    }

    #[tokio::test]
    async fn authenticated_row_counts_one_failure_per_attempt() {
        let v = verifier(Scripted::default());
        let mut r = row("DK47458714");
        r.requester = Some(Requester {
            country: "DK".into(),
            number: "13598562".into(),
        });
        let result = v.verify(&r).await;
        assert_eq!(result.attempts, 3);
        assert_eq!(v.lookup.authenticated_calls.load(Ordering::SeqCst), 3);
        assert_eq!(v.lookup.anonymous_calls.load(Ordering::SeqCst), 3);
        assert_eq!(v.breaker().consecutive_failures("DK"), 3);
        assert!(!v.breaker().is_degraded("DK"));
    }

    #[tokio::test]
    async fn anonymous_fallback_success_counts_as_success() {
        let lookup = Scripted::anonymous(vec![Ok(LookupOutcome::Valid(named("LEGO A/S")))]);
        let v = verifier(lookup);
        v.breaker().record_outcome("DK", false);
        let mut r = row("DK47458714");
        r.requester = Some(Requester {
            country: "DK".into(),
            number: "13598562".into(),
        });
        assert_eq!(v.verify(&r).await.valid, Validity::Valid);
        assert_eq!(v.breaker().consecutive_failures("DK"), 0);
    }
}
