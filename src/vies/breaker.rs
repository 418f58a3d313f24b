use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct CountryState {
    consecutive_failures: u32,
    budget: u32,
}

/// Per-country retry budget that shrinks after repeated transient failures.
///
/// # Behaviour
///
/// - Every country starts with the full budget.
/// - Each transient failure increments the country's counter; at
///   `threshold` consecutive failures the budget drops to `reduced_budget`.
/// - Any success resets the counter and restores the full budget. The
///   counter never decays on its own.
/// - State covers one batch: [`reset`](Self::reset) starts over.
///
/// One lock guards all countries. Critical sections are a map lookup, so
/// countries do not wait on each other's network calls.
#[derive(Debug)]
pub struct CircuitBreaker {
    max_budget: u32,
    threshold: u32,
    reduced_budget: u32,
    states: Mutex<HashMap<String, CountryState>>,
}

impl CircuitBreaker {
    pub fn new(max_budget: u32, threshold: u32, reduced_budget: u32) -> Self {
        Self {
            max_budget,
            threshold,
            reduced_budget: reduced_budget.min(max_budget),
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Record the outcome of one completed attempt for `country`.
    pub fn record_outcome(&self, country: &str, success: bool) {
        let mut states = self.states.lock();
        let state = states.entry(country.to_string()).or_insert(CountryState {
            consecutive_failures: 0,
            budget: self.max_budget,
        });

        if success {
            if state.budget != self.max_budget {
                tracing::info!(%country, "VIES recovered, full retry budget restored");
            }
            state.consecutive_failures = 0;
            state.budget = self.max_budget;
            return;
        }

        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        if state.consecutive_failures >= self.threshold && state.budget != self.reduced_budget {
            state.budget = self.reduced_budget;
            tracing::warn!(
                %country,
                failures = state.consecutive_failures,
                budget = self.reduced_budget,
                "circuit breaker tripped, reducing retries"
            );
        }
    }

    /// Forget every country's history. Called at the start of each batch.
    pub fn reset(&self) {
        self.states.lock().clear();
    }

    /// Attempts currently granted per row for `country`.
    pub fn budget(&self, country: &str) -> u32 {
        self.states
            .lock()
            .get(country)
            .map_or(self.max_budget, |s| s.budget)
    }

    pub fn consecutive_failures(&self, country: &str) -> u32 {
        self.states
            .lock()
            .get(country)
            .map_or(0, |s| s.consecutive_failures)
    }

    pub fn is_degraded(&self, country: &str) -> bool {
        self.budget(country) < self.max_budget
    }

    /// Countries currently running on the reduced budget, sorted.
    pub fn degraded_countries(&self) -> Vec<String> {
        let mut countries: Vec<String> = self
            .states
            .lock()
            .iter()
            .filter(|(_, s)| s.budget < self.max_budget)
            .map(|(c, _)| c.clone())
            .collect();
        countries.sort();
        countries
    }
}
