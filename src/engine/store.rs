use crate::core::ValidationResult;
use std::collections::{BTreeMap, BTreeSet};

/// Results keyed by original row index.
///
/// Completion order does not matter: lookups and [`ordered`](Self::ordered)
/// go by index. A definitive result is final; a `service_unavailable`
/// placeholder can be replaced by a later result for the same row.
#[derive(Debug, Default, Clone)]
pub struct ResultStore {
    results: BTreeMap<usize, ValidationResult>,
    completed: BTreeSet<usize>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a result. Returns `false` if it was discarded because the row
    /// already has a definitive result.
    pub fn insert(&mut self, result: ValidationResult) -> bool {
        let index = result.index;
        if self.completed.contains(&index) {
            tracing::debug!(row = index, "discarding result for already completed row");
            return false;
        }
        if result.is_definitive() {
            self.completed.insert(index);
        }
        self.results.insert(index, result);
        true
    }

    /// True once the row has a definitive result.
    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    pub fn get(&self, index: usize) -> Option<&ValidationResult> {
        self.results.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.results.contains_key(&index)
    }

    /// Rows with any result, placeholders included.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Highest index with a definitive result.
    pub fn highest_completed(&self) -> Option<usize> {
        self.completed.last().copied()
    }

    /// Grows with every accepted insert, including placeholder replacement.
    fn progress(&self) -> usize {
        self.results.len() + self.completed.len()
    }

    /// Copy of all results for checkpointing, with a counter that orders
    /// snapshots taken from the same store.
    pub fn snapshot(&self) -> (Vec<ValidationResult>, usize) {
        (self.ordered(), self.progress())
    }

    /// All results in index order.
    pub fn ordered(&self) -> Vec<ValidationResult> {
        self.results.values().cloned().collect()
    }

    pub fn into_ordered(self) -> Vec<ValidationResult> {
        self.results.into_values().collect()
    }
}
