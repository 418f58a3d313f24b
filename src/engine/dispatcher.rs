//! Concurrent batch dispatch.

use super::checkpoint::CheckpointStore;
use super::store::ResultStore;
use crate::core::{BatchSummary, EngineConfig, Error, Result, ValidationResult, ValidationRow};
use crate::fraud;
use crate::vat::{DuplicateRow, PreparedBatch};
use crate::vies::{CircuitBreaker, VatLookup, Verifier, ViesClient};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Cloneable stop flag. Workers finish the row in hand and take no more.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Rows with a result so far, out of the rows to validate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Outcome of [`ValidationEngine::run`].
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One entry per processed row, in original row order.
    pub results: Vec<ValidationResult>,
    pub skipped: Vec<usize>,
    pub duplicates: Vec<DuplicateRow>,
    pub total_rows: usize,
    /// Rows verified during this run.
    pub dispatched: usize,
    /// Definitive results taken over from a checkpoint.
    pub resumed: usize,
    /// A stop was requested before every row was claimed.
    pub interrupted: bool,
    pub summary: BatchSummary,
    /// Countries on a reduced retry budget when the run ended.
    pub degraded_countries: Vec<String>,
}

/// State shared by the workers of one run.
struct RunState {
    rows: Vec<ValidationRow>,
    cursor: AtomicUsize,
    store: Mutex<ResultStore>,
    dispatched: AtomicUsize,
    total_rows: usize,
    batch_rows: usize,
}

/// Runs prepared batches through a pool of tokio workers.
pub struct ValidationEngine<L> {
    config: EngineConfig,
    verifier: Arc<Verifier<L>>,
    checkpoints: Option<Arc<CheckpointStore>>,
    progress: Arc<watch::Sender<Progress>>,
}

impl ValidationEngine<ViesClient> {
    /// Engine talking to the live VIES service.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let client = ViesClient::new(&config)?;
        let verifier = Verifier::new(client, &config);
        Self::new(config, verifier)
    }
}

impl<L: VatLookup + 'static> ValidationEngine<L> {
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` fails validation.
    pub fn new(config: EngineConfig, verifier: Verifier<L>) -> Result<Self> {
        config.validate()?;
        let (progress, _) = watch::channel(Progress::default());
        Ok(Self {
            config,
            verifier: Arc::new(verifier),
            checkpoints: None,
            progress: Arc::new(progress),
        })
    }

    pub fn with_checkpoints(mut self, checkpoints: CheckpointStore) -> Self {
        self.checkpoints = Some(Arc::new(checkpoints));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        self.verifier.breaker()
    }

    /// Progress updates for the current run.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Validate every row of `batch`.
    ///
    /// Rows already settled in the checkpoint are not sent again.
    /// Checkpoint write failures are logged and do not stop the batch.
    /// The circuit breaker starts every run with a clean slate.
    ///
    /// # Errors
    ///
    /// Returns an error only if an existing checkpoint cannot be read.
    pub async fn run(&self, batch: PreparedBatch, stop: StopSignal) -> Result<BatchReport> {
        let PreparedBatch {
            rows,
            skipped,
            duplicates,
            total_rows,
        } = batch;
        let batch_rows = rows.len();

        self.verifier.breaker().reset();
        let mut store = ResultStore::new();
        let mut resumed = 0;
        if let Some(checkpoints) = &self.checkpoints {
            checkpoints.begin_run();
            let checkpoint = {
                let checkpoints = Arc::clone(checkpoints);
                tokio::task::spawn_blocking(move || checkpoints.load())
                    .await
                    .map_err(|e| Error::Checkpoint(format!("checkpoint load task failed: {e}")))??
            };
            if !checkpoint.is_empty() && checkpoint.total_rows != total_rows {
                tracing::warn!(
                    session = checkpoints.session(),
                    expected = total_rows,
                    found = checkpoint.total_rows,
                    "checkpoint belongs to a different upload, starting fresh"
                );
            } else {
                let known: HashSet<usize> = rows.iter().map(|r| r.index).collect();
                for record in checkpoint.records {
                    if known.contains(&record.index) && store.insert(record.result) && record.definitive {
                        resumed += 1;
                    }
                }
            }
        }

        let pending: Vec<ValidationRow> = rows
            .into_iter()
            .filter(|r| !store.is_completed(r.index))
            .collect();
        tracing::info!(
            rows = batch_rows,
            pending = pending.len(),
            resumed,
            workers = self.config.workers,
            "starting batch"
        );
        self.progress.send_replace(Progress {
            completed: store.len(),
            total: batch_rows,
        });

        let state = Arc::new(RunState {
            rows: pending,
            cursor: AtomicUsize::new(0),
            store: Mutex::new(store),
            dispatched: AtomicUsize::new(0),
            total_rows,
            batch_rows,
        });

        let mut workers = JoinSet::new();
        for id in 0..self.config.workers.min(state.rows.len()) {
            workers.spawn(worker(
                id,
                Arc::clone(&state),
                Arc::clone(&self.verifier),
                self.checkpoints.clone(),
                self.config.checkpoint_every,
                Arc::clone(&self.progress),
                stop.clone(),
            ));
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "validation worker failed");
            }
        }

        let claimed = state.cursor.load(Ordering::SeqCst).min(state.rows.len());
        let interrupted = stop.is_stopped() && claimed < state.rows.len();
        let mut store = std::mem::take(&mut *state.store.lock());
        for (slot, row) in state.rows.iter().enumerate() {
            // Claimed but never finished: its worker died mid-row.
            if !store.contains(row.index) && (slot < claimed || !interrupted) {
                store.insert(ValidationResult::service_unavailable(
                    row,
                    "validation worker failed before finishing this row",
                    0,
                ));
            }
        }

        if let Some(checkpoints) = &self.checkpoints {
            let (results, progress) = store.snapshot();
            if let Err(e) = persist(Arc::clone(checkpoints), results, total_rows, progress).await {
                tracing::error!(error = %e, "final checkpoint failed");
            }
        }
        self.progress.send_replace(Progress {
            completed: store.len(),
            total: batch_rows,
        });

        let results = store.into_ordered();
        let summary = BatchSummary::from_results(&results);
        let dispatched = state.dispatched.load(Ordering::SeqCst);
        tracing::info!(
            valid = summary.valid,
            invalid = summary.invalid,
            service_unavailable = summary.service_unavailable,
            format_errors = summary.format_errors,
            dispatched,
            interrupted,
            "batch finished"
        );

        Ok(BatchReport {
            results,
            skipped,
            duplicates,
            total_rows,
            dispatched,
            resumed,
            interrupted,
            summary,
            degraded_countries: self.breaker().degraded_countries(),
        })
    }
}

async fn worker<L: VatLookup + 'static>(
    id: usize,
    state: Arc<RunState>,
    verifier: Arc<Verifier<L>>,
    checkpoints: Option<Arc<CheckpointStore>>,
    checkpoint_every: usize,
    progress: Arc<watch::Sender<Progress>>,
    stop: StopSignal,
) {
    loop {
        if stop.is_stopped() {
            tracing::debug!(worker = id, "stop requested");
            break;
        }
        let slot = state.cursor.fetch_add(1, Ordering::SeqCst);
        let Some(row) = state.rows.get(slot) else {
            break;
        };

        let mut result = verifier.verify(row).await;
        result.fraud = fraud::assess(result.name.as_deref(), row.expected_name.as_deref());
        let done = state.dispatched.fetch_add(1, Ordering::SeqCst) + 1;

        let snapshot = {
            let mut store = state.store.lock();
            store.insert(result);
            progress.send_replace(Progress {
                completed: store.len(),
                total: state.batch_rows,
            });
            (checkpoints.is_some() && done % checkpoint_every == 0).then(|| store.snapshot())
        };

        if let (Some(checkpoints), Some((results, seq))) = (&checkpoints, snapshot) {
            if let Err(e) = persist(Arc::clone(checkpoints), results, state.total_rows, seq).await {
                tracing::error!(worker = id, error = %e, "checkpoint failed, continuing");
            }
        }
    }
}

/// Write a snapshot on the blocking pool, off the worker threads.
async fn persist(
    checkpoints: Arc<CheckpointStore>,
    results: Vec<ValidationResult>,
    total_rows: usize,
    progress: usize,
) -> Result<()> {
    tokio::task::spawn_blocking(move || checkpoints.save_if_newer(&results, total_rows, progress))
        .await
        .map_err(|e| Error::Checkpoint(format!("checkpoint write task failed: {e}")))?
}
