//! Durable snapshots of partial batch results.

use crate::core::{Error, Result, ValidationResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Byte storage for checkpoints, keyed by batch session id.
pub trait CheckpointStorage: Send + Sync {
    /// `Ok(None)` when nothing was stored for `session`.
    fn read(&self, session: &str) -> Result<Option<Vec<u8>>>;
    fn write(&self, session: &str, bytes: &[u8]) -> Result<()>;
    fn remove(&self, session: &str) -> Result<()>;
}

/// One JSON file per session in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, session: &str) -> Result<PathBuf> {
        let safe = !session.is_empty()
            && session
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(Error::Checkpoint(format!(
                "session id '{session}' must be non-empty and use only letters, digits, '-' or '_'"
            )));
        }
        Ok(self.dir.join(format!("{session}.checkpoint.json")))
    }
}

impl CheckpointStorage for FileStorage {
    fn read(&self, session: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(session)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, session: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(session)?;
        std::fs::create_dir_all(&self.dir)?;
        // Write-then-rename so a crash never leaves a truncated checkpoint.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, session: &str) -> Result<()> {
        let path = self.path(session)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage, for tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStorage for MemoryStorage {
    fn read(&self, session: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(session).cloned())
    }

    fn write(&self, session: &str, bytes: &[u8]) -> Result<()> {
        self.entries.lock().insert(session.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, session: &str) -> Result<()> {
        self.entries.lock().remove(session);
        Ok(())
    }
}

/// One processed row in a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub index: usize,
    /// `false` for `service_unavailable` placeholders, which a resumed run retries.
    pub definitive: bool,
    pub result: ValidationResult,
}

/// Snapshot of a batch: two metadata fields and one record per processed row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Uploaded row count when the snapshot was taken.
    pub total_rows: usize,
    /// Highest row index with a definitive result.
    pub completed_index: Option<usize>,
    pub records: Vec<CheckpointRecord>,
}

impl Checkpoint {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Indices that a resumed run must not dispatch again.
    pub fn definitive_indices(&self) -> Vec<usize> {
        self.records
            .iter()
            .filter(|r| r.definitive)
            .map(|r| r.index)
            .collect()
    }
}

/// Reads and writes checkpoints for one batch session.
pub struct CheckpointStore {
    storage: Arc<dyn CheckpointStorage>,
    session: String,
    /// Progress of the last snapshot written; older snapshots are dropped.
    last_written: Mutex<Option<usize>>,
}

impl CheckpointStore {
    pub fn new(storage: Arc<dyn CheckpointStorage>, session: impl Into<String>) -> Self {
        Self {
            storage,
            session: session.into(),
            last_written: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    /// Persist `results` (any order) for a batch of `total_rows` rows.
    pub fn save(&self, results: &[ValidationResult], total_rows: usize) -> Result<()> {
        let mut records: Vec<CheckpointRecord> = results
            .iter()
            .map(|r| CheckpointRecord {
                index: r.index,
                definitive: r.is_definitive(),
                result: r.clone(),
            })
            .collect();
        records.sort_by_key(|r| r.index);

        let checkpoint = Checkpoint {
            total_rows,
            completed_index: records.iter().filter(|r| r.definitive).map(|r| r.index).max(),
            records,
        };
        let bytes = serde_json::to_vec(&checkpoint)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        self.storage.write(&self.session, &bytes)?;
        tracing::info!(
            session = %self.session,
            rows = checkpoint.records.len(),
            total_rows,
            "checkpoint saved"
        );
        Ok(())
    }

    /// Like [`save`](Self::save), but skipped if a snapshot with more
    /// progress was already written. Concurrent workers may finish their
    /// snapshots out of order.
    pub(crate) fn save_if_newer(
        &self,
        results: &[ValidationResult],
        total_rows: usize,
        progress: usize,
    ) -> Result<()> {
        let mut last = self.last_written.lock();
        if last.is_some_and(|p| p > progress) {
            return Ok(());
        }
        self.save(results, total_rows)?;
        *last = Some(progress);
        Ok(())
    }

    /// Start a new run: the next snapshot is written whatever its progress.
    pub(crate) fn begin_run(&self) {
        *self.last_written.lock() = None;
    }

    /// The stored snapshot, or an empty one.
    pub fn load(&self) -> Result<Checkpoint> {
        let Some(bytes) = self.storage.read(&self.session)? else {
            return Ok(Checkpoint::default());
        };
        let checkpoint: Checkpoint = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Checkpoint(format!("corrupt checkpoint '{}': {e}", self.session)))?;
        tracing::info!(
            session = %self.session,
            rows = checkpoint.records.len(),
            total_rows = checkpoint.total_rows,
            "checkpoint loaded"
        );
        Ok(checkpoint)
    }

    /// Forget the session's checkpoint.
    pub fn clear(&self) -> Result<()> {
        *self.last_written.lock() = None;
        self.storage.remove(&self.session)
    }
}
