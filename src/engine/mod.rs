//! Batch engine: worker pool, result store and checkpoints.
//!
//! A [`ValidationEngine`] takes a [`PreparedBatch`](crate::vat::PreparedBatch),
//! validates its rows on `workers` concurrent tokio tasks and returns a
//! [`BatchReport`] in original row order. With a [`CheckpointStore`]
//! attached, partial results are saved every `checkpoint_every` rows and a
//! later run with the same session id only sends rows that have no
//! definitive result yet.
//!
//! ```no_run
//! use eu_vat_bulk::EngineConfig;
//! use eu_vat_bulk::engine::{CheckpointStore, FileStorage, StopSignal, ValidationEngine};
//! use eu_vat_bulk::vat::{RawRow, prepare_rows};
//! use std::sync::Arc;
//!
//! # async fn demo() -> eu_vat_bulk::Result<()> {
//! let config = EngineConfig::from_env()?;
//! let batch = prepare_rows(vec![RawRow::new("DK47458714")], config.skip_duplicates);
//! let checkpoints = CheckpointStore::new(Arc::new(FileStorage::new("checkpoints")), "upload-1");
//! let engine = ValidationEngine::from_config(config)?.with_checkpoints(checkpoints);
//! let report = engine.run(batch, StopSignal::new()).await?;
//! println!("{} valid of {}", report.summary.valid, report.summary.total);
//! # Ok(())
//! # }
//! ```

mod checkpoint;
mod dispatcher;
mod store;

pub use checkpoint::{
    Checkpoint, CheckpointRecord, CheckpointStorage, CheckpointStore, FileStorage, MemoryStorage,
};
pub use dispatcher::{BatchReport, Progress, StopSignal, ValidationEngine};
pub use store::ResultStore;
