#![no_main]

use eu_vat_bulk::engine::{CheckpointStorage, CheckpointStore, MemoryStorage};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    // Corrupt checkpoints must load as errors, never panic.
    let storage = Arc::new(MemoryStorage::new());
    if storage.write("fuzz", data).is_ok() {
        let _ = CheckpointStore::new(storage, "fuzz").load();
    }
});
