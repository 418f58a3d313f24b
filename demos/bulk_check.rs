use eu_vat_bulk::engine::{CheckpointStore, FileStorage, StopSignal, ValidationEngine};
use eu_vat_bulk::vat::{RawRow, prepare_rows};
use eu_vat_bulk::EngineConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() -> eu_vat_bulk::Result<()> {
    // Reads VIES_* variables; defaults talk to the live service.
    let config = EngineConfig::from_env()?;

    let rows = vec![
        RawRow::new("DK47458714").expected_name("LEGO"),
        RawRow::new(" de 123 456 789 "),
        RawRow::new(4.7458714e7),
        RawRow::new(""),
        RawRow::new("DK47458714"),
        RawRow::new("FR123"),
    ];
    let batch = prepare_rows(rows, config.skip_duplicates);

    println!("=== Prepared Upload ===\n");
    println!("  rows to validate: {}", batch.rows.len());
    println!("  blank rows:       {:?}", batch.skipped);
    for dup in &batch.duplicates {
        println!("  row {} repeats row {} ({})", dup.index, dup.first_index, dup.vat);
    }

    // Re-running after an interruption only sends unfinished rows.
    let checkpoints = CheckpointStore::new(
        Arc::new(FileStorage::new(std::env::temp_dir().join("eu-vat-bulk"))),
        "bulk-check-demo",
    );
    let engine = ValidationEngine::from_config(config)?.with_checkpoints(checkpoints);

    let mut progress = engine.subscribe();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let p = *progress.borrow();
            println!("  progress: {}/{}", p.completed, p.total);
        }
    });

    println!("\n=== Checking Against VIES ===\n");
    let report = engine.run(batch, StopSignal::new()).await?;
    drop(engine);
    let _ = watcher.await;

    println!("\n=== Results ===\n");
    for result in &report.results {
        let fraud = result
            .fraud
            .map(|f| format!(", name match {} ({})", f.score, f.status))
            .unwrap_or_default();
        println!(
            "  row {} {} => {}{}{}",
            result.index,
            result.vat,
            result.display_status(),
            result
                .error_detail
                .as_deref()
                .map(|d| format!(": {d}"))
                .unwrap_or_default(),
            fraud
        );
    }

    println!(
        "\n  valid={} invalid={} unavailable={} format_errors={}",
        report.summary.valid,
        report.summary.invalid,
        report.summary.service_unavailable,
        report.summary.format_errors
    );
    if !report.degraded_countries.is_empty() {
        println!("  degraded: {}", report.degraded_countries.join(", "));
    }

    Ok(())
}
