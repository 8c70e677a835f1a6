//! Subscribe command implementation.

use bimsync_document::MemoryDocument;
use bimsync_engine::{
    toggle_subscription, FileRecordSource, SubscriptionController, SyncConfig, SyncEngine,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Polling period while waiting for cycles to finish.
const WAIT_POLL: Duration = Duration::from_millis(20);

/// Runs the subscribe command.
///
/// Subscribes, waits until `cycles` timer cycles have run (successful or
/// not), unsubscribes and saves the document.
pub fn run(
    document_path: &Path,
    records_path: &Path,
    config: SyncConfig,
    cycles: u64,
    since: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = Arc::new(
        MemoryDocument::load(document_path)
            .map_err(|e| format!("Failed to load document {}: {}", document_path.display(), e))?,
    );
    let engine = Arc::new(SyncEngine::new(config, FileRecordSource::new(records_path)));
    if let Some(since) = since {
        engine.timestamps().set(since);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let controller = SubscriptionController::new(Arc::clone(&engine), runtime.handle().clone());

    println!("{}", toggle_subscription(&controller, Arc::clone(&document)));

    runtime.block_on(async {
        loop {
            let stats = engine.stats();
            if stats.cycles_completed + stats.cycles_failed >= cycles {
                break;
            }
            tokio::time::sleep(WAIT_POLL).await;
        }
    });

    println!("{}", toggle_subscription(&controller, Arc::clone(&document)));
    runtime.block_on(controller.shutdown());

    document.save(document_path)?;

    let stats = engine.stats();
    println!(
        "Cycles: {} completed, {} failed; {} record(s) applied",
        stats.cycles_completed, stats.cycles_failed, stats.records_applied
    );
    if let Some(error) = stats.last_error {
        println!("Last error: {}", error);
    }
    println!("Sync timestamp: {}", engine.timestamps().get());
    Ok(())
}
