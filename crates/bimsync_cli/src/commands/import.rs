//! Import command implementation.

use bimsync_document::MemoryDocument;
use bimsync_engine::{run_manual_import, FileRecordSource, SyncConfig, SyncEngine};
use std::path::Path;

/// Runs the import command.
///
/// The document snapshot is rewritten only when the import succeeds.
pub fn run(
    document_path: &Path,
    records_path: &Path,
    config: SyncConfig,
    since: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = MemoryDocument::load(document_path)
        .map_err(|e| format!("Failed to load document {}: {}", document_path.display(), e))?;
    let engine = SyncEngine::new(config, FileRecordSource::new(records_path));

    let result = run_manual_import(&engine, &document, since);
    if !result.is_success() {
        return Err(result.message.into());
    }

    document.save(document_path)?;

    println!("{}", result.message);
    println!("Sync timestamp: {}", engine.timestamps().get());
    Ok(())
}
