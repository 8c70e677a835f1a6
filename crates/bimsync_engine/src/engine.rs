//! Sync engine: fetch, map and apply one batch of change records.

use crate::config::SyncConfig;
use crate::error::{RecordField, SyncError, SyncResult};
use crate::record::ChangeRecord;
use crate::source::RecordSource;
use crate::timestamp::TimestampStore;
use bimsync_document::{Document, EntityHandle, FieldHandle, FieldKey, FieldKind};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Statistics about sync cycles.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total number of cycles that completed successfully.
    pub cycles_completed: u64,
    /// Total number of cycles that failed.
    pub cycles_failed: u64,
    /// Total number of records applied.
    pub records_applied: u64,
    /// Time of the last successful cycle.
    pub last_sync_time: Option<Instant>,
    /// Message of the last failure, cleared by the next success.
    pub last_error: Option<String>,
}

/// Result of a successful sync cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCycleResult {
    /// Number of records applied to the document.
    pub applied: usize,
    /// Largest `modified_at` in the applied batch, if any.
    pub high_water: Option<u64>,
    /// Timestamp store value after the cycle.
    pub timestamp: u64,
    /// Duration of the cycle.
    pub duration: Duration,
}

/// The sync engine applies remote change records to a document.
///
/// Each cycle:
/// 1. Resolves the shared rating field (a precondition, checked before any fetch)
/// 2. Fetches the records modified at or after `since`
/// 3. Opens one transaction and buffers the rating and label writes of every record
/// 4. Commits, then advances the timestamp store to the batch's high-water mark
///
/// Any failure in step 3 drops the transaction uncommitted, leaving the
/// document and the timestamp exactly as they were.
pub struct SyncEngine<S: RecordSource> {
    config: SyncConfig,
    source: Arc<S>,
    timestamps: Arc<TimestampStore>,
    stats: RwLock<SyncStats>,
    /// Held for the duration of a cycle; at most one cycle runs at a time.
    cycle_lock: Mutex<()>,
}

impl<S: RecordSource> SyncEngine<S> {
    /// Creates a new sync engine with its own timestamp store.
    pub fn new(config: SyncConfig, source: S) -> Self {
        Self::with_timestamps(config, source, Arc::new(TimestampStore::new()))
    }

    /// Creates a new sync engine sharing the given timestamp store.
    pub fn with_timestamps(config: SyncConfig, source: S, timestamps: Arc<TimestampStore>) -> Self {
        Self {
            config,
            source: Arc::new(source),
            timestamps,
            stats: RwLock::new(SyncStats::default()),
            cycle_lock: Mutex::new(()),
        }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Gets the record source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Gets the timestamp store.
    pub fn timestamps(&self) -> &Arc<TimestampStore> {
        &self.timestamps
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns true while a cycle is running.
    pub fn is_busy(&self) -> bool {
        self.cycle_lock.is_locked()
    }

    /// Runs one sync cycle, waiting for any cycle already in flight.
    pub fn synchronize<D: Document>(
        &self,
        document: &D,
        project_id: &str,
        since: u64,
    ) -> SyncResult<SyncCycleResult> {
        let _cycle = self.cycle_lock.lock();
        self.run_cycle(document, project_id, since)
    }

    /// Runs one sync cycle unless another is in flight.
    ///
    /// Returns `None` without doing anything when a cycle is already running.
    pub fn try_synchronize<D: Document>(
        &self,
        document: &D,
        project_id: &str,
        since: u64,
    ) -> Option<SyncResult<SyncCycleResult>> {
        let _cycle = self.cycle_lock.try_lock()?;
        Some(self.run_cycle(document, project_id, since))
    }

    fn run_cycle<D: Document>(
        &self,
        document: &D,
        project_id: &str,
        since: u64,
    ) -> SyncResult<SyncCycleResult> {
        let start = Instant::now();

        match self.apply_batch(document, project_id, since) {
            Ok((applied, high_water)) => {
                let result = SyncCycleResult {
                    applied,
                    high_water,
                    timestamp: self.timestamps.get(),
                    duration: start.elapsed(),
                };

                tracing::info!(
                    project_id,
                    since,
                    applied,
                    timestamp = result.timestamp,
                    elapsed_ms = result.duration.as_millis() as u64,
                    "sync cycle completed"
                );

                let mut stats = self.stats.write();
                stats.cycles_completed += 1;
                stats.records_applied += applied as u64;
                stats.last_sync_time = Some(Instant::now());
                stats.last_error = None;

                Ok(result)
            }
            Err(e) => {
                let mut stats = self.stats.write();
                stats.cycles_failed += 1;
                stats.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetches and applies one batch, returning the applied count and the
    /// batch's high-water timestamp.
    fn apply_batch<D: Document>(
        &self,
        document: &D,
        project_id: &str,
        since: u64,
    ) -> SyncResult<(usize, Option<u64>)> {
        if project_id.is_empty() {
            return Err(SyncError::configuration("project identifier is empty"));
        }

        let rating_id = document
            .resolve_field_identifier(&self.config.rating_field_name)
            .ok_or_else(|| {
                SyncError::configuration(format!(
                    "shared field '{}' not found",
                    self.config.rating_field_name
                ))
            })?;

        let records = self.source.fetch_records(project_id, since)?;
        if records.is_empty() {
            tracing::debug!(project_id, since, "no records to apply");
            return Ok((0, None));
        }

        // Reject bad values before the document is touched
        records.iter().try_for_each(ChangeRecord::validate)?;

        let rating_key = FieldKey::Shared(rating_id);
        let label_key = FieldKey::named(self.config.label_field_name.as_str());

        let mut txn = document.begin_transaction(&self.config.transaction_label);

        for record in &records {
            let entity = document
                .lookup_entity(&record.entity_ref)
                .ok_or_else(|| SyncError::entity_not_found(&record.entity_ref))?;

            let rating = resolve_target(
                document,
                &entity,
                &rating_key,
                FieldKind::Number,
                RecordField::Rating,
            )?;
            txn.set_numeric(&rating, record.rating_value)?;

            let label = resolve_target(
                document,
                &entity,
                &label_key,
                FieldKind::Text,
                RecordField::Label,
            )?;
            txn.set_text(&label, record.label.as_str())?;

            tracing::debug!(
                entity_ref = %record.entity_ref,
                rating = record.rating_value,
                label = %record.label,
                "record staged"
            );
        }

        txn.commit()?;

        let high_water = records.iter().map(|record| record.modified_at).max();
        if let Some(high_water) = high_water {
            self.timestamps.advance(high_water);
        }

        Ok((records.len(), high_water))
    }
}

/// Looks up a target field and checks it holds a value of the expected kind.
///
/// A field of the wrong kind is reported the same way as a missing one.
fn resolve_target<D: Document>(
    document: &D,
    entity: &EntityHandle,
    key: &FieldKey,
    kind: FieldKind,
    field: RecordField,
) -> SyncResult<FieldHandle> {
    document
        .field(entity, key)
        .filter(|handle| document.read_field(handle).map(|value| value.kind()) == Some(kind))
        .ok_or_else(|| SyncError::field_not_found(entity.entity_ref(), field))
}
