//! Record source abstraction.

use crate::error::{SyncError, SyncResult};
use crate::record::{ChangeRecord, WireRecord};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A record source supplies change records for a project.
///
/// This trait abstracts the database client, allowing for different
/// implementations (HTTP, file, mock for testing, etc.).
///
/// Records must be returned oldest to newest by `modified_at`; the engine
/// applies them in the order received and does not re-sort.
pub trait RecordSource: Send + Sync {
    /// Fetches every record of `project_id` with `modified_at >= since`.
    ///
    /// `since == 0` fetches the full history of the project.
    fn fetch_records(&self, project_id: &str, since: u64) -> SyncResult<Vec<ChangeRecord>>;
}

impl<T: RecordSource + ?Sized> RecordSource for Arc<T> {
    fn fetch_records(&self, project_id: &str, since: u64) -> SyncResult<Vec<ChangeRecord>> {
        (**self).fetch_records(project_id, since)
    }
}

/// A mock record source for testing.
#[derive(Debug)]
pub struct MockSource {
    available: AtomicBool,
    records: Mutex<Vec<ChangeRecord>>,
    requests: Mutex<Vec<(String, u64)>>,
    fetches: AtomicU64,
    delay: Mutex<Duration>,
}

impl MockSource {
    /// Creates an empty, reachable mock source.
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            records: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            fetches: AtomicU64::new(0),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Creates a mock source holding the given records.
    pub fn with_records(records: Vec<ChangeRecord>) -> Self {
        let source = Self::new();
        *source.records.lock() = records;
        source
    }

    /// Appends a record.
    pub fn push(&self, record: ChangeRecord) {
        self.records.lock().push(record);
    }

    /// Replaces all records.
    pub fn set_records(&self, records: Vec<ChangeRecord>) {
        *self.records.lock() = records;
    }

    /// Sets whether the source is reachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Makes every fetch block for the given duration.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Returns the number of fetches made.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Returns the `(project_id, since)` pairs requested so far.
    pub fn requests(&self) -> Vec<(String, u64)> {
        self.requests.lock().clone()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSource for MockSource {
    fn fetch_records(&self, project_id: &str, since: u64) -> SyncResult<Vec<ChangeRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((project_id.to_string(), since));

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(SyncError::source_unavailable("mock source offline"));
        }

        Ok(self
            .records
            .lock()
            .iter()
            .filter(|record| record.modified_at >= since)
            .cloned()
            .collect())
    }
}

/// A record source backed by a JSON file of door records.
///
/// The file is re-read on every fetch, so edits made between cycles are
/// picked up by the next one. Records tagged with another project are
/// skipped; untagged records belong to every project.
#[derive(Debug, Clone)]
pub struct FileRecordSource {
    path: PathBuf,
}

impl FileRecordSource {
    /// Creates a source reading from the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for FileRecordSource {
    fn fetch_records(&self, project_id: &str, since: u64) -> SyncResult<Vec<ChangeRecord>> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            SyncError::source_unavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let wire: Vec<WireRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::Decode(format!("{}: {}", self.path.display(), e)))?;

        wire.into_iter()
            .filter(|record| {
                record
                    .project_id
                    .as_deref()
                    .is_none_or(|pid| pid == project_id)
            })
            .filter(|record| record.modified >= since)
            .map(WireRecord::into_change_record)
            .collect()
    }
}
