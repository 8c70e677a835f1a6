//! Test fixtures for documents, engines and record feeds.
//!
//! Provides convenience functions for setting up door documents the way a
//! fire-rating project lays them out, and engines wired to scripted sources.

use bimsync_document::{Document, EntityRef, FieldHandle, FieldKey, FieldValue, MemoryDocument};
use bimsync_engine::{
    ChangeRecord, FixedClock, MockSource, SyncConfig, SyncEngine, TimestampStore, WireRecord,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Project identifier used by the fixtures.
pub const PROJECT_ID: &str = "8764c510-57b7-11e5-8b2c-9bc9d0c0ce00";

/// Name of the shared rating field.
pub const RATING_FIELD: &str = "FireRating";

/// Name of the per-entity label field.
pub const LABEL_FIELD: &str = "Mark";

/// Time returned by the fixture clock.
pub const FIXTURE_NOW: u64 = 1_442_940_645;

/// Creates a document whose entities all carry a zero rating and an empty label.
pub fn door_document(project_id: &str, entities: &[&str]) -> MemoryDocument {
    let doc = MemoryDocument::new(project_id);
    let rating = doc.define_shared_field(RATING_FIELD);

    for entity in entities {
        doc.insert_entity(*entity);
        doc.set_shared_value(*entity, rating, FieldValue::Number(0.0))
            .expect("Failed to set rating");
        doc.set_named_value(*entity, LABEL_FIELD, FieldValue::Text(String::new()))
            .expect("Failed to set label");
    }

    doc
}

/// Adds an entity that has a rating field but no label field.
pub fn add_unlabelled_entity(doc: &MemoryDocument, entity: &str) {
    let rating = doc
        .resolve_field_identifier(RATING_FIELD)
        .expect("Rating field not defined");
    doc.insert_entity(entity);
    doc.set_shared_value(entity, rating, FieldValue::Number(0.0))
        .expect("Failed to set rating");
}

/// Reads an entity's rating.
pub fn rating_of<D: Document>(doc: &D, entity: &str) -> Option<f64> {
    let id = doc.resolve_field_identifier(RATING_FIELD)?;
    doc.read_field(&FieldHandle::new(EntityRef::new(entity), FieldKey::Shared(id)))?
        .as_number()
}

/// Reads an entity's label.
pub fn label_of<D: Document>(doc: &D, entity: &str) -> Option<String> {
    doc.read_field(&FieldHandle::new(
        EntityRef::new(entity),
        FieldKey::named(LABEL_FIELD),
    ))?
    .as_text()
    .map(str::to_string)
}

/// Creates a record whose label is derived from its rating, e.g. `FR90`.
pub fn door_record(entity: &str, rating: f64, modified_at: u64) -> ChangeRecord {
    ChangeRecord::new(entity, rating, format!("FR{rating}"), modified_at)
}

/// Creates a timestamp store whose clock always reads [`FIXTURE_NOW`].
pub fn fixed_timestamps() -> Arc<TimestampStore> {
    Arc::new(TimestampStore::with_clock(FixedClock(FIXTURE_NOW)))
}

/// Creates an engine over a mock source holding `records`.
pub fn mock_engine(records: Vec<ChangeRecord>) -> SyncEngine<MockSource> {
    SyncEngine::with_timestamps(
        SyncConfig::default(),
        MockSource::with_records(records),
        fixed_timestamps(),
    )
}

/// Converts a change record to its wire form, tagged with a project.
pub fn wire_record(record: &ChangeRecord, project_id: &str) -> WireRecord {
    WireRecord {
        id: record.entity_ref.as_str().to_string(),
        project_id: Some(project_id.to_string()),
        level: None,
        tag: record.label.clone(),
        firerating: serde_json::json!(record.rating_value),
        modified: record.modified_at,
    }
}

/// A temporary directory holding a document snapshot and a record feed.
pub struct SyncWorkspace {
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
    /// Path of the document snapshot.
    pub document_path: PathBuf,
    /// Path of the record feed.
    pub records_path: PathBuf,
}

impl SyncWorkspace {
    /// Creates a workspace with the given document and records.
    pub fn new(document: &MemoryDocument, records: &[ChangeRecord]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let document_path = temp_dir.path().join("document.json");
        let records_path = temp_dir.path().join("records.json");

        document
            .save(&document_path)
            .expect("Failed to save document");
        let workspace = Self {
            _temp_dir: temp_dir,
            document_path,
            records_path,
        };
        workspace.write_records(&document.project_identifier(), records);
        workspace
    }

    /// Returns the workspace directory.
    pub fn path(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Replaces the record feed.
    pub fn write_records(&self, project_id: &str, records: &[ChangeRecord]) {
        write_records_file(&self.records_path, project_id, records);
    }

    /// Loads the current document snapshot.
    pub fn load_document(&self) -> MemoryDocument {
        MemoryDocument::load(&self.document_path).expect("Failed to load document")
    }
}

/// Writes records to `path` as a JSON array of wire records.
pub fn write_records_file(path: &Path, project_id: &str, records: &[ChangeRecord]) {
    let wire: Vec<WireRecord> = records
        .iter()
        .map(|record| wire_record(record, project_id))
        .collect();
    let json = serde_json::to_vec_pretty(&wire).expect("Failed to encode records");
    std::fs::write(path, json).expect("Failed to write records");
}
