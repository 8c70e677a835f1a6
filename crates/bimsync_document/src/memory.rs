//! In-memory document.

use crate::document::Document;
use crate::error::{DocumentError, DocumentResult};
use crate::transaction::PendingWrite;
use crate::types::{EntityHandle, EntityRef, FieldHandle, FieldId, FieldKey, FieldValue};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Field values stored on one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Shared field values, keyed by definition ID.
    #[serde(default)]
    pub shared: BTreeMap<FieldId, FieldValue>,
    /// Built-in field values, keyed by well-known name.
    #[serde(default)]
    pub named: BTreeMap<String, FieldValue>,
}

impl EntityRecord {
    fn get(&self, key: &FieldKey) -> Option<&FieldValue> {
        match key {
            FieldKey::Shared(id) => self.shared.get(id),
            FieldKey::Named(name) => self.named.get(name),
        }
    }

    fn get_mut(&mut self, key: &FieldKey) -> Option<&mut FieldValue> {
        match key {
            FieldKey::Shared(id) => self.shared.get_mut(id),
            FieldKey::Named(name) => self.named.get_mut(name),
        }
    }
}

/// Serializable state of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Project identifier.
    pub project_id: String,
    /// Shared field definitions: name -> ID.
    #[serde(default)]
    pub shared_fields: BTreeMap<String, FieldId>,
    /// Entities by reference.
    #[serde(default)]
    pub entities: BTreeMap<EntityRef, EntityRecord>,
}

/// A document held entirely in memory.
///
/// Reads take a shared lock; a commit takes the exclusive lock for the
/// whole batch, so readers never observe a partially applied transaction.
///
/// # Example
///
/// ```ignore
/// use bimsync_document::{Document, FieldValue, MemoryDocument};
///
/// let doc = MemoryDocument::new("my-project");
/// let rating = doc.define_shared_field("FireRating");
/// doc.insert_entity("A1");
/// doc.set_shared_value("A1", rating, FieldValue::Number(0.0))?;
/// ```
#[derive(Debug)]
pub struct MemoryDocument {
    state: RwLock<DocumentSnapshot>,
    commits: AtomicU64,
}

impl MemoryDocument {
    /// Creates an empty document for a project.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::from_snapshot(DocumentSnapshot {
            project_id: project_id.into(),
            ..DocumentSnapshot::default()
        })
    }

    /// Creates a document from a snapshot.
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            commits: AtomicU64::new(0),
        }
    }

    /// Loads a document from a JSON snapshot file.
    pub fn load(path: &Path) -> DocumentResult<Self> {
        let bytes = std::fs::read(path)?;
        let snapshot: DocumentSnapshot = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            path = %path.display(),
            entities = snapshot.entities.len(),
            "document loaded"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Saves the committed state as a JSON snapshot file.
    pub fn save(&self, path: &Path) -> DocumentResult<()> {
        let json = serde_json::to_vec_pretty(&*self.state.read())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Returns a copy of the committed state.
    pub fn snapshot(&self) -> DocumentSnapshot {
        self.state.read().clone()
    }

    /// Returns the number of committed transactions.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Returns the number of entities.
    pub fn entity_count(&self) -> usize {
        self.state.read().entities.len()
    }

    /// Defines a shared field with a fresh ID, or returns the existing ID.
    pub fn define_shared_field(&self, name: &str) -> FieldId {
        *self
            .state
            .write()
            .shared_fields
            .entry(name.to_string())
            .or_insert_with(FieldId::new)
    }

    /// Defines a shared field with a known ID.
    pub fn define_shared_field_with_id(&self, name: &str, id: FieldId) {
        self.state.write().shared_fields.insert(name.to_string(), id);
    }

    /// Adds an empty entity. Existing entities are left untouched.
    pub fn insert_entity(&self, entity_ref: impl Into<EntityRef>) {
        self.state
            .write()
            .entities
            .entry(entity_ref.into())
            .or_default();
    }

    /// Removes an entity, returning whether it existed.
    pub fn remove_entity(&self, entity_ref: &EntityRef) -> bool {
        self.state.write().entities.remove(entity_ref).is_some()
    }

    /// Sets a shared field value directly, as an interactive edit would.
    pub fn set_shared_value(
        &self,
        entity_ref: impl Into<EntityRef>,
        id: FieldId,
        value: FieldValue,
    ) -> DocumentResult<()> {
        let entity_ref = entity_ref.into();
        let mut state = self.state.write();
        let entity = state
            .entities
            .get_mut(&entity_ref)
            .ok_or_else(|| DocumentError::entity_missing(&entity_ref))?;
        entity.shared.insert(id, value);
        Ok(())
    }

    /// Sets a built-in field value directly, as an interactive edit would.
    pub fn set_named_value(
        &self,
        entity_ref: impl Into<EntityRef>,
        name: &str,
        value: FieldValue,
    ) -> DocumentResult<()> {
        let entity_ref = entity_ref.into();
        let mut state = self.state.write();
        let entity = state
            .entities
            .get_mut(&entity_ref)
            .ok_or_else(|| DocumentError::entity_missing(&entity_ref))?;
        entity.named.insert(name.to_string(), value);
        Ok(())
    }

    /// Checks one write against the committed state.
    fn validate(state: &DocumentSnapshot, write: &PendingWrite) -> DocumentResult<()> {
        let entity_ref = write.field.entity_ref();
        let key = write.field.key();
        let entity = state
            .entities
            .get(entity_ref)
            .ok_or_else(|| DocumentError::entity_missing(entity_ref))?;
        let current = entity
            .get(key)
            .ok_or_else(|| DocumentError::field_missing(entity_ref, key))?;

        if current.kind() != write.value.kind() {
            return Err(DocumentError::TypeMismatch {
                entity_ref: entity_ref.clone(),
                field: key.clone(),
                expected: current.kind(),
                actual: write.value.kind(),
            });
        }
        Ok(())
    }
}

impl Document for MemoryDocument {
    fn project_identifier(&self) -> String {
        self.state.read().project_id.clone()
    }

    fn resolve_field_identifier(&self, name: &str) -> Option<FieldId> {
        self.state.read().shared_fields.get(name).copied()
    }

    fn lookup_entity(&self, entity_ref: &EntityRef) -> Option<EntityHandle> {
        self.state
            .read()
            .entities
            .contains_key(entity_ref)
            .then(|| EntityHandle::new(entity_ref.clone()))
    }

    fn field(&self, entity: &EntityHandle, key: &FieldKey) -> Option<FieldHandle> {
        let state = self.state.read();
        let record = state.entities.get(entity.entity_ref())?;
        record
            .get(key)
            .map(|_| FieldHandle::new(entity.entity_ref().clone(), key.clone()))
    }

    fn read_field(&self, field: &FieldHandle) -> Option<FieldValue> {
        let state = self.state.read();
        state
            .entities
            .get(field.entity_ref())?
            .get(field.key())
            .cloned()
    }

    fn apply_writes(&self, label: &str, writes: Vec<PendingWrite>) -> DocumentResult<()> {
        let mut state = self.state.write();

        // Validate everything first so a failure mutates nothing
        for write in &writes {
            Self::validate(&state, write)?;
        }

        let count = writes.len();
        for write in writes {
            if let Some(slot) = state
                .entities
                .get_mut(write.field.entity_ref())
                .and_then(|entity| entity.get_mut(write.field.key()))
            {
                *slot = write.value;
            }
        }

        self.commits.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(label, writes = count, "document updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_document() -> (MemoryDocument, FieldId) {
        let doc = MemoryDocument::new("proj-1");
        let rating = doc.define_shared_field("FireRating");
        doc.insert_entity("A1");
        doc.set_shared_value("A1", rating, FieldValue::Number(0.0))
            .unwrap();
        doc.set_named_value("A1", "Mark", FieldValue::Text(String::new()))
            .unwrap();
        (doc, rating)
    }

    #[test]
    fn project_identifier() {
        let (doc, _) = create_document();
        assert_eq!(doc.project_identifier(), "proj-1");
    }

    #[test]
    fn define_shared_field_is_stable() {
        let (doc, rating) = create_document();
        assert_eq!(doc.define_shared_field("FireRating"), rating);
        assert_eq!(doc.resolve_field_identifier("FireRating"), Some(rating));
        assert_eq!(doc.resolve_field_identifier("Unknown"), None);
    }

    #[test]
    fn lookup_entity_and_fields() {
        let (doc, rating) = create_document();

        assert!(doc.lookup_entity(&EntityRef::new("missing")).is_none());

        let entity = doc.lookup_entity(&EntityRef::new("A1")).unwrap();
        assert!(doc.field(&entity, &FieldKey::Shared(rating)).is_some());
        assert!(doc.field(&entity, &FieldKey::named("Mark")).is_some());
        assert!(doc.field(&entity, &FieldKey::named("Comments")).is_none());
        assert!(doc.field(&entity, &FieldKey::Shared(FieldId::new())).is_none());
    }

    #[test]
    fn apply_writes_updates_values() {
        let (doc, rating) = create_document();
        let field = FieldHandle::new(EntityRef::new("A1"), FieldKey::Shared(rating));

        doc.apply_writes(
            "test",
            vec![PendingWrite {
                field: field.clone(),
                value: FieldValue::Number(90.0),
            }],
        )
        .unwrap();

        assert_eq!(doc.read_field(&field), Some(FieldValue::Number(90.0)));
        assert_eq!(doc.commit_count(), 1);
    }

    #[test]
    fn apply_writes_rejects_type_mismatch() {
        let (doc, rating) = create_document();
        let before = doc.snapshot();
        let mark = FieldHandle::new(EntityRef::new("A1"), FieldKey::named("Mark"));
        let rating = FieldHandle::new(EntityRef::new("A1"), FieldKey::Shared(rating));

        let result = doc.apply_writes(
            "test",
            vec![
                PendingWrite {
                    field: rating,
                    value: FieldValue::Number(60.0),
                },
                PendingWrite {
                    field: mark,
                    value: FieldValue::Number(1.0),
                },
            ],
        );

        assert!(matches!(result, Err(DocumentError::TypeMismatch { .. })));
        assert_eq!(doc.snapshot(), before);
        assert_eq!(doc.commit_count(), 0);
    }

    #[test]
    fn remove_entity() {
        let (doc, _) = create_document();
        assert!(doc.remove_entity(&EntityRef::new("A1")));
        assert!(!doc.remove_entity(&EntityRef::new("A1")));
        assert_eq!(doc.entity_count(), 0);
    }

    #[test]
    fn set_value_on_missing_entity() {
        let doc = MemoryDocument::new("proj");
        let result = doc.set_named_value("nope", "Mark", FieldValue::Text("x".into()));
        assert!(matches!(result, Err(DocumentError::EntityMissing { .. })));
    }

    #[test]
    fn snapshot_file_persistence() {
        let (doc, rating) = create_document();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        doc.save(&path).unwrap();
        let loaded = MemoryDocument::load(&path).unwrap();

        assert_eq!(loaded.snapshot(), doc.snapshot());
        assert_eq!(loaded.resolve_field_identifier("FireRating"), Some(rating));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = MemoryDocument::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(DocumentError::Io(_))));
    }
}
