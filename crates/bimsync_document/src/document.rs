//! The document accessor interface.

use crate::error::DocumentResult;
use crate::transaction::{PendingWrite, Transaction};
use crate::types::{EntityHandle, EntityRef, FieldHandle, FieldId, FieldKey, FieldValue};

/// A document whose entity fields can be updated by the sync engine.
///
/// This trait abstracts the host model, allowing for different implementations
/// (a live BIM session, a file-backed snapshot, an in-memory model for testing).
///
/// Lookups are read-only. All mutation goes through [`Transaction`], which
/// buffers writes and hands them to [`Document::apply_writes`] on commit.
pub trait Document: Send + Sync {
    /// Returns the project identifier that selects this document's records.
    fn project_identifier(&self) -> String;

    /// Resolves the shared field definition with the given name.
    fn resolve_field_identifier(&self, name: &str) -> Option<FieldId>;

    /// Looks up an entity by reference.
    fn lookup_entity(&self, entity_ref: &EntityRef) -> Option<EntityHandle>;

    /// Looks up a field on an entity, by shared ID or well-known name.
    fn field(&self, entity: &EntityHandle, key: &FieldKey) -> Option<FieldHandle>;

    /// Reads the committed value of a field.
    fn read_field(&self, field: &FieldHandle) -> Option<FieldValue>;

    /// Applies a batch of writes atomically.
    ///
    /// Implementations must validate every write before mutating anything:
    /// either all writes become visible or the document is left unchanged.
    fn apply_writes(&self, label: &str, writes: Vec<PendingWrite>) -> DocumentResult<()>;

    /// Begins a scoped transaction against this document.
    fn begin_transaction(&self, label: &str) -> Transaction<'_, Self>
    where
        Self: Sized,
    {
        Transaction::begin(self, label)
    }
}
