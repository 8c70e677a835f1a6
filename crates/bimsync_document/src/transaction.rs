//! Scoped document transactions.

use crate::document::Document;
use crate::error::{DocumentError, DocumentResult};
use crate::types::{FieldHandle, FieldValue};
use std::collections::HashMap;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can buffer writes.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been aborted.
    Aborted,
}

/// A buffered write to a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    /// Target field.
    pub field: FieldHandle,
    /// New value.
    pub value: FieldValue,
}

/// An active document transaction.
///
/// Writes are buffered in the transaction and are not visible to readers
/// until [`Transaction::commit`] succeeds. Dropping a transaction without
/// committing discards every buffered write.
pub struct Transaction<'d, D: Document> {
    document: &'d D,
    label: String,
    state: TransactionState,
    /// Pending writes: field -> value. A later write to the same field wins.
    writes: HashMap<FieldHandle, FieldValue>,
}

impl<'d, D: Document> Transaction<'d, D> {
    /// Begins a transaction with the given label.
    pub fn begin(document: &'d D, label: impl Into<String>) -> Self {
        let label = label.into();
        tracing::debug!(label = %label, "transaction started");
        Self {
            document,
            label,
            state: TransactionState::Active,
            writes: HashMap::new(),
        }
    }

    /// Returns the transaction label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Returns the number of pending writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Buffers a numeric write.
    pub fn set_numeric(&mut self, field: &FieldHandle, value: f64) -> DocumentResult<()> {
        self.write(field, FieldValue::Number(value))
    }

    /// Buffers a text write.
    pub fn set_text(&mut self, field: &FieldHandle, value: impl Into<String>) -> DocumentResult<()> {
        self.write(field, FieldValue::Text(value.into()))
    }

    /// Commits all buffered writes atomically.
    ///
    /// Returns the number of field writes applied.
    pub fn commit(mut self) -> DocumentResult<usize> {
        self.ensure_active()?;

        let writes: Vec<PendingWrite> = self
            .writes
            .drain()
            .map(|(field, value)| PendingWrite { field, value })
            .collect();
        let count = writes.len();

        match self.document.apply_writes(&self.label, writes) {
            Ok(()) => {
                self.state = TransactionState::Committed;
                tracing::debug!(label = %self.label, writes = count, "transaction committed");
                Ok(count)
            }
            Err(e) => {
                self.state = TransactionState::Aborted;
                tracing::debug!(label = %self.label, error = %e, "transaction commit failed");
                Err(e)
            }
        }
    }

    /// Aborts the transaction, discarding every buffered write.
    pub fn abort(mut self) {
        self.discard();
    }

    fn write(&mut self, field: &FieldHandle, value: FieldValue) -> DocumentResult<()> {
        self.ensure_active()?;
        self.writes.insert(field.clone(), value);
        Ok(())
    }

    fn discard(&mut self) {
        if self.is_active() {
            tracing::debug!(
                label = %self.label,
                discarded = self.writes.len(),
                "transaction rolled back"
            );
            self.writes.clear();
            self.state = TransactionState::Aborted;
        }
    }

    fn ensure_active(&self) -> DocumentResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(DocumentError::transaction_closed(
                "transaction already committed",
            )),
            TransactionState::Aborted => Err(DocumentError::transaction_closed(
                "transaction already aborted",
            )),
        }
    }
}

impl<D: Document> Drop for Transaction<'_, D> {
    fn drop(&mut self) {
        self.discard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;
    use crate::types::{EntityRef, FieldKey};

    fn create_document() -> (MemoryDocument, FieldHandle) {
        let doc = MemoryDocument::new("proj");
        doc.insert_entity("A1");
        doc.set_named_value("A1", "Mark", FieldValue::Text("old".into()))
            .unwrap();
        let field = FieldHandle::new(EntityRef::new("A1"), FieldKey::named("Mark"));
        (doc, field)
    }

    #[test]
    fn new_transaction_is_active() {
        let (doc, _) = create_document();
        let txn = doc.begin_transaction("test");
        assert!(txn.is_active());
        assert_eq!(txn.state(), TransactionState::Active);
        assert_eq!(txn.label(), "test");
    }

    #[test]
    fn writes_invisible_until_commit() {
        let (doc, field) = create_document();
        let mut txn = doc.begin_transaction("test");
        txn.set_text(&field, "new").unwrap();

        assert_eq!(doc.read_field(&field), Some(FieldValue::Text("old".into())));

        txn.commit().unwrap();
        assert_eq!(doc.read_field(&field), Some(FieldValue::Text("new".into())));
    }

    #[test]
    fn write_overwrites_previous() {
        let (doc, field) = create_document();
        let mut txn = doc.begin_transaction("test");
        txn.set_text(&field, "first").unwrap();
        txn.set_text(&field, "second").unwrap();
        assert_eq!(txn.write_count(), 1);

        assert_eq!(txn.commit().unwrap(), 1);
        assert_eq!(
            doc.read_field(&field),
            Some(FieldValue::Text("second".into()))
        );
    }

    #[test]
    fn drop_rolls_back() {
        let (doc, field) = create_document();
        {
            let mut txn = doc.begin_transaction("test");
            txn.set_text(&field, "new").unwrap();
        }

        assert_eq!(doc.read_field(&field), Some(FieldValue::Text("old".into())));
        assert_eq!(doc.commit_count(), 0);
    }

    #[test]
    fn abort_rolls_back() {
        let (doc, field) = create_document();
        let mut txn = doc.begin_transaction("test");
        txn.set_text(&field, "new").unwrap();
        txn.abort();

        assert_eq!(doc.read_field(&field), Some(FieldValue::Text("old".into())));
    }

    #[test]
    fn failed_commit_leaves_document_unchanged() {
        let (doc, field) = create_document();
        let missing = FieldHandle::new(EntityRef::new("A2"), FieldKey::named("Mark"));

        let mut txn = doc.begin_transaction("test");
        txn.set_text(&field, "new").unwrap();
        txn.set_text(&missing, "new").unwrap();

        let result = txn.commit();
        assert!(matches!(result, Err(DocumentError::EntityMissing { .. })));
        assert_eq!(doc.read_field(&field), Some(FieldValue::Text("old".into())));
    }
}
