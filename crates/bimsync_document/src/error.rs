//! Error types for document access.

use crate::types::{EntityRef, FieldKey, FieldKind};
use std::io;
use thiserror::Error;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors that can occur while reading or mutating a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The entity does not exist in the document.
    #[error("entity not found: {entity_ref}")]
    EntityMissing {
        /// The entity reference that was not found.
        entity_ref: EntityRef,
    },

    /// The field does not exist on the entity.
    #[error("field {field} not found on entity {entity_ref}")]
    FieldMissing {
        /// The entity that was searched.
        entity_ref: EntityRef,
        /// The field that was not found.
        field: FieldKey,
    },

    /// A write does not match the stored kind of the field.
    #[error("type mismatch on {field} of entity {entity_ref}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The entity owning the field.
        entity_ref: EntityRef,
        /// The field being written.
        field: FieldKey,
        /// Kind stored in the document.
        expected: FieldKind,
        /// Kind of the attempted write.
        actual: FieldKind,
    },

    /// The transaction was already committed or aborted.
    #[error("transaction closed: {message}")]
    TransactionClosed {
        /// Why the transaction cannot be used.
        message: String,
    },

    /// The snapshot could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// I/O error while loading or saving a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DocumentError {
    /// Creates an entity missing error.
    pub fn entity_missing(entity_ref: &EntityRef) -> Self {
        Self::EntityMissing {
            entity_ref: entity_ref.clone(),
        }
    }

    /// Creates a field missing error.
    pub fn field_missing(entity_ref: &EntityRef, field: &FieldKey) -> Self {
        Self::FieldMissing {
            entity_ref: entity_ref.clone(),
            field: field.clone(),
        }
    }

    /// Creates a transaction closed error.
    pub fn transaction_closed(message: impl Into<String>) -> Self {
        Self::TransactionClosed {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DocumentError::entity_missing(&EntityRef::new("A1"));
        assert_eq!(err.to_string(), "entity not found: A1");

        let err = DocumentError::field_missing(&EntityRef::new("A1"), &FieldKey::named("Mark"));
        assert!(err.to_string().contains("Mark"));
        assert!(err.to_string().contains("A1"));
    }

    #[test]
    fn type_mismatch_display() {
        let err = DocumentError::TypeMismatch {
            entity_ref: EntityRef::new("A1"),
            field: FieldKey::named("Mark"),
            expected: FieldKind::Text,
            actual: FieldKind::Number,
        };
        assert!(err.to_string().contains("expected text, got number"));
    }
}
