//! Error types for the sync engine.

use bimsync_document::{DocumentError, EntityRef};
use std::fmt;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Record attribute that maps onto a document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    /// The numeric rating, written to the shared field.
    Rating,
    /// The text label, written to the built-in mark field.
    Label,
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordField::Rating => f.write_str("rating"),
            RecordField::Label => f.write_str("label"),
        }
    }
}

/// Errors that can occur during a sync cycle.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A precondition of the cycle is not met (e.g. the shared field
    /// identifier cannot be resolved).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The record source could not be reached or timed out.
    #[error("record source unavailable: {message}")]
    SourceUnavailable {
        /// Error message.
        message: String,
    },

    /// A record references an entity that is not in the document.
    #[error("entity not found: {entity_ref}")]
    EntityNotFound {
        /// The offending entity reference.
        entity_ref: EntityRef,
    },

    /// A target field is missing on an entity, or the record value
    /// cannot be written to it.
    #[error("{field} field not found on entity {entity_ref}")]
    FieldNotFound {
        /// The entity being updated.
        entity_ref: EntityRef,
        /// The field that could not be written.
        field: RecordField,
    },

    /// The document rejected the commit.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// The record source returned data that could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl SyncError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a source unavailable error.
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    /// Creates an entity not found error.
    pub fn entity_not_found(entity_ref: &EntityRef) -> Self {
        Self::EntityNotFound {
            entity_ref: entity_ref.clone(),
        }
    }

    /// Creates a field not found error.
    pub fn field_not_found(entity_ref: &EntityRef, field: RecordField) -> Self {
        Self::FieldNotFound {
            entity_ref: entity_ref.clone(),
            field,
        }
    }

    /// Returns true if the next cycle is expected to succeed without
    /// anyone changing the document or configuration.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::SourceUnavailable { .. })
    }
}
