//! Change records from the record database.

use crate::error::{RecordField, SyncError, SyncResult};
use bimsync_document::EntityRef;
use serde::{Deserialize, Serialize};

/// One remote record describing the desired state of a single entity.
///
/// Records are created and mutated only by the remote system; the engine
/// treats them as read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Entity this record applies to.
    pub entity_ref: EntityRef,
    /// Numeric classification value, written to the rating field.
    pub rating_value: f64,
    /// Short text mirrored onto the label field.
    pub label: String,
    /// Timestamp of the last remote mutation.
    pub modified_at: u64,
}

impl ChangeRecord {
    /// Creates a change record.
    pub fn new(
        entity_ref: impl Into<EntityRef>,
        rating_value: f64,
        label: impl Into<String>,
        modified_at: u64,
    ) -> Self {
        Self {
            entity_ref: entity_ref.into(),
            rating_value,
            label: label.into(),
            modified_at,
        }
    }

    /// Checks that the rating is a finite number.
    pub fn validate(&self) -> SyncResult<()> {
        if self.rating_value.is_finite() {
            Ok(())
        } else {
            Err(SyncError::field_not_found(
                &self.entity_ref,
                RecordField::Rating,
            ))
        }
    }
}

/// A door record as stored in the record database.
///
/// The rating is kept as raw JSON so a non-numeric value can be reported
/// against its entity instead of failing the whole decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    /// Entity reference.
    #[serde(rename = "_id")]
    pub id: String,
    /// Project the record belongs to.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Building level name, informational only.
    #[serde(default)]
    pub level: Option<String>,
    /// Label text.
    pub tag: String,
    /// Rating value.
    pub firerating: serde_json::Value,
    /// Last modification timestamp.
    pub modified: u64,
}

impl WireRecord {
    /// Converts the wire form into a change record.
    pub fn into_change_record(self) -> SyncResult<ChangeRecord> {
        let entity_ref = EntityRef::new(self.id);
        let rating_value = self
            .firerating
            .as_f64()
            .filter(|value| value.is_finite())
            .ok_or_else(|| SyncError::field_not_found(&entity_ref, RecordField::Rating))?;

        Ok(ChangeRecord {
            entity_ref,
            rating_value,
            label: self.tag,
            modified_at: self.modified,
        })
    }
}
