//! Entity and field addressing types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable reference to a document entity.
///
/// Entity references are:
/// - Assigned when the entity is created
/// - Immutable once assigned
/// - Never reused for another entity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRef(String);

impl EntityRef {
    /// Creates an entity reference.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of a shared field definition.
///
/// Shared fields are defined once per environment and bound to many
/// entities; the same `FieldId` locates the field on every entity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(Uuid);

impl FieldId {
    /// Creates a new random field ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a field ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FieldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldId({})", self.0)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for FieldId {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

/// How a field is located on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// A shared field, located by its definition ID.
    Shared(FieldId),
    /// A built-in field, located by its well-known name.
    Named(String),
}

impl FieldKey {
    /// Creates a named field key.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Shared(id) => write!(f, "shared field {id}"),
            FieldKey::Named(name) => write!(f, "field '{name}'"),
        }
    }
}

/// Handle to an entity that exists in a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    entity_ref: EntityRef,
}

impl EntityHandle {
    /// Creates a handle for a resolved entity.
    #[must_use]
    pub fn new(entity_ref: EntityRef) -> Self {
        Self { entity_ref }
    }

    /// Returns the entity reference.
    #[must_use]
    pub fn entity_ref(&self) -> &EntityRef {
        &self.entity_ref
    }
}

/// Handle to a field that exists on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldHandle {
    entity_ref: EntityRef,
    key: FieldKey,
}

impl FieldHandle {
    /// Creates a handle for a resolved field.
    #[must_use]
    pub fn new(entity_ref: EntityRef, key: FieldKey) -> Self {
        Self { entity_ref, key }
    }

    /// Returns the owning entity reference.
    #[must_use]
    pub fn entity_ref(&self) -> &EntityRef {
        &self.entity_ref
    }

    /// Returns the field key.
    #[must_use]
    pub fn key(&self) -> &FieldKey {
        &self.key
    }
}

/// Kind of value a field stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Floating point number.
    Number,
    /// Text.
    Text,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Number => f.write_str("number"),
            FieldKind::Text => f.write_str("text"),
        }
    }
}

/// A field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
}

impl FieldValue {
    /// Returns the kind of this value.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Text(_) => FieldKind::Text,
        }
    }

    /// Returns the numeric value, if any.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(_) => None,
        }
    }

    /// Returns the text value, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            FieldValue::Number(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ref_display() {
        let entity = EntityRef::new("60f91daf-3dd7-4283-a86d-24137b73f3da-0001fd0b");
        assert_eq!(
            entity.to_string(),
            "60f91daf-3dd7-4283-a86d-24137b73f3da-0001fd0b"
        );
        assert_eq!(EntityRef::from("A1"), EntityRef::new(String::from("A1")));
    }

    #[test]
    fn field_ids_are_unique() {
        assert_ne!(FieldId::new(), FieldId::new());
    }

    #[test]
    fn field_value_kinds() {
        assert_eq!(FieldValue::Number(90.0).kind(), FieldKind::Number);
        assert_eq!(FieldValue::Text("FR90".into()).kind(), FieldKind::Text);
        assert_eq!(FieldValue::Number(90.0).as_number(), Some(90.0));
        assert_eq!(FieldValue::Text("FR90".into()).as_number(), None);
        assert_eq!(FieldValue::Text("FR90".into()).as_text(), Some("FR90"));
    }

    #[test]
    fn field_value_json_is_untagged() {
        let number: FieldValue = serde_json::from_str("90").unwrap();
        assert_eq!(number, FieldValue::Number(90.0));

        let text: FieldValue = serde_json::from_str("\"FR90\"").unwrap();
        assert_eq!(text, FieldValue::Text("FR90".into()));
    }
}
