//! # bimsync Document
//!
//! The document side of bimsync: the model whose entities receive
//! field updates from the record database.
//!
//! This crate provides:
//! - Entity and field addressing (`EntityRef`, `FieldId`, `FieldKey`)
//! - The `Document` trait that the sync engine writes through
//! - Scoped transactions that roll back when dropped uncommitted
//! - `MemoryDocument`, an in-memory document with JSON snapshots
//!
//! ## Key Invariants
//!
//! - Mutation only happens through a committed transaction
//! - A commit applies every buffered write or none of them
//! - Entity references are never reused

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod memory;
mod transaction;
mod types;

pub use document::Document;
pub use error::{DocumentError, DocumentResult};
pub use memory::{DocumentSnapshot, EntityRecord, MemoryDocument};
pub use transaction::{PendingWrite, Transaction, TransactionState};
pub use types::{EntityHandle, EntityRef, FieldHandle, FieldId, FieldKey, FieldKind, FieldValue};
