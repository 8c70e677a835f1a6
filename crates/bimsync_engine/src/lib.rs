//! # bimsync Engine
//!
//! Incremental synchronization of document entities with records held in
//! an external database.
//!
//! This crate provides:
//! - Change records and the record source abstraction
//! - Timestamp store for incremental fetches
//! - Sync engine that applies a batch in one scoped transaction
//! - Subscription controller that runs the engine on a timer
//! - Host command entry points (manual import, subscription toggle)
//!
//! ## Architecture
//!
//! Updates flow one way, database to document:
//! 1. Fetch every record modified at or after the last sync timestamp
//! 2. Resolve each record's entity and fields, buffering the writes
//! 3. Commit the whole batch, then advance the timestamp
//!
//! Records are fully fetched before the document transaction begins, so
//! network latency never extends the window in which the document is locked.
//!
//! ## Key Invariants
//!
//! - A batch is applied completely or not at all
//! - The timestamp only advances after a committed batch, and never moves backwards
//! - At most one sync cycle runs at a time
//! - A failed cycle never stops the subscription timer

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod host;
mod http;
mod record;
mod source;
mod subscription;
mod timestamp;

pub use config::SyncConfig;
pub use engine::{SyncCycleResult, SyncEngine, SyncStats};
pub use error::{RecordField, SyncError, SyncResult};
pub use host::{run_manual_import, toggle_subscription, CommandResult, CommandStatus};
pub use http::{HttpClient, HttpRecordSource};
pub use record::{ChangeRecord, WireRecord};
pub use source::{FileRecordSource, MockSource, RecordSource};
pub use subscription::SubscriptionController;
pub use timestamp::{Clock, FixedClock, SubscriptionStatus, SyncState, SystemClock, TimestampStore};
