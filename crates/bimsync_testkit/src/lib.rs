//! # bimsync Testkit
//!
//! Test utilities for bimsync.
//!
//! This crate provides:
//! - Door document fixtures with the rating and label fields in place
//! - Mock-backed engines with a fixed clock
//! - Record feed files for the file source and the CLI
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bimsync_testkit::prelude::*;
//!
//! #[test]
//! fn imports_one_door() {
//!     let doc = door_document(PROJECT_ID, &["A1"]);
//!     let engine = mock_engine(vec![ChangeRecord::new("A1", 90.0, "FR90", 100)]);
//!     engine.synchronize(&doc, PROJECT_ID, 0).unwrap();
//!     assert_eq!(rating_of(&doc, "A1"), Some(90.0));
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use bimsync_engine::ChangeRecord;
}

pub use fixtures::*;
pub use generators::*;
