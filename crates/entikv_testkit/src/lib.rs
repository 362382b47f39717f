//! # EntiKV Testkit
//!
//! Shared test support for the EntiKV crates: in-memory tables seeded
//! with category and workspace entities, proptest strategies for keys and
//! attributes, store wrappers that count calls or inject failures, thread
//! stress drivers, and a `tracing` subscriber wired to the test harness.
//!
//! Most tests only need the prelude:
//!
//! ```rust
//! use entikv_testkit::prelude::*;
//!
//! init_tracing();
//! with_test_table(|table| {
//!     let (parent, children) = scenarios::populated_category(table, "P", 2);
//!     let (_, workspaces) = scenarios::collections(table);
//!     assert_eq!(workspaces.all(Some(&parent), &[]).unwrap().len(), children.len());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod logging;
pub mod stress;

/// Everything a test usually imports.
pub mod prelude {
    pub use crate::faults::{FaultyStore, RecordingStore, StoreCall};
    pub use crate::fixtures::{scenarios, with_test_table, TestTable, TEST_TABLE};
    pub use crate::generators::*;
    pub use crate::logging::init_tracing;
    pub use crate::stress::{run_concurrently, stress_counter, stress_label_race, StressConfig, StressReport};
}
