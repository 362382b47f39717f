//! # EntiKV Store
//!
//! The key-value store abstraction EntiKV is built on, plus an in-memory
//! implementation.
//!
//! Stores are **flat tables of rows** addressed by a partition key and a
//! sort key. They know nothing about entities, labels or hierarchies; the
//! core crate owns the key layout.
//!
//! ## Primitives
//!
//! - Consistent single-item get
//! - Single-item put and update, optionally conditioned on the current row
//! - Atomic, bounded multi-item transactional writes
//! - Full-table scan with server-side filtering, projection and opaque
//!   cursor pagination
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and embedded use
//!
//! ## Example
//!
//! ```rust
//! use entikv_store::{Condition, InMemoryStore, ItemKey, KvStore, StoreError};
//!
//! let store = InMemoryStore::new().with_table("entities");
//! let item = ItemKey::new("wc#1", "wc#1").to_item();
//! store.put_item("entities", item.clone(), Some(&Condition::item_absent())).unwrap();
//!
//! let again = store.put_item("entities", item, Some(&Condition::item_absent()));
//! assert!(matches!(again, Err(StoreError::ConditionalCheckFailed)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod expression;
mod key;
mod memory;
mod request;

pub use backend::KvStore;
pub use config::StoreConfig;
pub use error::{CancellationReason, StoreError, StoreResult};
pub use expression::{
    project, Condition, ExpressionNames, ExpressionValues, Filter, UpdateAction, UpdateExpression,
};
pub use key::{ItemKey, PARTITION_KEY, SORT_KEY};
pub use memory::InMemoryStore;
pub use request::{Cursor, ScanPage, ScanRequest, TableDescription, TransactOp};

#[cfg(test)]
mod tests {
    use super::*;
    use entikv_codec::Value;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn paging_visits_every_row_once(
            keys in prop::collection::btree_set("[a-z]{1,6}", 0..40),
            limit in 1usize..7,
        ) {
            let store = InMemoryStore::new().with_table("t");
            for key in &keys {
                store.put_item("t", ItemKey::new(key.as_str(), "s").to_item(), None).unwrap();
            }

            let mut seen = Vec::new();
            let mut cursor = None;
            loop {
                let request = ScanRequest::new().with_limit(Some(limit)).starting_after(cursor);
                let page = store.scan("t", &request).unwrap();
                prop_assert!(page.scanned_count <= limit);
                seen.extend(page.items);
                cursor = page.last_evaluated;
                if cursor.is_none() {
                    break;
                }
            }

            let expected: Vec<Value> = keys.iter().map(|k| Value::from(k.as_str())).collect();
            let actual: Vec<Value> = seen.iter().map(|i| i[PARTITION_KEY].clone()).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
