//! # EntiKV Core
//!
//! Hierarchical entities on a flat key-value store.
//!
//! EntiKV maps a two-level entity hierarchy onto a single table that only
//! offers conditional single-item writes, transactional multi-item writes
//! and paginated scans:
//!
//! - Each entity type has a key prefix; child types nest under one parent
//!   type and their rows are keyed under the parent instance
//! - Labels are unique per scope, enforced by a shadow row written in the
//!   same transaction as the entity
//! - Counters change only through atomic adds
//! - Listing scans the table with a key-range filter and follows cursors
//!   until the store has nothing left
//!
//! ## Example
//!
//! ```rust
//! use entikv_core::{
//!     AttributeRecord, ClientConfig, CreateOptions, EntityCollection, EntityType, StoreClient,
//! };
//! use entikv_store::InMemoryStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryStore::new().with_table("entities"));
//! let client = StoreClient::connect(store, ClientConfig::new("entities")).unwrap();
//!
//! let category = EntityType::new("wc").unwrap();
//! let workspace = EntityType::composite("w", &category).unwrap();
//! let categories = EntityCollection::new(client.clone(), category);
//! let workspaces = EntityCollection::new(client, workspace);
//!
//! let parent = categories
//!     .create(None, AttributeRecord::new("P"), CreateOptions::new())
//!     .unwrap();
//! workspaces
//!     .create(Some(&parent), AttributeRecord::new("red"), CreateOptions::new())
//!     .unwrap();
//!
//! assert_eq!(workspaces.all(Some(&parent), &[]).unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod collection;
mod config;
mod error;
mod id;
pub mod keys;
mod record;
mod scan;

pub use client::StoreClient;
pub use collection::{CreateOptions, EntityCollection, EntityItem};
pub use config::{ClientConfig, DEFAULT_TABLE_NAME};
pub use error::{ConflictKind, CoreError, CoreResult};
pub use id::new_id;
pub use keys::{EntityType, KeyRange};
pub use record::{
    format_timestamp, AttributeRecord, CREATED_AT_ATTRIBUTE, ID_ATTRIBUTE, LABEL_ATTRIBUTE,
    RESERVED_ATTRIBUTES, UPDATED_AT_ATTRIBUTE,
};
pub use scan::PagedScanner;
