//! Test fixtures and table helpers.
//!
//! Provides an in-memory table wired to a client, plus common entity
//! scenarios built on top of it.

use entikv_core::{ClientConfig, EntityCollection, EntityType, StoreClient};
use entikv_store::{InMemoryStore, KvStore, StoreConfig};
use std::sync::Arc;

/// Table name used by every fixture.
pub const TEST_TABLE: &str = "entikv-test";

/// An in-memory table with a connected client.
pub struct TestTable {
    /// The backing store, for inspecting raw rows.
    pub store: Arc<InMemoryStore>,
    /// A client bound to [`TEST_TABLE`].
    pub client: StoreClient,
}

impl TestTable {
    /// Creates an empty table with default limits.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default(), ClientConfig::new(TEST_TABLE))
    }

    /// Creates an empty table whose scans return at most `page_size` rows
    /// per page.
    pub fn paged(page_size: usize) -> Self {
        Self::with_config(
            StoreConfig::default(),
            ClientConfig::new(TEST_TABLE).scan_page_size(Some(page_size)),
        )
    }

    /// Creates an empty table with explicit store and client settings.
    ///
    /// The client's table name is replaced by [`TEST_TABLE`].
    pub fn with_config(store_config: StoreConfig, client_config: ClientConfig) -> Self {
        let store = Arc::new(InMemoryStore::with_config(store_config).with_table(TEST_TABLE));
        let client_config = ClientConfig {
            table_name: TEST_TABLE.to_string(),
            ..client_config
        };
        let client = StoreClient::connect(store.clone(), client_config)
            .expect("Failed to connect to in-memory table");
        Self { store, client }
    }

    /// Returns a collection for `entity_type` on this table.
    pub fn collection(&self, entity_type: EntityType) -> EntityCollection {
        EntityCollection::new(self.client.clone(), entity_type)
    }

    /// Returns the number of stored rows, shadow rows included.
    pub fn row_count(&self) -> usize {
        self.store
            .describe_table(TEST_TABLE)
            .expect("Test table should exist")
            .item_count
    }
}

impl Default for TestTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test against a fresh in-memory table.
///
/// # Example
///
/// ```rust
/// use entikv_testkit::fixtures::with_test_table;
///
/// with_test_table(|table| {
///     assert_eq!(table.row_count(), 0);
/// });
/// ```
pub fn with_test_table<F, R>(f: F) -> R
where
    F: FnOnce(&TestTable) -> R,
{
    let table = TestTable::new();
    f(&table)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use entikv_core::{AttributeRecord, CreateOptions, EntityItem};

    /// Counter on a category row tracking its workspaces.
    pub const WORKSPACE_COUNTER: &str = "workspace_count";

    /// A top-level "workspace category" type and its "workspace" children.
    pub fn category_and_workspace() -> (EntityType, EntityType) {
        let category = EntityType::new("wc").expect("Valid prefix");
        let workspace = EntityType::composite("w", &category).expect("Valid composite type");
        (category, workspace)
    }

    /// Collections for [`category_and_workspace`] on `table`.
    pub fn collections(table: &TestTable) -> (EntityCollection, EntityCollection) {
        let (category, workspace) = category_and_workspace();
        (table.collection(category), table.collection(workspace))
    }

    /// Creates one category labelled `label` holding `children` workspaces,
    /// counting them on [`WORKSPACE_COUNTER`].
    pub fn populated_category(
        table: &TestTable,
        label: &str,
        children: usize,
    ) -> (EntityItem, Vec<EntityItem>) {
        let (categories, workspaces) = collections(table);
        let parent = categories
            .create(None, AttributeRecord::new(label), CreateOptions::new())
            .expect("Failed to create category");

        let options = CreateOptions::new().with_parent_counter(WORKSPACE_COUNTER);
        let items = (0..children)
            .map(|i| {
                workspaces
                    .create(
                        Some(&parent),
                        AttributeRecord::new(format!("workspace-{i}")),
                        options.clone(),
                    )
                    .expect("Failed to create workspace")
            })
            .collect();

        (parent, items)
    }
}
