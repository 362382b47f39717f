//! Handle binding a key-value store to one table.

use crate::config::ClientConfig;
use crate::error::CoreResult;
use entikv_codec::Item;
use entikv_store::{
    Condition, ExpressionValues, ItemKey, KvStore, ScanPage, ScanRequest, StoreResult, TransactOp,
    UpdateExpression,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A shared handle to one table of a [`KvStore`].
///
/// Cloning is cheap; clones share the store and configuration. Every store
/// call goes through [`StoreClient::guard`], which logs a failure once and
/// hands the error back unchanged so callers can still interpret it.
#[derive(Clone)]
pub struct StoreClient {
    store: Arc<dyn KvStore>,
    config: Arc<ClientConfig>,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    /// Binds `store` to the configured table.
    ///
    /// # Errors
    ///
    /// Returns `TableNotFound` if the table does not exist, or `Backend`
    /// if the store cannot be reached.
    pub fn connect(store: Arc<dyn KvStore>, config: ClientConfig) -> CoreResult<Self> {
        let client = Self {
            store,
            config: Arc::new(config),
        };
        let description = client.guard("describe_table", |store, table| store.describe_table(table))?;
        info!(
            table = %description.name,
            items = description.item_count,
            "connected to table"
        );
        Ok(client)
    }

    /// Returns the table name.
    pub fn table(&self) -> &str {
        &self.config.table_name
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Runs one store call, logging its failure once.
    fn guard<T>(
        &self,
        operation: &'static str,
        call: impl FnOnce(&dyn KvStore, &str) -> StoreResult<T>,
    ) -> StoreResult<T> {
        debug!(table = %self.config.table_name, operation, "store call");
        call(self.store.as_ref(), &self.config.table_name).map_err(|err| {
            error!(
                table = %self.config.table_name,
                operation,
                code = err.code(),
                "{err}"
            );
            err
        })
    }

    /// Reads one item.
    pub fn get(&self, key: &ItemKey) -> StoreResult<Option<Item>> {
        let consistent = self.config.consistent_reads;
        self.guard("get_item", |store, table| {
            store.get_item(table, key, consistent)
        })
    }

    /// Writes one item under an optional condition.
    pub fn put(&self, item: Item, condition: Option<&Condition>) -> StoreResult<()> {
        self.guard("put_item", |store, table| store.put_item(table, item, condition))
    }

    /// Applies an update to one item, returning the written attributes.
    pub fn update(
        &self,
        key: &ItemKey,
        expression: &UpdateExpression,
        values: &ExpressionValues,
        condition: Option<&Condition>,
    ) -> StoreResult<Item> {
        self.guard("update_item", |store, table| {
            store.update_item(table, key, expression, values, condition)
        })
    }

    /// Applies operations atomically.
    pub fn transact_write(&self, ops: Vec<TransactOp>) -> StoreResult<()> {
        let kinds: Vec<&str> = ops.iter().map(TransactOp::kind).collect();
        debug!(table = %self.config.table_name, ops = ?kinds, "transaction");
        self.guard("transact_write", |store, _| store.transact_write(ops))
    }

    /// Reads one scan page.
    pub fn scan(&self, request: &ScanRequest) -> StoreResult<ScanPage> {
        self.guard("scan", |store, table| store.scan(table, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use entikv_store::{InMemoryStore, StoreError};

    fn client() -> StoreClient {
        let store = Arc::new(InMemoryStore::new().with_table("t"));
        StoreClient::connect(store, ClientConfig::new("t")).unwrap()
    }

    #[test]
    fn connect_requires_table() {
        let store = Arc::new(InMemoryStore::new());
        let err = StoreClient::connect(store, ClientConfig::new("missing")).unwrap_err();
        assert!(matches!(err, CoreError::TableNotFound { ref table } if table == "missing"));
    }

    #[test]
    fn errors_pass_through_unchanged() {
        let client = client();
        let item = ItemKey::new("a", "a").to_item();
        let absent = Condition::item_absent();
        client.put(item.clone(), Some(&absent)).unwrap();

        let err = client.put(item, Some(&absent)).unwrap_err();
        assert!(matches!(err, StoreError::ConditionalCheckFailed));
    }

    #[test]
    fn clones_share_the_store() {
        let client = client();
        let other = client.clone();
        client.put(ItemKey::new("a", "a").to_item(), None).unwrap();
        assert!(other.get(&ItemKey::new("a", "a")).unwrap().is_some());
        assert_eq!(other.table(), "t");
    }
}
