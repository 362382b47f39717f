//! Store wrappers for observing and breaking store calls.
//!
//! [`RecordingStore`] counts calls per kind so tests can prove, for
//! example, that a failed create was not retried or that a scan really
//! spanned several pages. [`FaultyStore`] makes a chosen call fail as if
//! the store were unreachable.

use entikv_codec::Item;
use entikv_store::{
    Condition, ExpressionValues, ItemKey, KvStore, ScanPage, ScanRequest, StoreError, StoreResult,
    TableDescription, TransactOp, UpdateExpression,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The kinds of call a [`KvStore`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreCall {
    /// `describe_table`
    DescribeTable,
    /// `get_item`
    GetItem,
    /// `put_item`
    PutItem,
    /// `update_item`
    UpdateItem,
    /// `transact_write`
    TransactWrite,
    /// `scan`
    Scan,
}

/// Counts every call made through it, then forwards to the inner store.
pub struct RecordingStore {
    inner: Arc<dyn KvStore>,
    calls: Mutex<BTreeMap<StoreCall, usize>>,
}

impl RecordingStore {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn KvStore>) -> Self {
        Self {
            inner,
            calls: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns how many calls of `kind` were made.
    pub fn count(&self, kind: StoreCall) -> usize {
        self.calls.lock().get(&kind).copied().unwrap_or(0)
    }

    /// Forgets all recorded calls.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, kind: StoreCall) {
        *self.calls.lock().entry(kind).or_insert(0) += 1;
    }
}

impl KvStore for RecordingStore {
    fn describe_table(&self, table: &str) -> StoreResult<TableDescription> {
        self.record(StoreCall::DescribeTable);
        self.inner.describe_table(table)
    }

    fn get_item(&self, table: &str, key: &ItemKey, consistent: bool) -> StoreResult<Option<Item>> {
        self.record(StoreCall::GetItem);
        self.inner.get_item(table, key, consistent)
    }

    fn put_item(&self, table: &str, item: Item, condition: Option<&Condition>) -> StoreResult<()> {
        self.record(StoreCall::PutItem);
        self.inner.put_item(table, item, condition)
    }

    fn update_item(
        &self,
        table: &str,
        key: &ItemKey,
        update: &UpdateExpression,
        values: &ExpressionValues,
        condition: Option<&Condition>,
    ) -> StoreResult<Item> {
        self.record(StoreCall::UpdateItem);
        self.inner.update_item(table, key, update, values, condition)
    }

    fn transact_write(&self, ops: Vec<TransactOp>) -> StoreResult<()> {
        self.record(StoreCall::TransactWrite);
        self.inner.transact_write(ops)
    }

    fn scan(&self, table: &str, request: &ScanRequest) -> StoreResult<ScanPage> {
        self.record(StoreCall::Scan);
        self.inner.scan(table, request)
    }
}

/// Fails the n-th call of one kind with [`StoreError::Unavailable`].
///
/// Calls of other kinds, and calls of the chosen kind before the n-th,
/// are forwarded unchanged. Failed calls never reach the inner store.
pub struct FaultyStore {
    inner: Arc<dyn KvStore>,
    kind: StoreCall,
    nth: usize,
    persistent: bool,
    seen: AtomicUsize,
}

impl FaultyStore {
    /// Fails the `nth` (1-based) call of `kind`.
    pub fn new(inner: Arc<dyn KvStore>, kind: StoreCall, nth: usize) -> Self {
        Self {
            inner,
            kind,
            nth,
            persistent: false,
            seen: AtomicUsize::new(0),
        }
    }

    /// Keeps failing every call of the kind from the n-th on.
    #[must_use]
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    fn check(&self, kind: StoreCall) -> StoreResult<()> {
        if kind != self.kind {
            return Ok(());
        }
        let call = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        let fails = if self.persistent {
            call >= self.nth
        } else {
            call == self.nth
        };
        if !fails {
            return Ok(());
        }
        tracing::warn!(call = ?kind, n = call, "injecting store fault");
        Err(StoreError::unavailable(format!(
            "injected fault on {kind:?} call {call}"
        )))
    }
}

impl KvStore for FaultyStore {
    fn describe_table(&self, table: &str) -> StoreResult<TableDescription> {
        self.check(StoreCall::DescribeTable)?;
        self.inner.describe_table(table)
    }

    fn get_item(&self, table: &str, key: &ItemKey, consistent: bool) -> StoreResult<Option<Item>> {
        self.check(StoreCall::GetItem)?;
        self.inner.get_item(table, key, consistent)
    }

    fn put_item(&self, table: &str, item: Item, condition: Option<&Condition>) -> StoreResult<()> {
        self.check(StoreCall::PutItem)?;
        self.inner.put_item(table, item, condition)
    }

    fn update_item(
        &self,
        table: &str,
        key: &ItemKey,
        update: &UpdateExpression,
        values: &ExpressionValues,
        condition: Option<&Condition>,
    ) -> StoreResult<Item> {
        self.check(StoreCall::UpdateItem)?;
        self.inner.update_item(table, key, update, values, condition)
    }

    fn transact_write(&self, ops: Vec<TransactOp>) -> StoreResult<()> {
        self.check(StoreCall::TransactWrite)?;
        self.inner.transact_write(ops)
    }

    fn scan(&self, table: &str, request: &ScanRequest) -> StoreResult<ScanPage> {
        self.check(StoreCall::Scan)?;
        self.inner.scan(table, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entikv_store::InMemoryStore;

    fn memory() -> Arc<dyn KvStore> {
        Arc::new(InMemoryStore::new().with_table("t"))
    }

    #[test]
    fn test_recording_counts_by_kind() {
        let store = RecordingStore::new(memory());
        store.describe_table("t").unwrap();
        store.get_item("t", &ItemKey::new("a", "a"), true).unwrap();
        store.get_item("t", &ItemKey::new("b", "b"), true).unwrap();

        assert_eq!(store.count(StoreCall::DescribeTable), 1);
        assert_eq!(store.count(StoreCall::GetItem), 2);
        assert_eq!(store.count(StoreCall::Scan), 0);

        store.reset();
        assert_eq!(store.count(StoreCall::GetItem), 0);
    }

    #[test]
    fn test_faulty_fails_only_nth_call() {
        let store = FaultyStore::new(memory(), StoreCall::GetItem, 2);
        let key = ItemKey::new("a", "a");
        assert!(store.get_item("t", &key, true).is_ok());
        assert!(matches!(
            store.get_item("t", &key, true),
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.get_item("t", &key, true).is_ok());
        assert!(store.describe_table("t").is_ok());
    }

    #[test]
    fn test_persistent_fault() {
        let store = FaultyStore::new(memory(), StoreCall::Scan, 1).persistent();
        for _ in 0..3 {
            assert!(store.scan("t", &ScanRequest::new()).is_err());
        }
    }
}
