//! In-memory key-value store.

use crate::backend::KvStore;
use crate::config::StoreConfig;
use crate::error::{CancellationReason, StoreError, StoreResult};
use crate::expression::{project, Condition, ExpressionValues, UpdateExpression};
use crate::key::ItemKey;
use crate::request::{Cursor, ScanPage, ScanRequest, TableDescription, TransactOp};
use entikv_codec::{Encode, Item};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

type Table = BTreeMap<ItemKey, Item>;

/// An in-memory key-value store.
///
/// Rows live in ordered maps keyed by `(PK, SK)`, one map per table, so
/// scans visit rows in key order. Every write takes the single write lock,
/// which makes conditional writes and transactions trivially atomic.
///
/// This store is suitable for:
/// - Unit and integration tests
/// - Embedded use where persistence is not needed
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads behind an
/// `Arc`.
///
/// # Example
///
/// ```rust
/// use entikv_store::{InMemoryStore, ItemKey, KvStore};
///
/// let store = InMemoryStore::new().with_table("entities");
/// store.put_item("entities", ItemKey::new("wc#1", "wc#1").to_item(), None).unwrap();
///
/// let item = store.get_item("entities", &ItemKey::new("wc#1", "wc#1"), true).unwrap();
/// assert!(item.is_some());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<BTreeMap<String, Table>>,
    config: StoreConfig,
}

impl InMemoryStore {
    /// Creates a new store with no tables and default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new store with the given limits.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Adds an empty table, keeping it if it already exists.
    #[must_use]
    pub fn with_table(self, name: impl Into<String>) -> Self {
        self.tables.write().entry(name.into()).or_default();
        self
    }

    /// Creates an empty table.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the table already exists.
    pub fn create_table(&self, name: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(StoreError::validation(format!("table {name} already exists")));
        }
        tables.insert(name.to_string(), Table::new());
        Ok(())
    }

    /// Returns the configured limits.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns a copy of every row of `table`, in key order.
    ///
    /// Useful for testing and debugging.
    ///
    /// # Errors
    ///
    /// Returns `TableNotFound` if the table does not exist.
    pub fn items(&self, table: &str) -> StoreResult<Vec<Item>> {
        let tables = self.tables.read();
        Ok(lookup(&tables, table)?.values().cloned().collect())
    }

    /// Removes every row, keeping the tables.
    pub fn clear(&self) {
        for table in self.tables.write().values_mut() {
            table.clear();
        }
    }

    fn check_transaction(&self, ops: &[TransactOp]) -> StoreResult<Vec<ItemKey>> {
        if ops.is_empty() {
            return Err(StoreError::validation("transaction has no operations"));
        }
        if ops.len() > self.config.max_transact_items {
            return Err(StoreError::validation(format!(
                "transaction has {} operations, at most {} allowed",
                ops.len(),
                self.config.max_transact_items
            )));
        }

        let mut seen = BTreeSet::new();
        let mut targets = Vec::with_capacity(ops.len());
        for op in ops {
            let key = op.target()?;
            if let TransactOp::Update {
                expression, values, ..
            } = op
            {
                expression.validate(values)?;
            }
            if !seen.insert((op.table(), key.clone())) {
                return Err(StoreError::validation(format!(
                    "transaction has more than one operation on item {key}"
                )));
            }
            targets.push(key);
        }
        Ok(targets)
    }
}

fn lookup<'a>(tables: &'a BTreeMap<String, Table>, name: &str) -> StoreResult<&'a Table> {
    tables.get(name).ok_or_else(|| StoreError::TableNotFound {
        table: name.to_string(),
    })
}

fn lookup_mut<'a>(
    tables: &'a mut BTreeMap<String, Table>,
    name: &str,
) -> StoreResult<&'a mut Table> {
    tables.get_mut(name).ok_or_else(|| StoreError::TableNotFound {
        table: name.to_string(),
    })
}

fn check(condition: Option<&Condition>, existing: Option<&Item>) -> bool {
    condition.map_or(true, |c| c.holds(existing))
}

impl KvStore for InMemoryStore {
    fn describe_table(&self, table: &str) -> StoreResult<TableDescription> {
        let tables = self.tables.read();
        Ok(TableDescription {
            name: table.to_string(),
            item_count: lookup(&tables, table)?.len(),
        })
    }

    fn get_item(&self, table: &str, key: &ItemKey, _consistent: bool) -> StoreResult<Option<Item>> {
        let tables = self.tables.read();
        Ok(lookup(&tables, table)?.get(key).cloned())
    }

    fn put_item(&self, table: &str, item: Item, condition: Option<&Condition>) -> StoreResult<()> {
        let key = ItemKey::from_item(&item)?;
        let mut tables = self.tables.write();
        let rows = lookup_mut(&mut tables, table)?;
        if !check(condition, rows.get(&key)) {
            return Err(StoreError::ConditionalCheckFailed);
        }
        rows.insert(key, item);
        Ok(())
    }

    fn update_item(
        &self,
        table: &str,
        key: &ItemKey,
        update: &UpdateExpression,
        values: &ExpressionValues,
        condition: Option<&Condition>,
    ) -> StoreResult<Item> {
        update.validate(values)?;
        let mut tables = self.tables.write();
        let rows = lookup_mut(&mut tables, table)?;
        let existing = rows.get(key);
        if !check(condition, existing) {
            return Err(StoreError::ConditionalCheckFailed);
        }
        let mut next = existing.cloned().unwrap_or_else(|| key.to_item());
        let updated = update.apply(&mut next, values)?;
        rows.insert(key.clone(), next);
        Ok(updated)
    }

    fn transact_write(&self, ops: Vec<TransactOp>) -> StoreResult<()> {
        let targets = self.check_transaction(&ops)?;
        let mut tables = self.tables.write();
        for op in &ops {
            lookup(&tables, op.table())?;
        }

        // Evaluate every operation against the current state before
        // touching anything; targets are distinct so results are independent.
        let mut reasons = Vec::with_capacity(ops.len());
        let mut staged = Vec::with_capacity(ops.len());
        for (op, key) in ops.iter().zip(&targets) {
            let existing = lookup(&tables, op.table())?.get(key);
            if !check(op.condition(), existing) {
                reasons.push(Some(CancellationReason::ConditionalCheckFailed));
                continue;
            }
            let next = match op {
                TransactOp::Put { item, .. } => Ok(item.clone()),
                TransactOp::Update {
                    expression, values, ..
                } => {
                    let mut next = existing.cloned().unwrap_or_else(|| key.to_item());
                    expression.apply(&mut next, values).map(|_| next)
                }
            };
            match next {
                Ok(next) => {
                    reasons.push(None);
                    staged.push((op.table(), key, next));
                }
                Err(e) => reasons.push(Some(CancellationReason::ValidationError(e.to_string()))),
            }
        }

        if reasons.iter().any(Option::is_some) {
            return Err(StoreError::TransactionCanceled { reasons });
        }

        for (table, key, item) in staged {
            lookup_mut(&mut tables, table)?.insert(key.clone(), item);
        }
        Ok(())
    }

    fn scan(&self, table: &str, request: &ScanRequest) -> StoreResult<ScanPage> {
        request.validate()?;
        let start = match &request.exclusive_start {
            Some(cursor) => Bound::Excluded(cursor.key()?),
            None => Bound::Unbounded,
        };
        let limit = request
            .limit
            .unwrap_or(self.config.max_page_items)
            .min(self.config.max_page_items)
            .max(1);

        let tables = self.tables.read();
        let rows = lookup(&tables, table)?;

        let mut page = ScanPage::default();
        let mut bytes = 0usize;
        for (key, item) in rows.range((start, Bound::Unbounded)) {
            page.scanned_count += 1;
            bytes = bytes.saturating_add(item.encode()?.len());

            let matched = match &request.filter {
                Some(filter) => filter.matches(item, &request.names, &request.values)?,
                None => true,
            };
            if matched {
                page.items.push(project(item, &request.projection, &request.names)?);
            }

            // A full page always carries a cursor, even when it ends at the
            // last row; the following page is then empty.
            if page.scanned_count >= limit || bytes >= self.config.max_page_bytes {
                page.last_evaluated = Some(Cursor::for_key(key)?);
                break;
            }
        }
        Ok(page)
    }
}
