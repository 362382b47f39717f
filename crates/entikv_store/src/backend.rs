//! Key-value store trait definition.

use crate::error::StoreResult;
use crate::expression::{Condition, ExpressionValues, UpdateExpression};
use crate::key::ItemKey;
use crate::request::{ScanPage, ScanRequest, TableDescription, TransactOp};
use entikv_codec::Item;

/// A flat, table-oriented key-value store.
///
/// Stores hold rows addressed by a two-part [`ItemKey`] and understand
/// nothing about entities, labels or hierarchies. EntiKV owns the key
/// layout; the store only guarantees the primitives below.
///
/// # Invariants
///
/// - A conditional write evaluates its condition and applies atomically
/// - `transact_write` applies every operation or none of them
/// - `scan` visits rows in a stable order and resumes strictly after the
///   supplied cursor
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and embedded use
pub trait KvStore: Send + Sync {
    /// Returns metadata about `table`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TableNotFound`](crate::StoreError::TableNotFound)
    /// if the table does not exist.
    fn describe_table(&self, table: &str) -> StoreResult<TableDescription>;

    /// Reads one item.
    ///
    /// Returns `None` if no item exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist or the store fails.
    fn get_item(&self, table: &str, key: &ItemKey, consistent: bool) -> StoreResult<Option<Item>>;

    /// Writes one item, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The condition does not hold (`ConditionalCheckFailed`)
    /// - The item has no text `PK`/`SK`
    /// - The table does not exist
    fn put_item(&self, table: &str, item: Item, condition: Option<&Condition>) -> StoreResult<()>;

    /// Applies an update expression to one item, creating it when absent
    /// unless the condition forbids it.
    ///
    /// Returns the new values of the attributes written by the update.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The condition does not hold (`ConditionalCheckFailed`)
    /// - The expression is invalid or cannot be applied to the item
    /// - The table does not exist
    fn update_item(
        &self,
        table: &str,
        key: &ItemKey,
        update: &UpdateExpression,
        values: &ExpressionValues,
        condition: Option<&Condition>,
    ) -> StoreResult<Item>;

    /// Applies a bounded set of operations atomically.
    ///
    /// No two operations may target the same item.
    ///
    /// # Errors
    ///
    /// Returns `TransactionCanceled` with one reason slot per operation if
    /// any condition fails or any update cannot be applied; nothing is
    /// written in that case. Returns a validation error for malformed or
    /// oversized transactions.
    fn transact_write(&self, ops: Vec<TransactOp>) -> StoreResult<()>;

    /// Reads one page of a full-table scan.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid, the cursor is not one
    /// this store issued, or the table does not exist.
    fn scan(&self, table: &str, request: &ScanRequest) -> StoreResult<ScanPage>;
}
