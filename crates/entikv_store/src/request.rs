//! Request and response shapes shared by every store implementation.

use crate::error::{StoreError, StoreResult};
use crate::expression::{Condition, ExpressionNames, ExpressionValues, Filter, UpdateExpression};
use crate::key::ItemKey;
use entikv_codec::{Decode, Encode, Item, Value};

/// One operation of a transactional write.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactOp {
    /// Writes a whole item, replacing any existing one.
    Put {
        /// Target table.
        table: String,
        /// Item to write; must carry `PK` and `SK`.
        item: Item,
        /// Precondition on the current item.
        condition: Option<Condition>,
    },
    /// Applies an update expression to one item.
    Update {
        /// Target table.
        table: String,
        /// Target key.
        key: ItemKey,
        /// Actions to apply.
        expression: UpdateExpression,
        /// Operands referenced by the expression.
        values: ExpressionValues,
        /// Precondition on the current item.
        condition: Option<Condition>,
    },
}

impl TransactOp {
    /// Builds a put operation.
    pub fn put(table: impl Into<String>, item: Item, condition: Option<Condition>) -> Self {
        Self::Put {
            table: table.into(),
            item,
            condition,
        }
    }

    /// Builds an update operation.
    pub fn update(
        table: impl Into<String>,
        key: ItemKey,
        expression: UpdateExpression,
        values: ExpressionValues,
        condition: Option<Condition>,
    ) -> Self {
        Self::Update {
            table: table.into(),
            key,
            expression,
            values,
            condition,
        }
    }

    /// Returns the target table.
    pub fn table(&self) -> &str {
        match self {
            Self::Put { table, .. } | Self::Update { table, .. } => table,
        }
    }

    /// Returns the key of the targeted item.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a put item has no usable key.
    pub fn target(&self) -> StoreResult<ItemKey> {
        match self {
            Self::Put { item, .. } => ItemKey::from_item(item),
            Self::Update { key, .. } => Ok(key.clone()),
        }
    }

    /// Returns the precondition, if any.
    pub fn condition(&self) -> Option<&Condition> {
        match self {
            Self::Put { condition, .. } | Self::Update { condition, .. } => condition.as_ref(),
        }
    }

    /// Short operation name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Put { .. } => "put",
            Self::Update { .. } => "update",
        }
    }
}

/// Opaque pagination cursor.
///
/// Callers pass it back unchanged; only the store interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(Vec<u8>);

impl Cursor {
    /// Encodes the last evaluated key of a page.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the key cannot be encoded.
    pub fn for_key(key: &ItemKey) -> StoreResult<Self> {
        Ok(Self(key.to_item().encode()?))
    }

    /// Decodes the key this cursor points after.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the bytes are not a cursor issued by
    /// a store.
    pub fn key(&self) -> StoreResult<ItemKey> {
        let item = Item::decode(&self.0)
            .map_err(|e| StoreError::validation(format!("invalid cursor: {e}")))?;
        if item.len() != 2 || item.values().any(|v| !matches!(v, Value::Text(_))) {
            return Err(StoreError::validation("invalid cursor: not a key"));
        }
        ItemKey::from_item(&item)
    }

    /// Wraps raw cursor bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the raw cursor bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A full-table scan request for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    /// Server-side predicate; rows that fail it are skipped but still
    /// count against `limit`.
    pub filter: Option<Filter>,
    /// Name placeholders used by the filter and projection.
    pub names: ExpressionNames,
    /// Value placeholders used by the filter.
    pub values: ExpressionValues,
    /// Attributes to return; empty returns whole items.
    pub projection: Vec<String>,
    /// Maximum number of rows evaluated for this page.
    pub limit: Option<usize>,
    /// Resume after this cursor.
    pub exclusive_start: Option<Cursor>,
    /// Request a strongly consistent read.
    pub consistent: bool,
}

impl ScanRequest {
    /// Creates an unfiltered request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter and its placeholders.
    #[must_use]
    pub fn with_filter(
        mut self,
        filter: Filter,
        names: ExpressionNames,
        values: ExpressionValues,
    ) -> Self {
        self.filter = Some(filter);
        self.names = names;
        self.values = values;
        self
    }

    /// Sets the projection.
    #[must_use]
    pub fn with_projection(mut self, projection: Vec<String>) -> Self {
        self.projection = projection;
        self
    }

    /// Sets the page limit.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the read consistency.
    #[must_use]
    pub fn with_consistent(mut self, consistent: bool) -> Self {
        self.consistent = consistent;
        self
    }

    /// Sets the resume cursor.
    #[must_use]
    pub fn starting_after(mut self, cursor: Option<Cursor>) -> Self {
        self.exclusive_start = cursor;
        self
    }

    /// Checks the filter placeholders and projection.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any placeholder does not resolve or
    /// `limit` is zero.
    pub fn validate(&self) -> StoreResult<()> {
        if self.limit == Some(0) {
            return Err(StoreError::validation("scan limit must be positive"));
        }
        if let Some(filter) = &self.filter {
            filter.validate(&self.names, &self.values)?;
        }
        for reference in &self.projection {
            if reference.starts_with('#') && !self.names.contains_key(reference) {
                return Err(StoreError::validation(format!(
                    "undefined name placeholder {reference}"
                )));
            }
        }
        Ok(())
    }
}

/// One page of scan results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    /// Rows that passed the filter, in store order.
    pub items: Vec<Item>,
    /// Present when the scan stopped early; pass back to continue.
    pub last_evaluated: Option<Cursor>,
    /// Rows evaluated for this page, matched or not.
    pub scanned_count: usize,
}

/// Metadata about a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    /// Table name.
    pub name: String,
    /// Number of stored rows.
    pub item_count: usize,
}
