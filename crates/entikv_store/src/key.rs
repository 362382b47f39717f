//! Primary keys of stored rows.

use crate::error::{StoreError, StoreResult};
use entikv_codec::{Item, Value};
use std::fmt;

/// Attribute holding the partition key of every row.
pub const PARTITION_KEY: &str = "PK";

/// Attribute holding the sort key of every row.
pub const SORT_KEY: &str = "SK";

/// The two-part primary key of a row.
///
/// Keys order by partition key, then sort key, both compared bytewise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    /// Partition key.
    pub partition: String,
    /// Sort key.
    pub sort: String,
}

impl ItemKey {
    /// Creates a key from its two parts.
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    /// Extracts the key from an item's `PK` and `SK` attributes.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either attribute is missing or is
    /// not text.
    pub fn from_item(item: &Item) -> StoreResult<Self> {
        let part = |name: &str| {
            item.get(name)
                .and_then(Value::as_text)
                .map(str::to_string)
                .ok_or_else(|| StoreError::validation(format!("item has no text attribute {name}")))
        };
        Ok(Self {
            partition: part(PARTITION_KEY)?,
            sort: part(SORT_KEY)?,
        })
    }

    /// Returns the key as a two-attribute item.
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(PARTITION_KEY.to_string(), Value::Text(self.partition.clone()));
        item.insert(SORT_KEY.to_string(), Value::Text(self.sort.clone()));
        item
    }

    /// Returns true if `name` is one of the key attributes.
    pub fn is_key_attribute(name: &str) -> bool {
        name == PARTITION_KEY || name == SORT_KEY
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.partition, self.sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_roundtrip() {
        let key = ItemKey::new("wc#1", "wc#1");
        assert_eq!(ItemKey::from_item(&key.to_item()).unwrap(), key);
    }

    #[test]
    fn missing_sort_key_is_rejected() {
        let mut item = Item::new();
        item.insert(PARTITION_KEY.to_string(), Value::from("wc#1"));
        assert!(matches!(
            ItemKey::from_item(&item),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn non_text_key_is_rejected() {
        let mut item = ItemKey::new("a", "b").to_item();
        item.insert(SORT_KEY.to_string(), Value::Integer(1));
        assert!(ItemKey::from_item(&item).is_err());
    }

    #[test]
    fn ordering_is_partition_then_sort() {
        let a = ItemKey::new("a", "z");
        let b = ItemKey::new("b", "a");
        let c = ItemKey::new("b", "b");
        assert!(a < b && b < c);
    }
}
