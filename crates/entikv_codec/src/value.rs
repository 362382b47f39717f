//! The attribute value union.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One stored row, keyed by attribute name.
///
/// Rows written through `entikv_store` always hold text `PK` and `SK`
/// attributes.
pub type Item = BTreeMap<String, Value>;

/// Every shape an attribute can take.
///
/// There is no float variant. Counters are integers, and a value must
/// encode to a single canonical byte string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Absent or explicit null.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// Any `i64`.
    Integer(i64),
    /// Opaque bytes.
    Bytes(Vec<u8>),
    /// UTF-8 text.
    Text(String),
    /// Ordered values.
    List(Vec<Value>),
    /// Nested attributes.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Builds a map from `(name, value)` pairs.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Lower-case name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Orders two values the way key and range predicates see them.
    ///
    /// Only text, integers and bytes are ordered, and only against their
    /// own kind; every other pairing gives `None`.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        Some(match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            _ => return None,
        })
    }

    /// The integer, if this is one.
    pub fn as_integer(&self) -> Option<i64> {
        if let Self::Integer(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    /// The text, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        if let Self::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }

    /// The bytes, if this is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let Self::Bytes(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Looks up a nested attribute; `None` unless this is a map holding `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(entries) => entries.get(key),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($source:ty => |$v:ident| $body:expr;)*) => {
        $(
            impl From<$source> for Value {
                fn from($v: $source) -> Self {
                    $body
                }
            }
        )*
    };
}

value_from! {
    () => |_unit| Value::Null;
    bool => |b| Value::Bool(b);
    i64 => |n| Value::Integer(n);
    i32 => |n| Value::Integer(i64::from(n));
    u32 => |n| Value::Integer(i64::from(n));
    String => |s| Value::Text(s);
    &str => |s| Value::Text(s.to_owned());
    Vec<u8> => |bytes| Value::Bytes(bytes);
    &[u8] => |bytes| Value::Bytes(bytes.to_vec());
    Vec<Value> => |items| Value::List(items);
    BTreeMap<String, Value> => |entries| Value::Map(entries);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_lookup() {
        let attrs = Value::map([("color", "blue"), ("shade", "navy")]);
        assert_eq!(attrs.get("color").and_then(Value::as_text), Some("blue"));
        assert_eq!(attrs.get("size"), None);
        assert_eq!(Value::from("color").get("color"), None);
    }

    #[test]
    fn sort_key_text_orders_by_bytes() {
        let first = Value::from("w#0001");
        let sentinel = Value::from("w#~");
        assert_eq!(first.compare(&sentinel), Some(Ordering::Less));
        // '#' (0x23) sorts below '$' (0x24), so "wc#.." never mixes with "wc$.."
        assert_eq!(
            Value::from("wc#z").compare(&Value::from("wc$a")),
            Some(Ordering::Less)
        );
        assert_eq!(Value::from(-3i64).compare(&Value::from(2i64)), Some(Ordering::Less));
    }

    #[test]
    fn unlike_kinds_do_not_order() {
        assert_eq!(Value::from(7i64).compare(&Value::from("7")), None);
        assert_eq!(Value::from(true).compare(&Value::from(true)), None);
        assert_eq!(Value::List(vec![]).compare(&Value::List(vec![])), None);
    }

    #[test]
    fn accessors_check_the_variant() {
        assert_eq!(Value::from(12i32).as_integer(), Some(12));
        assert_eq!(Value::from("12").as_integer(), None);
        assert_eq!(Value::from(&b"ab"[..]).as_bytes(), Some(&b"ab"[..]));
        assert_eq!(Value::from(()).as_text(), None);
    }

    #[test]
    fn names_for_messages() {
        assert_eq!(Value::from(vec![Value::Null]).type_name(), "list");
        assert_eq!(Value::from(5u32).type_name(), "integer");
        assert_eq!(Value::from(Item::new()).type_name(), "map");
    }
}
