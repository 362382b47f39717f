//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data that satisfies the
//! key-encoding rules (valid prefixes, ids and labels).

use entikv_codec::Value;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for generating valid entity type prefixes.
pub fn prefix_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_-]{0,7}").expect("Invalid regex")
}

/// Strategy for generating valid override ids.
pub fn id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9._-]{0,23}").expect("Invalid regex")
}

/// Strategy for generating labels, including separator characters that
/// are legal inside labels.
pub fn label_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 #/_-]{1,24}").expect("Invalid regex")
}

/// Strategy for generating distinct labels.
pub fn distinct_labels_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(label_strategy(), 0..=max).prop_map(|set| set.into_iter().collect())
}

/// Strategy for generating attribute values up to two levels deep.
pub fn attribute_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        "[a-z ]{0,12}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Map),
        ]
    })
}

/// Strategy for generating free-form attribute maps.
///
/// Names carry an `attr_` prefix so they never hit a reserved name.
pub fn attributes_strategy() -> impl Strategy<Value = BTreeMap<String, Value>> {
    prop::collection::btree_map("attr_[a-z]{1,8}", attribute_value_strategy(), 0..6)
}

/// A sequence of counter steps: `true` increments, `false` decrements.
pub fn counter_steps_strategy(max: usize) -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..=max)
}

/// Configuration for property tests.
pub struct PropTestConfig;

impl PropTestConfig {
    /// Returns a config suitable for quick tests.
    pub fn quick() -> ProptestConfig {
        ProptestConfig::with_cases(32)
    }

    /// Returns a config suitable for thorough tests.
    pub fn thorough() -> ProptestConfig {
        ProptestConfig::with_cases(512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entikv_core::keys::{validate_id, validate_label, validate_prefix};
    use entikv_core::RESERVED_ATTRIBUTES;

    proptest! {
        #[test]
        fn generated_prefixes_are_valid(prefix in prefix_strategy()) {
            prop_assert!(validate_prefix(&prefix).is_ok());
        }

        #[test]
        fn generated_ids_are_valid(id in id_strategy()) {
            prop_assert!(validate_id(&id).is_ok());
        }

        #[test]
        fn generated_labels_are_valid(label in label_strategy()) {
            prop_assert!(validate_label(&label).is_ok());
        }

        #[test]
        fn generated_attributes_avoid_reserved_names(attrs in attributes_strategy()) {
            for name in RESERVED_ATTRIBUTES {
                prop_assert!(!attrs.contains_key(name));
            }
        }
    }
}
