//! Attribute payloads merged into stored rows.

use crate::error::{CoreError, CoreResult};
use crate::keys::validate_label;
use chrono::{DateTime, SecondsFormat, Utc};
use entikv_codec::{Item, Value};
use entikv_store::{PARTITION_KEY, SORT_KEY};
use std::collections::BTreeMap;

/// Attribute holding an entity's id.
pub const ID_ATTRIBUTE: &str = "id";
/// Attribute holding an entity's label.
pub const LABEL_ATTRIBUTE: &str = "label";
/// Attribute holding the creation timestamp.
pub const CREATED_AT_ATTRIBUTE: &str = "created_at";
/// Attribute holding the last serialization timestamp.
pub const UPDATED_AT_ATTRIBUTE: &str = "updated_at";

/// Attribute names managed by EntiKV that free-form attributes may not use.
pub const RESERVED_ATTRIBUTES: [&str; 6] = [
    PARTITION_KEY,
    SORT_KEY,
    ID_ATTRIBUTE,
    LABEL_ATTRIBUTE,
    CREATED_AT_ATTRIBUTE,
    UPDATED_AT_ATTRIBUTE,
];

/// Formats a timestamp as RFC 3339 UTC with microseconds, e.g.
/// `2024-01-02T03:04:05.000006Z`. The fixed width keeps timestamps
/// lexically sortable.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A label, free-form attributes and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRecord {
    label: String,
    attributes: BTreeMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AttributeRecord {
    /// Creates a record with no attributes, stamped now.
    pub fn new(label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            label: label.into(),
            attributes: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a record from a JSON object of attributes.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `attributes` is not an object or holds
    /// a value with no attribute equivalent (non-integral numbers).
    pub fn from_json(label: impl Into<String>, attributes: serde_json::Value) -> CoreResult<Self> {
        let serde_json::Value::Object(fields) = attributes else {
            return Err(CoreError::validation("attributes must be a JSON object"));
        };
        let mut record = Self::new(label);
        for (name, value) in fields {
            let value = Value::try_from(value)
                .map_err(|e| CoreError::validation(format!("attribute {name}: {e}")))?;
            record.attributes.insert(name, value);
        }
        Ok(record)
    }

    /// Replaces all attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: BTreeMap<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets one attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Keeps an earlier creation time, e.g. when rebuilding a record.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Returns the label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the free-form attributes.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Returns the creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the time of the last [`serialize`](Self::serialize).
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Checks the label and that no attribute uses a reserved name.
    ///
    /// # Errors
    ///
    /// Returns a validation error describing the first problem.
    pub fn validate(&self) -> CoreResult<()> {
        validate_label(&self.label)?;
        if let Some(name) = RESERVED_ATTRIBUTES
            .iter()
            .find(|name| self.attributes.contains_key(**name))
        {
            return Err(CoreError::validation(format!(
                "attribute name {name} is reserved"
            )));
        }
        Ok(())
    }

    /// Produces the stored payload: label, timestamps and attributes.
    ///
    /// Refreshes `updated_at` on every call.
    pub fn serialize(&mut self) -> Item {
        self.updated_at = Utc::now();
        let mut item = self.attributes.clone();
        item.insert(LABEL_ATTRIBUTE.to_string(), Value::from(self.label.as_str()));
        item.insert(
            CREATED_AT_ATTRIBUTE.to_string(),
            Value::Text(format_timestamp(self.created_at)),
        );
        item.insert(
            UPDATED_AT_ATTRIBUTE.to_string(),
            Value::Text(format_timestamp(self.updated_at)),
        );
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn serialize_merges_attributes() {
        let mut record = AttributeRecord::new("red")
            .with_attribute("test_attribute", Value::map([("color", "blue")]));
        let item = record.serialize();

        assert_eq!(item.get("label"), Some(&Value::from("red")));
        assert_eq!(
            item.get("test_attribute").and_then(|v| v.get("color")),
            Some(&Value::from("blue"))
        );
        assert!(item.contains_key("created_at"));
        assert!(item.contains_key("updated_at"));
    }

    #[test]
    fn serialize_refreshes_updated_at() {
        let created = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let mut record = AttributeRecord::new("red").with_created_at(created);
        let item = record.serialize();

        assert_eq!(
            item.get("created_at"),
            Some(&Value::from("2020-01-01T00:00:00.000000Z"))
        );
        assert!(record.updated_at() > created);
        assert_eq!(record.created_at(), created);
    }

    #[test]
    fn timestamps_have_fixed_width() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::microseconds(6);
        assert_eq!(format_timestamp(at), "2024-01-02T03:04:05.000006Z");
    }

    #[test]
    fn from_json_converts_payload() {
        let record = AttributeRecord::from_json("red", json!({ "size": 3, "tags": ["a"] })).unwrap();
        assert_eq!(record.attributes().get("size"), Some(&Value::Integer(3)));
        assert_eq!(record.label(), "red");
    }

    #[test]
    fn from_json_rejects_floats_and_non_objects() {
        assert!(matches!(
            AttributeRecord::from_json("red", json!({ "ratio": 1.5 })),
            Err(CoreError::Validation { .. })
        ));
        assert!(AttributeRecord::from_json("red", json!([1, 2])).is_err());
    }

    #[test]
    fn reserved_names_fail_validation() {
        for name in RESERVED_ATTRIBUTES {
            let record = AttributeRecord::new("red").with_attribute(name, "x");
            assert!(record.validate().is_err(), "{name} accepted");
        }
        assert!(AttributeRecord::new("red").with_attribute("color", "x").validate().is_ok());
        assert!(AttributeRecord::new("").validate().is_err());
    }
}
