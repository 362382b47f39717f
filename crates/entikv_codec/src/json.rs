//! Conversion between JSON documents and attribute values.
//!
//! JSON is how free-form attribute payloads usually arrive from callers.
//! Conversion validates the payload once, here, so everything past this
//! boundary works on the closed [`Value`] union.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

impl TryFrom<serde_json::Value> for Value {
    type Error = CodecError;

    fn try_from(json: serde_json::Value) -> CodecResult<Self> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => return Err(CodecError::NonIntegralNumber(n.to_string())),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<CodecResult<_>>()?,
            ),
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| Ok((k, Value::try_from(v)?)))
                    .collect::<CodecResult<_>>()?,
            ),
        })
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(n) => serde_json::Value::from(*n),
            // JSON has no byte strings
            Value::Bytes(b) => serde_json::Value::Array(
                b.iter().map(|byte| serde_json::Value::from(*byte)).collect(),
            ),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_object_converts() {
        let value = Value::try_from(json!({
            "test_attribute": { "color": "blue" },
            "sizes": [1, 2, 3],
            "active": true,
            "note": null
        }))
        .unwrap();

        assert_eq!(
            value.get("test_attribute").and_then(|v| v.get("color")),
            Some(&Value::from("blue"))
        );
        assert_eq!(
            value.get("sizes"),
            Some(&Value::List(vec![1i64.into(), 2i64.into(), 3i64.into()]))
        );
        assert_eq!(value.get("active"), Some(&Value::Bool(true)));
        assert_eq!(value.get("note"), Some(&Value::Null));
    }

    #[test]
    fn floats_are_rejected() {
        let err = Value::try_from(json!({ "ratio": 0.5 })).unwrap_err();
        assert!(matches!(err, CodecError::NonIntegralNumber(_)));
    }

    #[test]
    fn unsigned_beyond_i64_is_rejected() {
        let err = Value::try_from(json!(u64::MAX)).unwrap_err();
        assert!(matches!(err, CodecError::NonIntegralNumber(_)));
    }

    #[test]
    fn back_to_json() {
        let value = Value::map([("count", Value::Integer(2)), ("name", Value::from("red"))]);
        assert_eq!(
            serde_json::Value::from(&value),
            json!({ "count": 2, "name": "red" })
        );
    }
}
