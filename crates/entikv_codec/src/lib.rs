//! Attribute values for EntiKV rows and their canonical CBOR form.
//!
//! [`Value`] is the closed union an attribute can hold and [`Item`] is a
//! whole row. The store encodes rows with [`item_to_cbor`] to weigh them
//! against page byte budgets, and encodes a row's key to build opaque
//! scan cursors. JSON payloads enter through `Value::try_from`.
//!
//! The encoding is canonical: integers use their shortest head, lengths
//! are definite, map keys are text written shortest first and then
//! bytewise, and floats do not exist. The decoder accepts nothing else.
//!
//! ```
//! use entikv_codec::{from_cbor, to_canonical_cbor, Value};
//!
//! let attrs = Value::map([("color", "blue")]);
//! let bytes = to_canonical_cbor(&attrs).unwrap();
//! assert_eq!(from_cbor(&bytes).unwrap(), attrs);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod json;
mod value;

pub use decoder::{from_cbor, item_from_cbor, CanonicalDecoder};
pub use encoder::{item_to_cbor, to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use value::{Item, Value};

/// How deeply lists and maps may nest inside one value.
pub const MAX_DEPTH: usize = 32;

/// Types with a canonical CBOR form.
pub trait Encode {
    /// The canonical bytes of `self`.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Types readable from canonical CBOR.
pub trait Decode: Sized {
    /// Reads `Self` from exactly `bytes`.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

macro_rules! canonical_form {
    ($ty:ty, $encode:path, $decode:path) => {
        impl Encode for $ty {
            fn encode(&self) -> CodecResult<Vec<u8>> {
                $encode(self)
            }
        }

        impl Decode for $ty {
            fn decode(bytes: &[u8]) -> CodecResult<Self> {
                $decode(bytes)
            }
        }
    };
}

canonical_form!(Value, to_canonical_cbor, from_cbor);
canonical_form!(Item, item_to_cbor, item_from_cbor);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scalar_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
            "[a-zA-Z0-9 #/]{0,16}".prop_map(Value::Text),
        ]
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        scalar_strategy().prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4).prop_map(Value::Map),
            ]
        })
    }

    proptest! {
        #[test]
        fn canonical_bytes_are_a_fixed_point(value in value_strategy()) {
            let bytes = value.encode().unwrap();
            let decoded = Value::decode(&bytes).unwrap();
            prop_assert_eq!(decoded.encode().unwrap(), bytes);
            prop_assert_eq!(decoded, value);
        }

        #[test]
        fn truncated_bytes_never_decode(value in value_strategy(), cut in any::<prop::sample::Index>()) {
            let bytes = value.encode().unwrap();
            let short = &bytes[..cut.index(bytes.len())];
            prop_assert!(Value::decode(short).is_err());
        }
    }
}
