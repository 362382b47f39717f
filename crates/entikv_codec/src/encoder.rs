//! Deterministic CBOR writer.

use crate::error::{CodecError, CodecResult};
use crate::value::{Item, Value};
use crate::MAX_DEPTH;
use std::cmp::Ordering;

/// CBOR major types, pre-shifted into the high three bits of a head byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Major {
    Unsigned = 0x00,
    Negative = 0x20,
    Bytes = 0x40,
    Text = 0x60,
    List = 0x80,
    Map = 0xa0,
    Simple = 0xe0,
}

pub(crate) const FALSE: u8 = Major::Simple as u8 | 20;
pub(crate) const TRUE: u8 = Major::Simple as u8 | 21;
pub(crate) const NULL: u8 = Major::Simple as u8 | 22;

/// Order of map keys in canonical output.
///
/// Keys compare by encoded form: a shorter head-plus-text always sorts
/// first, and equal lengths compare bytewise. For text keys this reduces
/// to comparing lengths and then bytes.
pub(crate) fn canonical_key_order(a: &str, b: &str) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

/// Encodes `value` as canonical CBOR.
///
/// Integers take their shortest head, lengths are always definite and map
/// keys are written in [`canonical_key_order`]. Equal values always give
/// equal bytes.
///
/// # Errors
///
/// Fails with [`CodecError::TooDeep`] if lists and maps nest deeper than
/// [`MAX_DEPTH`].
pub fn to_canonical_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.finish())
}

/// Encodes a row exactly as `to_canonical_cbor(&Value::Map(item))` would,
/// without cloning it.
///
/// # Errors
///
/// Same as [`to_canonical_cbor`].
pub fn item_to_cbor(item: &Item) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode_item(item)?;
    Ok(encoder.finish())
}

/// Appends canonical CBOR to an owned buffer.
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    out: Vec<u8>,
}

impl CanonicalEncoder {
    /// An encoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// An encoder whose buffer starts with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
        }
    }

    /// Appends one value.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        self.value(value, 0)
    }

    /// Appends one row as a map.
    pub fn encode_item(&mut self, item: &Item) -> CodecResult<()> {
        self.map(item, 0)
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    /// Returns the buffer.
    pub fn finish(self) -> Vec<u8> {
        self.out
    }

    fn value(&mut self, value: &Value, depth: usize) -> CodecResult<()> {
        match value {
            Value::Null => self.out.push(NULL),
            Value::Bool(false) => self.out.push(FALSE),
            Value::Bool(true) => self.out.push(TRUE),
            Value::Integer(n) if *n >= 0 => self.head(Major::Unsigned, n.unsigned_abs()),
            // -1 is written as argument 0, -2 as 1, down to i64::MIN
            Value::Integer(n) => self.head(Major::Negative, (n + 1).unsigned_abs()),
            Value::Bytes(bytes) => self.string(Major::Bytes, bytes),
            Value::Text(text) => self.string(Major::Text, text.as_bytes()),
            Value::List(items) => {
                let depth = descend(depth)?;
                self.head(Major::List, items.len() as u64);
                for item in items {
                    self.value(item, depth)?;
                }
            }
            Value::Map(entries) => self.map(entries, depth)?,
        }
        Ok(())
    }

    fn map(&mut self, entries: &Item, depth: usize) -> CodecResult<()> {
        let depth = descend(depth)?;
        let mut sorted: Vec<_> = entries.iter().collect();
        sorted.sort_by(|(a, _), (b, _)| canonical_key_order(a, b));

        self.head(Major::Map, sorted.len() as u64);
        for (key, value) in sorted {
            self.string(Major::Text, key.as_bytes());
            self.value(value, depth)?;
        }
        Ok(())
    }

    fn string(&mut self, major: Major, bytes: &[u8]) {
        self.head(major, bytes.len() as u64);
        self.out.extend_from_slice(bytes);
    }

    /// Writes a head byte and its argument in the fewest bytes.
    #[allow(clippy::cast_possible_truncation)]
    fn head(&mut self, major: Major, arg: u64) {
        let major = major as u8;
        let be = arg.to_be_bytes();
        let (info, tail) = match arg {
            0..=23 => (arg as u8, &be[8..]),
            24..=0xff => (24, &be[7..]),
            0x100..=0xffff => (25, &be[6..]),
            0x1_0000..=0xffff_ffff => (26, &be[4..]),
            _ => (27, &be[..]),
        };
        self.out.push(major | info);
        self.out.extend_from_slice(tail);
    }
}

/// Depth of the children of a container at `depth`.
pub(crate) fn descend(depth: usize) -> CodecResult<usize> {
    if depth >= MAX_DEPTH {
        return Err(CodecError::TooDeep { limit: MAX_DEPTH });
    }
    Ok(depth + 1)
}
