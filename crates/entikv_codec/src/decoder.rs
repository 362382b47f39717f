//! Strict CBOR reader.
//!
//! Only the canonical form written by [`crate::CanonicalEncoder`] is
//! accepted. Anything else a general CBOR reader would tolerate (long
//! heads, unsorted keys, floats, tags, indefinite lengths) is an error,
//! so a cursor or stored row has exactly one byte representation.

use crate::encoder::{canonical_key_order, descend, FALSE, NULL, TRUE};
use crate::error::{CodecError, CodecResult};
use crate::value::{Item, Value};
use std::cmp::Ordering;

/// Largest element count accepted for a list or map.
const MAX_ELEMENTS: u64 = 1 << 24;

/// Largest accepted byte or text string.
const MAX_STRING: u64 = 1 << 28;

/// Smallest argument each long head form may carry; anything below fits
/// in the next shorter form.
const SHORTEST: [u64; 4] = [24, 0x100, 0x1_0000, 0x1_0000_0000];

/// Decodes exactly one value spanning all of `bytes`.
///
/// # Errors
///
/// Fails if the input is truncated, not canonical, uses a construct
/// [`Value`] cannot hold, or has bytes left over.
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = CanonicalDecoder::new(bytes);
    let value = decoder.decode()?;
    match decoder.remaining().len() {
        0 => Ok(value),
        count => Err(CodecError::TrailingBytes { count }),
    }
}

/// Decodes a row written by [`crate::item_to_cbor`].
///
/// # Errors
///
/// As [`from_cbor`], plus [`CodecError::NotAMap`] if the value is not a map.
pub fn item_from_cbor(bytes: &[u8]) -> CodecResult<Item> {
    match from_cbor(bytes)? {
        Value::Map(item) => Ok(item),
        other => Err(CodecError::NotAMap {
            found: other.type_name(),
        }),
    }
}

/// Reads canonical CBOR values from a borrowed buffer.
#[derive(Debug)]
pub struct CanonicalDecoder<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> CanonicalDecoder<'a> {
    /// A decoder positioned at the start of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    /// Reads the next value.
    pub fn decode(&mut self) -> CodecResult<Value> {
        self.value(0)
    }

    /// Whether every byte has been read.
    pub fn is_empty(&self) -> bool {
        self.remaining().is_empty()
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.offset.min(self.input.len())..]
    }

    fn value(&mut self, depth: usize) -> CodecResult<Value> {
        let at = self.offset;
        let head = self.take(1)?[0];
        let (major, info) = (head >> 5, head & 0x1f);

        match major {
            0 => {
                let arg = self.argument(at, info)?;
                let n = i64::try_from(arg).map_err(|_| CodecError::IntegerOutOfRange { offset: at })?;
                Ok(Value::Integer(n))
            }
            1 => {
                let arg = self.argument(at, info)?;
                let n = i64::try_from(arg).map_err(|_| CodecError::IntegerOutOfRange { offset: at })?;
                Ok(Value::Integer(-1 - n))
            }
            2 => {
                let len = self.length(at, info, MAX_STRING)?;
                Ok(Value::Bytes(self.take(len)?.to_vec()))
            }
            3 => self.text(at, info).map(Value::Text),
            4 => {
                let depth = descend(depth)?;
                let len = self.length(at, info, MAX_ELEMENTS)?;
                // the prefix is untrusted, so only reserve a bounded amount
                let mut items = Vec::with_capacity(len.min(256));
                for _ in 0..len {
                    items.push(self.value(depth)?);
                }
                Ok(Value::List(items))
            }
            5 => self.map(at, info, depth).map(Value::Map),
            6 => Err(unsupported(at, "tagged value")),
            _ => simple(at, head),
        }
    }

    fn map(&mut self, at: usize, info: u8, depth: usize) -> CodecResult<Item> {
        let depth = descend(depth)?;
        let len = self.length(at, info, MAX_ELEMENTS)?;
        let mut map = Item::new();
        let mut previous: Option<String> = None;

        for _ in 0..len {
            let key_at = self.offset;
            let key_head = self.take(1)?[0];
            if key_head >> 5 != 3 {
                return Err(unsupported(key_at, "map key that is not text"));
            }
            let key = self.text(key_at, key_head & 0x1f)?;
            if let Some(previous) = &previous {
                if canonical_key_order(previous, &key) != Ordering::Less {
                    return Err(CodecError::NonCanonical {
                        offset: key_at,
                        reason: "map keys out of order",
                    });
                }
            }
            let value = self.value(depth)?;
            map.insert(key.clone(), value);
            previous = Some(key);
        }
        Ok(map)
    }

    fn text(&mut self, at: usize, info: u8) -> CodecResult<String> {
        let len = self.length(at, info, MAX_STRING)?;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8 { offset: at })
    }

    /// Reads the argument following a head, rejecting long forms that a
    /// shorter head could have carried.
    fn argument(&mut self, at: usize, info: u8) -> CodecResult<u64> {
        let width = match info {
            0..=23 => return Ok(u64::from(info)),
            24 => 1,
            25 => 2,
            26 => 4,
            27 => 8,
            31 => return Err(unsupported(at, "indefinite length")),
            _ => {
                return Err(CodecError::NonCanonical {
                    offset: at,
                    reason: "reserved additional information",
                })
            }
        };
        let arg = self
            .take(width)?
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
        if arg < SHORTEST[usize::from(info - 24)] {
            return Err(CodecError::NonCanonical {
                offset: at,
                reason: "argument not in its shortest form",
            });
        }
        Ok(arg)
    }

    fn length(&mut self, at: usize, info: u8, limit: u64) -> CodecResult<usize> {
        let claimed = self.argument(at, info)?;
        if claimed > limit {
            return Err(CodecError::LengthLimit { claimed, limit });
        }
        usize::try_from(claimed).map_err(|_| CodecError::LengthLimit { claimed, limit })
    }

    fn take(&mut self, count: usize) -> CodecResult<&'a [u8]> {
        let input = self.input;
        let end = self
            .offset
            .checked_add(count)
            .filter(|&end| end <= input.len())
            .ok_or(CodecError::Truncated {
                offset: input.len(),
            })?;
        let slice = &input[self.offset..end];
        self.offset = end;
        Ok(slice)
    }
}

fn simple(at: usize, head: u8) -> CodecResult<Value> {
    match head {
        FALSE => Ok(Value::Bool(false)),
        TRUE => Ok(Value::Bool(true)),
        NULL => Ok(Value::Null),
        0xf9..=0xfb => Err(unsupported(at, "floating point number")),
        0xff => Err(unsupported(at, "break outside an indefinite item")),
        other => Err(CodecError::Unsupported {
            offset: at,
            what: format!("simple value 0x{other:02x}"),
        }),
    }
}

fn unsupported(offset: usize, what: &str) -> CodecError {
    CodecError::Unsupported {
        offset,
        what: what.to_string(),
    }
}
