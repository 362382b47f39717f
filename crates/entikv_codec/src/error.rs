//! Codec errors.

use thiserror::Error;

/// Result alias used throughout the codec.
pub type CodecResult<T> = Result<T, CodecError>;

/// Why a value could not be encoded, decoded or converted.
///
/// Decoding errors carry the byte offset where the problem was found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended in the middle of a value.
    #[error("input truncated at byte {offset}")]
    Truncated {
        /// Offset at which more bytes were expected.
        offset: usize,
    },

    /// Input is well-formed CBOR but not in canonical form.
    #[error("non-canonical CBOR at byte {offset}: {reason}")]
    NonCanonical {
        /// Offset of the offending head byte.
        offset: usize,
        /// What rule was broken.
        reason: &'static str,
    },

    /// Input uses a CBOR construct that attribute values cannot express.
    #[error("unsupported CBOR at byte {offset}: {what}")]
    Unsupported {
        /// Offset of the offending head byte.
        offset: usize,
        /// The construct found.
        what: String,
    },

    /// An integer does not fit in an `i64`.
    #[error("integer at byte {offset} is out of range")]
    IntegerOutOfRange {
        /// Offset of the integer's head byte.
        offset: usize,
    },

    /// A text string is not valid UTF-8.
    #[error("text at byte {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Offset of the string's head byte.
        offset: usize,
    },

    /// A length prefix exceeds what the decoder accepts.
    #[error("length {claimed} exceeds limit {limit}")]
    LengthLimit {
        /// Length found in the input.
        claimed: u64,
        /// Largest accepted length.
        limit: u64,
    },

    /// Lists and maps nest deeper than [`crate::MAX_DEPTH`].
    #[error("values nest deeper than {limit} levels")]
    TooDeep {
        /// The depth limit.
        limit: usize,
    },

    /// Bytes remain after a complete value.
    #[error("{count} trailing bytes after value")]
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },

    /// An item was expected but the value is not a map.
    #[error("expected a map, found {found}")]
    NotAMap {
        /// Type name of the value found.
        found: &'static str,
    },

    /// A JSON number could not be represented as an `i64`.
    #[error("number {0} is not a 64-bit integer")]
    NonIntegralNumber(String),
}
