//! Error types for store operations.

use std::fmt;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named table does not exist.
    #[error("table not found: {table}")]
    TableNotFound {
        /// The requested table name.
        table: String,
    },

    /// A single-item write was rejected by its condition.
    #[error("conditional check failed")]
    ConditionalCheckFailed,

    /// A transactional write was cancelled; nothing was applied.
    ///
    /// `reasons` has one entry per submitted operation, `None` for the
    /// operations that would have succeeded.
    #[error("transaction cancelled: {}", summarize(.reasons))]
    TransactionCanceled {
        /// Per-operation cancellation reasons, in submission order.
        reasons: Vec<Option<CancellationReason>>,
    },

    /// The request itself is malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The store could not be reached or failed internally.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A cursor or item could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] entikv_codec::CodecError),
}

impl StoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Stable short code for the error, suitable as a log field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TableNotFound { .. } => "ResourceNotFound",
            Self::ConditionalCheckFailed => "ConditionalCheckFailed",
            Self::TransactionCanceled { .. } => "TransactionCanceled",
            Self::Validation(_) => "Validation",
            Self::Unavailable(_) => "Unavailable",
            Self::Codec(_) => "Codec",
        }
    }

    /// Index of the first operation that cancelled a transaction, if any.
    pub fn first_cancelled(&self) -> Option<(usize, &CancellationReason)> {
        match self {
            Self::TransactionCanceled { reasons } => reasons
                .iter()
                .enumerate()
                .find_map(|(i, r)| r.as_ref().map(|r| (i, r))),
            _ => None,
        }
    }
}

/// Why one operation of a transaction prevented the commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationReason {
    /// The operation's condition did not hold.
    ConditionalCheckFailed,
    /// The operation could not be applied to the current item.
    ValidationError(String),
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConditionalCheckFailed => write!(f, "ConditionalCheckFailed"),
            Self::ValidationError(message) => write!(f, "ValidationError({message})"),
        }
    }
}

fn summarize(reasons: &[Option<CancellationReason>]) -> String {
    let parts: Vec<String> = reasons
        .iter()
        .map(|r| r.as_ref().map_or_else(|| "None".to_string(), ToString::to_string))
        .collect();
    format!("[{}]", parts.join(", "))
}
