//! Error types for EntiKV core.

use entikv_store::{ItemKey, StoreError};
use std::fmt;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Which uniqueness rule a failed create violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    /// An entity with the same key already exists.
    DuplicateId,
    /// Another entity in the same scope already uses the label.
    DuplicateLabel,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId => write!(f, "duplicate id"),
            Self::DuplicateLabel => write!(f, "duplicate label"),
        }
    }
}

/// Errors that can occur in EntiKV core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No row exists under the addressed key.
    #[error("entity not found: ({partition_key}, {sort_key})")]
    NotFound {
        /// Partition key that was looked up.
        partition_key: String,
        /// Sort key that was looked up.
        sort_key: String,
    },

    /// A create collided with an existing row; nothing was written.
    #[error("{kind} conflict on ({partition_key}, {sort_key})")]
    Conflict {
        /// Which uniqueness rule was violated.
        kind: ConflictKind,
        /// Partition key of the colliding row.
        partition_key: String,
        /// Sort key of the colliding row.
        sort_key: String,
    },

    /// The backing store failed or could not be reached.
    #[error("backend unavailable: {0}")]
    Backend(#[source] StoreError),

    /// The request was rejected before or by the store as malformed.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the problem.
        message: String,
    },

    /// The configured table does not exist.
    #[error("table not found: {table}")]
    TableNotFound {
        /// Name of the table.
        table: String,
    },

    /// The operation is declared but not available.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// Name of the operation.
        operation: &'static str,
    },
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a not found error for `key`.
    pub fn not_found(key: &ItemKey) -> Self {
        Self::NotFound {
            partition_key: key.partition.clone(),
            sort_key: key.sort.clone(),
        }
    }

    /// Creates a conflict error for `key`.
    pub fn conflict(kind: ConflictKind, key: &ItemKey) -> Self {
        Self::Conflict {
            kind,
            partition_key: key.partition.clone(),
            sort_key: key.sort.clone(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Returns true for [`CoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the conflict kind for [`CoreError::Conflict`].
    pub fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            Self::Conflict { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TableNotFound { table } => Self::TableNotFound { table },
            StoreError::Validation(message) => Self::Validation { message },
            other => Self::Backend(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_translate() {
        let err: CoreError = StoreError::TableNotFound {
            table: "t".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::TableNotFound { ref table } if table == "t"));

        let err: CoreError = StoreError::validation("bad").into();
        assert!(matches!(err, CoreError::Validation { .. }));

        let err: CoreError = StoreError::unavailable("down").into();
        assert!(matches!(err, CoreError::Backend(StoreError::Unavailable(_))));

        let codec = entikv_codec::from_cbor(&[]).unwrap_err();
        let err: CoreError = StoreError::from(codec).into();
        assert!(matches!(err, CoreError::Backend(StoreError::Codec(_))));
    }

    #[test]
    fn conflict_message_names_kind_and_key() {
        let err = CoreError::conflict(ConflictKind::DuplicateLabel, &ItemKey::new("@ul\\wc", "red"));
        assert_eq!(err.to_string(), "duplicate label conflict on (@ul\\wc, red)");
        assert_eq!(err.conflict_kind(), Some(ConflictKind::DuplicateLabel));
        assert!(!err.is_not_found());
    }
}
