//! Error types for the mapping kernel.

use crate::key::{EntityKey, Key};
use crate::revision::Revision;
use thiserror::Error;

/// Result type for kernel operations.
pub type GridResult<T> = Result<T, GridError>;

/// Boxed error reported by a datastore driver.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by keys, tuples, dialects and the type pipeline.
///
/// Only [`GridError::StaleState`] is expected in normal operation; callers
/// map it to their own optimistic-lock failure via [`GridError::is_conflict`].
/// Every other variant is either a programming error or something the
/// backend reported.
#[derive(Debug, Error)]
pub enum GridError {
    /// Column names and column values of a key have different lengths.
    #[error("key shape mismatch: {columns} column names but {values} column values")]
    KeyShape {
        /// Number of column names.
        columns: usize,
        /// Number of column values.
        values: usize,
    },

    /// A column was looked up on a key that does not contain it.
    #[error("column '{column}' is not part of the key")]
    UnknownKeyColumn {
        /// The requested column.
        column: String,
    },

    /// A tuple lacks a column required to build a key.
    #[error("tuple has no value for key column '{column}'")]
    MissingColumn {
        /// The missing column.
        column: String,
    },

    /// A value could not be converted to or from its native representation.
    #[error("cannot translate {type_name}: {message}")]
    Translation {
        /// Logical type being translated.
        type_name: String,
        /// Why the conversion failed.
        message: String,
    },

    /// A write was rejected because the stored revision moved since load.
    #[error("stale state for {key}: expected revision {expected:?}, found {actual:?}")]
    StaleState {
        /// Key of the document whose revision check failed.
        key: Key,
        /// Revision the writer loaded.
        expected: Option<Revision>,
        /// Revision currently stored.
        actual: Option<Revision>,
    },

    /// An insert targeted an entity that already exists.
    #[error("tuple already exists for {key}")]
    TupleAlreadyExists {
        /// The duplicated entity key.
        key: EntityKey,
    },

    /// The dialect does not implement an operation.
    #[error("operation not supported by this dialect: {operation}")]
    Unsupported {
        /// Name of the operation.
        operation: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] tuplegrid_codec::CodecError),

    /// Error passed through unchanged from a datastore driver.
    #[error("backend error: {0}")]
    Backend(#[source] BackendError),
}

impl GridError {
    /// Creates a translation error.
    pub fn translation(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Translation {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown key column error.
    pub fn unknown_key_column(column: impl Into<String>) -> Self {
        Self::UnknownKeyColumn {
            column: column.into(),
        }
    }

    /// Creates a missing column error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Wraps a driver error.
    pub fn backend(error: impl Into<BackendError>) -> Self {
        Self::Backend(error.into())
    }

    /// Returns true if this is an optimistic-concurrency conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::StaleState { .. })
    }
}
