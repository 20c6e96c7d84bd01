//! Error types for the in-memory backend.

use thiserror::Error;
use tuplegrid_codec::CodecError;
use tuplegrid_core::GridError;

/// Result type for datastore operations.
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Errors raised by [`MapDatastore`](crate::MapDatastore).
///
/// Reaching the kernel they become [`GridError::Backend`].
#[derive(Debug, Error)]
pub enum MemoryError {
    /// A document could not be encoded or decoded.
    #[error("document codec error: {0}")]
    Codec(#[from] CodecError),

    /// A stored document does not have the expected layout.
    #[error("corrupted document {document}: {message}")]
    Corrupted {
        /// Document the problem was found in.
        document: String,
        /// What is wrong with it.
        message: String,
    },

    /// An id generator would leave the `i64` range.
    #[error("id source {source_key} overflowed")]
    IdOverflow {
        /// The generator segment.
        source_key: String,
    },
}

impl MemoryError {
    /// Creates a corrupted document error.
    pub fn corrupted(document: impl ToString, message: impl Into<String>) -> Self {
        Self::Corrupted {
            document: document.to_string(),
            message: message.into(),
        }
    }
}

impl From<MemoryError> for GridError {
    fn from(error: MemoryError) -> Self {
        GridError::backend(error)
    }
}
