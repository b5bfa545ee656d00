// Crate-wide error taxonomy.
//
// All three operations (signature, delta, patch) surface errors from this
// one enum. None of the variants is retryable from inside the library; a
// failed operation never leaves output claiming success.

use std::io;

use thiserror::Error;

/// Result type for blockdelta operations.
pub type Result<T> = std::result::Result<T, DeltaError>;

/// Errors that can occur during signature generation, delta encoding or
/// patch application.
#[derive(Debug, Error)]
pub enum DeltaError {
    /// Malformed magic, version, tag or block-size field. The input was not
    /// produced by this library (or was damaged in its header).
    #[error("format error: {0}")]
    Format(String),

    /// A signature stream ended mid-record or its descriptors are
    /// internally inconsistent.
    #[error("corrupt signature: {0}")]
    CorruptSignature(String),

    /// A delta stream ended mid-record, lost its trailer, or declared a
    /// literal longer than the remaining bytes.
    #[error("corrupt delta: {0}")]
    CorruptDelta(String),

    /// The basis file supplied at patch time does not fit the delta: wrong
    /// size, or too short for a referenced block.
    #[error("basis mismatch: {0}")]
    BasisMismatch(String),

    /// The reconstructed output does not hash to the digest recorded in the
    /// delta trailer. The basis content differs from the one the delta was
    /// computed against.
    #[error("output checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Hex digest recorded in the delta trailer.
        expected: String,
        /// Hex digest of the bytes actually written.
        actual: String,
    },

    /// Error from the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DeltaError {
    /// Map an `io::Error` raised while reading a signature record: EOF in
    /// the middle of a record means truncation, everything else is I/O.
    pub(crate) fn signature_read(e: io::Error, what: &str) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::CorruptSignature(format!("truncated {what}"))
        } else {
            Self::Io(e)
        }
    }

    /// Map an `io::Error` raised while reading a delta record.
    pub(crate) fn delta_read(e: io::Error, what: &str) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::CorruptDelta(format!("truncated {what}"))
        } else {
            Self::Io(e)
        }
    }
}
