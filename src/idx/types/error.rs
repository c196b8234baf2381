//! Custom error types for the idx-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum IdxError {
    /// An error originating from I/O operations on an already opened stream.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The file at the given path could not be opened.
    #[error("Cannot open IDX file '{path}': {source}")]
    FileUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Fewer than 4 bytes were available for the magic word.
    #[error("Truncated header: expected 4 bytes, found {found}")]
    TruncatedHeader { found: usize },

    /// The type code in the header is not one of the six IDX element types.
    #[error("Unsupported element type code: {0:#04x}")]
    UnsupportedType(u8),

    /// A buffer could not be obtained after exhausting all retries.
    #[error("Failed to allocate {size} bytes after {attempts} attempts")]
    AllocationFailure { size: usize, attempts: u32 },

    /// The stream ended before every dimension size was read.
    #[error("Truncated dimensions: expected {expected}, found {found}")]
    TruncatedDimensions { expected: usize, found: usize },

    /// The stream ended before the full payload was read.
    #[error("Truncated payload: expected {expected} bytes, read {found} bytes")]
    TruncatedPayload { expected: u64, found: u64 },

    /// The product of the dimensions (or its byte size) does not fit the addressing width.
    #[error("Element count overflows the addressable size")]
    ElementCountOverflow,

    /// An index vector does not have one entry per dimension.
    #[error("Invalid index: expected {expected} components, got {found}")]
    InvalidIndex { expected: usize, found: usize },

    /// An index component lies outside its axis.
    #[error("Index {index} out of bounds for axis {axis} of size {size}")]
    IndexOutOfBounds { axis: usize, index: usize, size: u32 },

    /// The file cannot be rendered as an image set.
    #[error("Render error: {0}")]
    Render(String),
}

/// A convenience `Result` type alias using the crate's `IdxError` type.
pub type Result<T> = std::result::Result<T, IdxError>;
