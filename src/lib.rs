//! # idx-reader
//!
//! A reader for IDX files, the binary tensor format used to distribute
//! datasets such as MNIST.
//!
//! Files are decoded fully into memory; individual elements are then fetched
//! by multi-dimensional index. Element bytes are returned exactly as stored.
pub mod idx;

// Re-export the main types for convenience
pub use idx::{
    render,
    AllocationSource,
    DecodeStage,
    ElementType,
    IdxError,
    IdxFile,
    IdxHeader,
    OpenOutcome,
    PartialIdxFile,
    ResilientAllocator,
    Result,
    SystemSource,
    DEFAULT_RETRIES,
    width_of,
};
