//! Core IDX reader module

pub mod addressing;
pub mod codec;
pub mod format;
pub mod reader;
pub mod render;
pub mod types;
mod utils;

pub use codec::alloc::{AllocationSource, ResilientAllocator, SystemSource, DEFAULT_RETRIES};
pub use reader::{IdxFile, OpenOutcome};
pub use types::error::{IdxError, Result};
pub use types::models::{width_of, DecodeStage, ElementType, IdxHeader, PartialIdxFile};
