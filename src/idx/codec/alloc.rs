//! Zero-initialized buffer allocation with a bounded retry policy.
//!
//! Every stage that needs a buffer (dimensions, payload, element copies) goes
//! through [`ResilientAllocator`], so they all share one failure policy.

use std::mem::size_of;
use log::{debug, trace};
use crate::idx::types::error::{IdxError, Result};

/// Number of retries after the first failed attempt.
pub const DEFAULT_RETRIES: u32 = 8;

/// Something that can hand out zero-initialized buffers, or decline.
pub trait AllocationSource {
    /// Returns a buffer of `len` default (zero) values, or `None` if memory is unavailable.
    fn try_zeroed<T: Copy + Default>(&self, len: usize) -> Option<Vec<T>>;
}

/// Allocates from the global allocator without aborting on exhaustion.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSource;

impl AllocationSource for SystemSource {
    fn try_zeroed<T: Copy + Default>(&self, len: usize) -> Option<Vec<T>> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len).ok()?;
        buffer.resize(len, T::default());
        Some(buffer)
    }
}

/// Retries a failing [`AllocationSource`] a fixed number of times.
#[derive(Debug, Clone)]
pub struct ResilientAllocator<S = SystemSource> {
    source: S,
    retries: u32,
}

impl Default for ResilientAllocator<SystemSource> {
    fn default() -> Self {
        Self::new(SystemSource, DEFAULT_RETRIES)
    }
}

impl<S: AllocationSource> ResilientAllocator<S> {
    pub fn new(source: S, retries: u32) -> Self {
        Self { source, retries }
    }

    /// Total attempts made before giving up.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Allocates `len` zeroed elements, retrying on failure.
    ///
    /// # Errors
    /// [`IdxError::AllocationFailure`] once every attempt has failed.
    pub fn allocate<T: Copy + Default>(&self, len: usize) -> Result<Vec<T>> {
        let attempts = self.max_attempts();
        for attempt in 1..=attempts {
            if let Some(buffer) = self.source.try_zeroed(len) {
                if attempt > 1 {
                    debug!("Allocation of {} elements succeeded on attempt {}", len, attempt);
                }
                return Ok(buffer);
            }
            trace!("Allocation of {} elements failed (attempt {}/{})", len, attempt, attempts);
        }
        Err(IdxError::AllocationFailure {
            size: len.saturating_mul(size_of::<T>()),
            attempts,
        })
    }
}
