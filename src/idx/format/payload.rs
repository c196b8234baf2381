//! Raw element payload loading.

use std::io::Read;
use log::debug;
use crate::idx::codec::alloc::{AllocationSource, ResilientAllocator};
use crate::idx::types::{
    error::{IdxError, Result},
    models::{DecodeStage, PartialIdxFile},
};
use crate::idx::utils;

/// Reads `element_count * element_width` payload bytes in one transfer.
///
/// The bytes are kept exactly as stored; element byte order is left to the caller.
/// On a short read the buffer is zero past the bytes actually read.
pub fn load<R: Read, S: AllocationSource>(
    reader: &mut R,
    partial: &mut PartialIdxFile,
    element_width: usize,
    allocator: &ResilientAllocator<S>,
) -> Result<()> {
    let expected = partial
        .element_count
        .checked_mul(element_width as u64)
        .ok_or(IdxError::ElementCountOverflow)?;
    let size = usize::try_from(expected).map_err(|_| IdxError::ElementCountOverflow)?;
    debug!("Loading payload: {} elements x {} bytes = {} bytes", partial.element_count, element_width, size);

    partial.payload = allocator.allocate::<u8>(size)?;
    let found = utils::read_fully(reader, &mut partial.payload)?;
    if found < size {
        return Err(IdxError::TruncatedPayload {
            expected,
            found: found as u64,
        });
    }

    partial.stage = DecodeStage::PayloadLoaded;
    Ok(())
}
