//! Dimension size parsing.

use std::io::Read;
use byteorder::{ByteOrder, NativeEndian};
use log::{debug, trace};
use crate::idx::codec::alloc::{AllocationSource, ResilientAllocator};
use crate::idx::codec::endian;
use crate::idx::types::{
    error::{IdxError, Result},
    models::{DecodeStage, PartialIdxFile},
};
use crate::idx::utils;

/// Reads `partial.rank` big-endian `u32` dimension sizes, outermost first.
///
/// On failure `partial.dimensions` keeps the prefix read so far and
/// `partial.element_count` the product of that prefix.
pub fn parse<R: Read, S: AllocationSource>(
    reader: &mut R,
    partial: &mut PartialIdxFile,
    allocator: &ResilientAllocator<S>,
) -> Result<()> {
    let rank = usize::from(partial.rank);
    partial.element_count = 1;
    partial.dimensions = allocator.allocate::<u32>(rank)?;

    for axis in 0..rank {
        let mut raw = [0u8; 4];
        let found = match utils::read_fully(reader, &mut raw) {
            Ok(found) => found,
            Err(e) => {
                partial.dimensions.truncate(axis);
                return Err(e.into());
            }
        };
        if found < raw.len() {
            partial.dimensions.truncate(axis);
            return Err(IdxError::TruncatedDimensions { expected: rank, found: axis });
        }

        let size = endian::to_host_order(NativeEndian::read_u32(&raw));
        partial.dimensions[axis] = size;
        trace!("Dimension {}: {}", axis, size);

        match partial.element_count.checked_mul(u64::from(size)) {
            Some(count) => partial.element_count = count,
            None => {
                partial.dimensions.truncate(axis + 1);
                return Err(IdxError::ElementCountOverflow);
            }
        }
    }

    debug!("Dimensions: {:?} ({} elements)", partial.dimensions, partial.element_count);
    partial.stage = DecodeStage::DimensionsParsed;
    Ok(())
}
