//! Multi-dimensional index to byte offset mapping.
//!
//! Index vectors use the reversed-axis convention: `index[0]` addresses the
//! fastest-varying axis, which is the *last* on-disk dimension, and
//! `index[rank - 1]` addresses `dimensions[0]`. For an image set stored as
//! `[samples, rows, columns]` a caller therefore indexes `[column, row, sample]`.

use log::trace;
use crate::idx::types::error::{IdxError, Result};

/// Computes the byte offset of the element at `index`.
///
/// `dimensions` is in disk order. Every component is checked against its axis
/// before any stride arithmetic.
///
/// # Errors
/// - [`IdxError::InvalidIndex`] if `index.len() != dimensions.len()`
/// - [`IdxError::IndexOutOfBounds`] if a component is not below its axis size
/// - [`IdxError::ElementCountOverflow`] if the offset does not fit in `usize`
pub fn offset_of(index: &[usize], dimensions: &[u32], element_width: usize) -> Result<usize> {
    let rank = dimensions.len();
    if index.len() != rank {
        return Err(IdxError::InvalidIndex {
            expected: rank,
            found: index.len(),
        });
    }

    for (axis, &component) in index.iter().enumerate() {
        let size = dimensions[rank - 1 - axis];
        if component >= size as usize {
            return Err(IdxError::IndexOutOfBounds {
                axis,
                index: component,
                size,
            });
        }
    }

    let mut offset = 0usize;
    let mut stride = element_width;
    for (axis, &component) in index.iter().enumerate() {
        let size = dimensions[rank - 1 - axis] as usize;
        offset = stride
            .checked_mul(component)
            .and_then(|step| offset.checked_add(step))
            .ok_or(IdxError::ElementCountOverflow)?;
        stride = stride
            .checked_mul(size)
            .ok_or(IdxError::ElementCountOverflow)?;
    }

    trace!("Index {:?} -> offset {}", index, offset);
    Ok(offset)
}
