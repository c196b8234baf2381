//! Text rendering of image samples.
//!
//! Maps unsigned-byte intensities onto a short character ramp so an image set
//! such as MNIST can be eyeballed in a terminal.

use crate::idx::reader::IdxFile;
use crate::idx::types::error::{IdxError, Result};
use crate::idx::types::models::ElementType;

const PALETTE: [char; 6] = [' ', '.', '-', '+', '#', '@'];

/// Maps an intensity in `0..=255` to a palette glyph, darkest first.
pub fn palette_char(value: u8) -> char {
    PALETTE[usize::from(value) * (PALETTE.len() - 1) / 255]
}

/// Renders sample `sample` of a `[samples, rows, columns]` unsigned-byte file.
///
/// Produces one line per row, each terminated by `\n`.
pub fn render_sample(images: &IdxFile, sample: usize) -> Result<String> {
    if images.element_type() != ElementType::UnsignedByte {
        return Err(IdxError::Render(format!(
            "expected unsigned byte elements, found {}",
            images.element_type()
        )));
    }
    let &[_, rows, columns] = images.dimensions() else {
        return Err(IdxError::Render(format!(
            "expected 3 dimensions, found {}",
            images.rank()
        )));
    };

    let (rows, columns) = (rows as usize, columns as usize);
    let mut text = String::with_capacity(rows * (columns + 1));
    for y in 0..rows {
        for x in 0..columns {
            let pixel = images.element_at(&[x, y, sample])?;
            text.push(palette_char(pixel[0]));
        }
        text.push('\n');
    }
    Ok(text)
}

/// Reads the label of `sample` from a rank-1 label file.
pub fn label_of(labels: &IdxFile, sample: usize) -> Result<u8> {
    let label = labels.element_at(&[sample])?;
    Ok(label[0])
}
