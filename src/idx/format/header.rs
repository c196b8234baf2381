//! IDX magic word parsing.

use std::io::Read;
use byteorder::{ByteOrder, NativeEndian};
use log::{debug, warn};
use crate::idx::codec::endian;
use crate::idx::types::{
    error::{IdxError, Result},
    models::{DecodeStage, ElementType, IdxHeader, PartialIdxFile},
};
use crate::idx::utils;

/// Parses the 4-byte magic word at the start of an IDX stream.
///
/// # Header Structure
/// ```text
/// [2 bytes] reserved, zero
/// [1 byte ] element type code
/// [1 byte ] rank
/// ```
///
/// Type code and rank are taken from the raw bytes before any byte-order
/// normalization. The type code is validated here so later stages can trust it.
pub fn parse<R: Read>(reader: &mut R, partial: &mut PartialIdxFile) -> Result<IdxHeader> {
    let mut bytes = [0u8; 4];
    let found = utils::read_fully(reader, &mut bytes)?;
    if found < bytes.len() {
        return Err(IdxError::TruncatedHeader { found });
    }

    let type_code = bytes[2];
    let rank = bytes[3];
    let magic = endian::to_host_order(NativeEndian::read_u32(&bytes));

    partial.magic = Some(magic);
    partial.type_code = Some(type_code);
    partial.rank = rank;
    debug!("Magic word: {:#010x}, type code: {:#04x}, rank: {}", magic, type_code, rank);

    if bytes[0] != 0 || bytes[1] != 0 {
        warn!("Reserved header bytes are not zero: {:#04x} {:#04x}", bytes[0], bytes[1]);
    }

    let element_type = ElementType::try_from(type_code)?;
    partial.stage = DecodeStage::HeaderParsed;

    Ok(IdxHeader {
        magic,
        element_type,
        rank,
    })
}
