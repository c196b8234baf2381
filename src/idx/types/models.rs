//! Core data structures for IDX format components.
//!
//! This module defines the fundamental types used throughout the library:
//! - Element type codes and their widths
//! - The parsed header
//! - Decode progress and the partially decoded file kept on failure

use std::fmt;
use super::error::{IdxError, Result};

/// Scalar element type selected by the third header byte.
///
/// Each variant's discriminant is its on-disk type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    UnsignedByte = 0x08,
    SignedByte = 0x09,
    Short = 0x0B,
    Int = 0x0C,
    Float = 0x0D,
    Double = 0x0E,
}

impl ElementType {
    /// Size in bytes of a single element.
    pub fn width(self) -> usize {
        match self {
            ElementType::UnsignedByte | ElementType::SignedByte => 1,
            ElementType::Short => 2,
            ElementType::Int | ElementType::Float => 4,
            ElementType::Double => 8,
        }
    }

    /// The on-disk type code.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ElementType {
    type Error = IdxError;
    fn try_from(code: u8) -> Result<Self> {
        match code {
            0x08 => Ok(Self::UnsignedByte),
            0x09 => Ok(Self::SignedByte),
            0x0B => Ok(Self::Short),
            0x0C => Ok(Self::Int),
            0x0D => Ok(Self::Float),
            0x0E => Ok(Self::Double),
            _ => Err(IdxError::UnsupportedType(code)),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ElementType::UnsignedByte => "ubyte",
            ElementType::SignedByte => "byte",
            ElementType::Short => "short",
            ElementType::Int => "int",
            ElementType::Float => "float",
            ElementType::Double => "double",
        };
        write!(f, "{}", name)
    }
}

/// Returns the element width for a raw type code.
///
/// Unknown codes fail with [`IdxError::UnsupportedType`]; a zero width is never returned.
pub fn width_of(type_code: u8) -> Result<usize> {
    ElementType::try_from(type_code).map(ElementType::width)
}

/// The validated 4-byte header of an IDX file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdxHeader {
    /// Magic word in host order, kept for display only.
    pub magic: u32,
    pub element_type: ElementType,
    pub rank: u8,
}

/// How far the decode pipeline got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DecodeStage {
    Start,
    HeaderParsed,
    DimensionsParsed,
    PayloadLoaded,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeStage::Start => write!(f, "start"),
            DecodeStage::HeaderParsed => write!(f, "header parsed"),
            DecodeStage::DimensionsParsed => write!(f, "dimensions parsed"),
            DecodeStage::PayloadLoaded => write!(f, "payload loaded"),
        }
    }
}

/// Longest source name kept for diagnostics, in characters.
pub const MAX_SOURCE_NAME_CHARS: usize = 127;

/// Fields of a file whose decode stopped early.
///
/// Only the fields filled before `stage` advanced past them are meaningful:
/// `rank` stays 0 when the header was truncated, `dimensions` holds the prefix
/// read so far and `element_count` the product of that prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialIdxFile {
    pub source_name: String,
    pub stage: DecodeStage,
    pub magic: Option<u32>,
    pub type_code: Option<u8>,
    pub rank: u8,
    pub dimensions: Vec<u32>,
    pub element_count: u64,
    /// Zero-filled past whatever was actually read.
    pub payload: Vec<u8>,
}

impl PartialIdxFile {
    pub(crate) fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.chars().take(MAX_SOURCE_NAME_CHARS).collect(),
            stage: DecodeStage::Start,
            magic: None,
            type_code: None,
            rank: 0,
            dimensions: Vec::new(),
            element_count: 0,
            payload: Vec::new(),
        }
    }
}

impl fmt::Display for PartialIdxFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Source:     {}", self.source_name)?;
        writeln!(f, "Corrupted:  yes (stopped after: {})", self.stage)?;
        match self.magic {
            Some(magic) => writeln!(f, "Magic:      {:#010x} ({})", magic, magic)?,
            None => writeln!(f, "Magic:      -")?,
        }
        match self.type_code {
            Some(code) => writeln!(f, "Type code:  {:#04x}", code)?,
            None => writeln!(f, "Type code:  -")?,
        }
        writeln!(f, "Rank:       {}", self.rank)?;
        for (axis, size) in self.dimensions.iter().enumerate() {
            writeln!(f, "  dim[{}]:   {}", axis, size)?;
        }
        Ok(())
    }
}
