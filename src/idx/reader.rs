//! The decoded IDX file and the open/decode pipeline.
//!
//! [`IdxFile::open`] runs the header, dimension and payload stages in order and
//! returns an [`OpenOutcome`]; element queries are answered by [`IdxFile`].

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use log::{debug, info, warn};

use super::addressing;
use super::codec::alloc::{AllocationSource, ResilientAllocator};
use super::format::{dimensions, header, payload};
use super::types::error::{IdxError, Result};
use super::types::models::*;

/// A fully decoded IDX file, ready for element queries.
///
/// Immutable once constructed, so shared references may be read from several
/// threads; each [`element_at`](Self::element_at) call returns its own buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxFile {
    source_name: String,
    header: IdxHeader,
    dimensions: Vec<u32>,
    element_count: u64,
    payload: Vec<u8>,
}

/// Result of decoding an IDX file.
///
/// A failed decode still carries everything parsed before the failing stage.
#[derive(Debug)]
pub enum OpenOutcome {
    Ready(IdxFile),
    Failed {
        partial: PartialIdxFile,
        error: IdxError,
    },
}

impl OpenOutcome {
    /// `true` when some decode stage failed.
    pub fn corrupted(&self) -> bool {
        matches!(self, OpenOutcome::Failed { .. })
    }

    /// The last stage that completed.
    pub fn stage(&self) -> DecodeStage {
        match self {
            OpenOutcome::Ready(_) => DecodeStage::PayloadLoaded,
            OpenOutcome::Failed { partial, .. } => partial.stage,
        }
    }

    pub fn error(&self) -> Option<&IdxError> {
        match self {
            OpenOutcome::Ready(_) => None,
            OpenOutcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn ready(&self) -> Option<&IdxFile> {
        match self {
            OpenOutcome::Ready(file) => Some(file),
            OpenOutcome::Failed { .. } => None,
        }
    }

    /// Discards the partial state of a failed decode, keeping only the error.
    pub fn into_result(self) -> Result<IdxFile> {
        match self {
            OpenOutcome::Ready(file) => Ok(file),
            OpenOutcome::Failed { error, .. } => Err(error),
        }
    }

    /// Frees the decoded file or the partial state, whichever this holds.
    pub fn release(self) {
        match self {
            OpenOutcome::Ready(file) => file.release(),
            OpenOutcome::Failed { partial, .. } => {
                debug!("Releasing partially decoded file '{}'", partial.source_name);
            }
        }
    }
}

impl IdxFile {
    /// Opens and decodes the IDX file at `path`.
    ///
    /// Never fails outright: an unreadable path or a malformed file yields
    /// [`OpenOutcome::Failed`] with whatever was parsed before the failure.
    /// The file handle is closed before this returns.
    pub fn open(path: impl AsRef<Path>) -> OpenOutcome {
        Self::open_with(path, &ResilientAllocator::default())
    }

    /// Like [`open`](Self::open), with an explicit allocator.
    pub fn open_with<S: AllocationSource>(
        path: impl AsRef<Path>,
        allocator: &ResilientAllocator<S>,
    ) -> OpenOutcome {
        let path = path.as_ref();
        info!("Opening IDX file: {}", path.display());
        let source_name = path.to_string_lossy();

        match File::open(path) {
            Ok(file) => {
                let mut reader = BufReader::new(file);
                Self::decode_with(&mut reader, &source_name, allocator)
            }
            Err(source) => {
                let error = IdxError::FileUnavailable {
                    path: path.display().to_string(),
                    source,
                };
                warn!("{}", error);
                OpenOutcome::Failed {
                    partial: PartialIdxFile::new(&source_name),
                    error,
                }
            }
        }
    }

    /// Decodes an IDX stream positioned at its first byte.
    pub fn decode<R: Read>(reader: &mut R, source_name: &str) -> OpenOutcome {
        Self::decode_with(reader, source_name, &ResilientAllocator::default())
    }

    /// Like [`decode`](Self::decode), with an explicit allocator.
    pub fn decode_with<R: Read, S: AllocationSource>(
        reader: &mut R,
        source_name: &str,
        allocator: &ResilientAllocator<S>,
    ) -> OpenOutcome {
        let mut partial = PartialIdxFile::new(source_name);
        match run_stages(reader, &mut partial, allocator) {
            Ok(header) => {
                let file = IdxFile {
                    source_name: partial.source_name,
                    header,
                    dimensions: partial.dimensions,
                    element_count: partial.element_count,
                    payload: partial.payload,
                };
                info!(
                    "IDX file ready: '{}', type={}, dims={:?}, {} elements",
                    file.source_name, file.header.element_type, file.dimensions, file.element_count
                );
                OpenOutcome::Ready(file)
            }
            Err(error) => {
                warn!(
                    "Failed to decode '{}' after stage '{}': {}",
                    partial.source_name, partial.stage, error
                );
                OpenOutcome::Failed { partial, error }
            }
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn header(&self) -> &IdxHeader {
        &self.header
    }

    pub fn element_type(&self) -> ElementType {
        self.header.element_type
    }

    /// Bytes per element, always greater than zero.
    pub fn element_width(&self) -> usize {
        self.header.element_type.width()
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Dimension sizes in disk order, outermost first.
    pub fn dimensions(&self) -> &[u32] {
        &self.dimensions
    }

    /// Product of all dimension sizes.
    pub fn element_count(&self) -> u64 {
        self.element_count
    }

    /// The raw payload, exactly as stored on disk.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Byte offset of the element at `index` (reversed-axis order, see [`addressing`]).
    pub fn offset_of(&self, index: &[usize]) -> Result<usize> {
        addressing::offset_of(index, &self.dimensions, self.element_width())
    }

    /// Borrows the bytes of the element at `index`.
    pub fn element_slice(&self, index: &[usize]) -> Result<&[u8]> {
        let offset = self.offset_of(index)?;
        // offset_of bounds every axis and the payload holds element_count * width bytes.
        Ok(&self.payload[offset..offset + self.element_width()])
    }

    /// Returns an owned copy of the element at `index`.
    ///
    /// # Errors
    /// - [`IdxError::InvalidIndex`] if `index` does not have one entry per dimension
    /// - [`IdxError::IndexOutOfBounds`] if a component lies outside its axis
    /// - [`IdxError::AllocationFailure`] if the output buffer cannot be obtained
    pub fn element_at(&self, index: &[usize]) -> Result<Vec<u8>> {
        self.element_at_with(index, &ResilientAllocator::default())
    }

    /// Like [`element_at`](Self::element_at), with an explicit allocator.
    pub fn element_at_with<S: AllocationSource>(
        &self,
        index: &[usize],
        allocator: &ResilientAllocator<S>,
    ) -> Result<Vec<u8>> {
        let bytes = self.element_slice(index)?;
        let mut output = allocator.allocate::<u8>(bytes.len())?;
        output.copy_from_slice(bytes);
        Ok(output)
    }

    /// Frees the dimensions and payload together with the file.
    ///
    /// Consumes `self`, so a file cannot be released twice:
    ///
    /// ```compile_fail
    /// let file = idx_reader::IdxFile::open("images.idx").into_result().unwrap();
    /// file.release();
    /// file.release();
    /// ```
    pub fn release(self) {
        debug!("Releasing IDX file '{}' ({} payload bytes)", self.source_name, self.payload.len());
    }
}

impl fmt::Display for IdxFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Source:     {}", self.source_name)?;
        writeln!(f, "Corrupted:  no")?;
        writeln!(f, "Magic:      {:#010x} ({})", self.header.magic, self.header.magic)?;
        writeln!(
            f,
            "Type code:  {:#04x} ({}, {} bytes)",
            self.header.element_type.code(),
            self.header.element_type,
            self.element_width()
        )?;
        writeln!(f, "Rank:       {}", self.header.rank)?;
        for (axis, size) in self.dimensions.iter().enumerate() {
            writeln!(f, "  dim[{}]:   {}", axis, size)?;
        }
        Ok(())
    }
}

/// Runs header, dimension and payload stages in order, stopping at the first failure.
fn run_stages<R: Read, S: AllocationSource>(
    reader: &mut R,
    partial: &mut PartialIdxFile,
    allocator: &ResilientAllocator<S>,
) -> Result<IdxHeader> {
    let header = header::parse(reader, partial)?;
    dimensions::parse(reader, partial, allocator)?;
    payload::load(reader, partial, header.element_type.width(), allocator)?;
    Ok(header)
}
