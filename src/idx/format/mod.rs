//! File format parsing layer for IDX files.
//!
//! Each stage reads from the stream where the previous one stopped and
//! records what it parsed into the [`PartialIdxFile`](crate::PartialIdxFile)
//! before reporting failure, so a failed decode can still be inspected.
//!
//! ```text
//! ┌──────────────────────┐
//! │  Magic (4 bytes)     │ ← header::parse()
//! ├──────────────────────┤
//! │  Dimensions          │ ← dimensions::parse()
//! │  (4 bytes × rank)    │
//! ├──────────────────────┤
//! │  Payload             │ ← payload::load()
//! │  (count × width)     │
//! └──────────────────────┘
//! ```

pub mod dimensions;
pub mod header;
pub mod payload;
