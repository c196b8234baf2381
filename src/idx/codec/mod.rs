//! Low-level primitives shared by every decode stage.
//!
//! # Submodules
//!
//! - [`endian`][]: Host byte-order detection and big-endian normalization
//! - [`alloc`][]: Zero-initialized buffer allocation with bounded retries

pub mod alloc;
pub mod endian;
