//! Big-endian to host byte-order normalization.
//!
//! IDX stores every header and dimension field big-endian. Values are read
//! in native order and swapped only when the host turns out to be
//! little-endian. Payload bytes never pass through here.

use std::sync::OnceLock;
use log::debug;

/// Host endianness, probed once per process.
static HOST_LITTLE_ENDIAN: OnceLock<bool> = OnceLock::new();

/// Returns `true` when the host stores the least significant byte first.
///
/// Determined at runtime from the byte layout of a known integer.
pub fn host_is_little_endian() -> bool {
    *HOST_LITTLE_ENDIAN.get_or_init(|| {
        let probe: u32 = 1;
        let little = probe.to_ne_bytes()[0] == 1;
        debug!("Host byte order: {}", if little { "little-endian" } else { "big-endian" });
        little
    })
}

/// Converts a big-endian on-disk word, loaded in native order, to host order.
///
/// Applying it twice yields the original value.
pub fn to_host_order(raw: u32) -> u32 {
    if host_is_little_endian() {
        raw.swap_bytes()
    } else {
        raw
    }
}
