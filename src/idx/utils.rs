//! Low-level byte reading utilities

use std::io::{ErrorKind, Read};

/// Reads until `buf` is full or the stream ends, returning the number of bytes read.
///
/// Unlike `read_exact`, a short stream is not an error, so callers can report
/// how far it got.
pub fn read_fully(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
