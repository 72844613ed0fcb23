//! Nibble packing: two 4-bit color indices per byte.

use super::IndexStream;
use crate::api::EncodeError;

/// Pack indices two per byte, first index in the high nibble.
///
/// An odd trailing index becomes a high nibble with a zero low nibble, so
/// the result is always `ceil(len / 2)` bytes.
///
/// ```
/// use panel_encode::pack_nibbles;
///
/// assert_eq!(pack_nibbles(&[1, 0, 3, 2]), vec![0x10, 0x32]);
/// assert_eq!(pack_nibbles(&[6]), vec![0x60]);
/// ```
pub fn pack_nibbles(indices: &[u8]) -> Vec<u8> {
    indices
        .chunks(2)
        .map(|pair| {
            let hi = pair[0] & 0x0F;
            let lo = pair.get(1).copied().unwrap_or(0) & 0x0F;
            (hi << 4) | lo
        })
        .collect()
}

/// Pack a full panel frame.
///
/// Fails with [`EncodeError::SizeMismatch`] before producing any output if
/// the stream does not hold exactly `expected` indices.
pub fn pack_panel(stream: &IndexStream, expected: usize) -> Result<Vec<u8>, EncodeError> {
    if stream.len() != expected {
        return Err(EncodeError::SizeMismatch {
            expected,
            actual: stream.len(),
        });
    }
    Ok(pack_nibbles(stream.indices()))
}

/// Split packed bytes back into `len` indices.
///
/// `len` may be odd, in which case the last low nibble is dropped.
pub fn unpack_nibbles(bytes: &[u8], len: usize) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|&b| [b >> 4, b & 0x0F])
        .take(len)
        .collect()
}
