//! Byte-order read helpers.
//!
//! Fat wrapper fields are stored big-endian regardless of host; the image
//! header and load commands are host (little) endian. These helpers keep the
//! two conventions explicit at every read site.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Reads a big-endian u32 from a byte slice at the given offset.
///
/// # Panics
///
/// Panics if `offset + 4 > data.len()`.
#[inline(always)]
pub fn read_u32_be_at(data: &[u8], offset: usize) -> u32 {
    BigEndian::read_u32(&data[offset..])
}

/// Reads a big-endian u64 from a byte slice at the given offset.
///
/// # Panics
///
/// Panics if `offset + 8 > data.len()`.
#[inline(always)]
pub fn read_u64_be_at(data: &[u8], offset: usize) -> u64 {
    BigEndian::read_u64(&data[offset..])
}

/// Reads a little-endian u32 from an unaligned byte slice.
///
/// # Panics
///
/// Panics if `data.len() < 4`.
#[inline(always)]
pub fn read_u32_le(data: &[u8]) -> u32 {
    LittleEndian::read_u32(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u32_be_at() {
        let data = [0xFF, 0x01, 0x02, 0x03, 0x04];
        assert_eq!(read_u32_be_at(&data, 1), 0x01020304);
    }

    #[test]
    fn test_read_u64_be_at() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(read_u64_be_at(&data, 0), 0x0102030405060708);
    }

    #[test]
    fn test_read_u32_le() {
        let data = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(read_u32_le(&data), 0x04030201);
    }
}
