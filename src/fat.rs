//! Fat (multi-architecture) wrapper resolution.
//!
//! An iOS executable may ship as a thin 64-bit Mach-O or wrapped in a fat
//! container holding one arch entry per slice. This module locates the single
//! ARM64 image inside the buffer and returns its byte offset.
//!
//! Fat header fields are always stored big-endian; they are decoded with
//! explicit reads rather than overlaying structs onto the buffer.

use crate::error::{Error, Result};
use crate::macho::{FAT_MAGIC, FAT_MAGIC_64, MH_MAGIC_64};
use crate::util::{read_u32_be_at, read_u32_le, read_u64_be_at};

/// Size of the fat header (magic + nfat_arch).
const FAT_HEADER_SIZE: usize = 8;

/// Size of a 32-bit fat arch entry.
const FAT_ARCH_SIZE: usize = 20;

/// Size of a 64-bit fat arch entry.
const FAT_ARCH_64_SIZE: usize = 32;

/// Default bound on the fat arch offset, overridable by the caller.
pub const DEFAULT_MAX_HEADER_SIZE: u64 = 65535;

/// A decoded fat arch entry, reduced to the fields the patcher needs.
#[derive(Debug, Clone, Copy)]
struct FatArchEntry {
    /// CPU type of the slice
    cputype: u32,
    /// Byte offset of the slice within the file
    offset: u64,
}

/// Decodes the single arch entry of a fat wrapper.
///
/// `wide` selects the 64-bit entry layout (FAT_MAGIC_64).
fn read_fat_arch(data: &[u8], wide: bool) -> Result<FatArchEntry> {
    let entry_size = if wide { FAT_ARCH_64_SIZE } else { FAT_ARCH_SIZE };
    let needed = FAT_HEADER_SIZE + entry_size;
    if data.len() < needed {
        return Err(Error::buffer_too_small(needed, data.len()));
    }

    let cputype = read_u32_be_at(data, FAT_HEADER_SIZE);
    let offset = if wide {
        read_u64_be_at(data, FAT_HEADER_SIZE + 8)
    } else {
        u64::from(read_u32_be_at(data, FAT_HEADER_SIZE + 8))
    };

    Ok(FatArchEntry { cputype, offset })
}

/// Resolves the byte offset of the image to patch.
///
/// Returns 0 for a thin 64-bit Mach-O. For a fat wrapper, the wrapper must
/// contain exactly one slice, the slice must match `cputype`, and the slice
/// offset must not exceed `max_header_size`. Any other leading bytes fail
/// with [`Error::InvalidMagic`].
pub fn resolve_image_offset(data: &[u8], cputype: u32, max_header_size: u64) -> Result<usize> {
    if data.len() < 4 {
        return Err(Error::buffer_too_small(4, data.len()));
    }

    let be_magic = read_u32_be_at(data, 0);
    if be_magic == FAT_MAGIC || be_magic == FAT_MAGIC_64 {
        if data.len() < FAT_HEADER_SIZE {
            return Err(Error::buffer_too_small(FAT_HEADER_SIZE, data.len()));
        }

        let nfat_arch = read_u32_be_at(data, 4);
        if nfat_arch != 1 {
            return Err(Error::MultipleArchitectures { count: nfat_arch });
        }

        let arch = read_fat_arch(data, be_magic == FAT_MAGIC_64)?;
        if arch.cputype != cputype {
            return Err(Error::CpuTypeMismatch {
                found: arch.cputype,
                expected: cputype,
            });
        }
        if arch.offset > max_header_size {
            return Err(Error::HeaderOffsetTooLarge {
                offset: arch.offset,
                limit: max_header_size,
            });
        }

        return Ok(arch.offset as usize);
    }

    let le_magic = read_u32_le(data);
    if le_magic == MH_MAGIC_64 {
        return Ok(0);
    }

    Err(Error::InvalidMagic { magic: le_magic })
}

/// Returns true if the leading bytes look like a patchable Mach-O file.
///
/// Used by the file walker to sniff candidates without parsing; the patcher
/// itself re-validates everything.
pub fn is_patchable_magic(prefix: &[u8]) -> bool {
    if prefix.len() < 4 {
        return false;
    }
    let be_magic = read_u32_be_at(prefix, 0);
    be_magic == FAT_MAGIC || be_magic == FAT_MAGIC_64 || read_u32_le(prefix) == MH_MAGIC_64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macho::CPU_TYPE_ARM64;

    fn fat_wrapper(nfat_arch: u32, cputype: u32, offset: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&FAT_MAGIC.to_be_bytes());
        data.extend_from_slice(&nfat_arch.to_be_bytes());
        data.extend_from_slice(&cputype.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes()); // cpusubtype
        data.extend_from_slice(&offset.to_be_bytes());
        data.extend_from_slice(&0x1000u32.to_be_bytes()); // size
        data.extend_from_slice(&14u32.to_be_bytes()); // align
        data
    }

    #[test]
    fn test_thin_image_offset_is_zero() {
        let data = MH_MAGIC_64.to_le_bytes();
        let offset = resolve_image_offset(&data, CPU_TYPE_ARM64, DEFAULT_MAX_HEADER_SIZE).unwrap();
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_fat_wrapper_offset() {
        let data = fat_wrapper(1, CPU_TYPE_ARM64, 0x4000);
        let offset = resolve_image_offset(&data, CPU_TYPE_ARM64, DEFAULT_MAX_HEADER_SIZE).unwrap();
        assert_eq!(offset, 0x4000);
    }

    #[test]
    fn test_fat_wrapper_64_offset() {
        let mut data = Vec::new();
        data.extend_from_slice(&FAT_MAGIC_64.to_be_bytes());
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&CPU_TYPE_ARM64.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes()); // cpusubtype
        data.extend_from_slice(&0x8000u64.to_be_bytes());
        data.extend_from_slice(&0x1000u64.to_be_bytes()); // size
        data.extend_from_slice(&14u32.to_be_bytes()); // align
        data.extend_from_slice(&0u32.to_be_bytes()); // reserved
        let offset = resolve_image_offset(&data, CPU_TYPE_ARM64, DEFAULT_MAX_HEADER_SIZE).unwrap();
        assert_eq!(offset, 0x8000);
    }

    #[test]
    fn test_rejects_multiple_architectures() {
        let data = fat_wrapper(2, CPU_TYPE_ARM64, 0x4000);
        let err = resolve_image_offset(&data, CPU_TYPE_ARM64, DEFAULT_MAX_HEADER_SIZE).unwrap_err();
        assert!(matches!(err, Error::MultipleArchitectures { count: 2 }));
    }

    #[test]
    fn test_rejects_wrong_cputype() {
        let data = fat_wrapper(1, 0x0100_0007, 0x4000); // x86_64
        let err = resolve_image_offset(&data, CPU_TYPE_ARM64, DEFAULT_MAX_HEADER_SIZE).unwrap_err();
        assert!(matches!(err, Error::CpuTypeMismatch { found: 0x0100_0007, .. }));
    }

    #[test]
    fn test_rejects_offset_beyond_limit() {
        let data = fat_wrapper(1, CPU_TYPE_ARM64, 0x2_0000);
        let err = resolve_image_offset(&data, CPU_TYPE_ARM64, DEFAULT_MAX_HEADER_SIZE).unwrap_err();
        assert!(matches!(err, Error::HeaderOffsetTooLarge { offset: 0x2_0000, .. }));
    }

    #[test]
    fn test_rejects_unknown_magic() {
        let data = [0u8; 4];
        let err = resolve_image_offset(&data, CPU_TYPE_ARM64, DEFAULT_MAX_HEADER_SIZE).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { magic: 0 }));
    }

    #[test]
    fn test_magic_sniff() {
        assert!(is_patchable_magic(&MH_MAGIC_64.to_le_bytes()));
        assert!(is_patchable_magic(&FAT_MAGIC.to_be_bytes()));
        assert!(is_patchable_magic(&FAT_MAGIC_64.to_be_bytes()));
        assert!(!is_patchable_magic(&[0u8; 4]));
        assert!(!is_patchable_magic(b"\x7fEL"));
    }
}
