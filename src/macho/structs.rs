//! Mach-O binary structures.
//!
//! These structures match the on-disk format of a 64-bit Mach-O image. All
//! fields are host byte order; the big-endian fat wrapper is decoded with
//! explicit functions in [`crate::fat`] instead of struct overlays.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::constants::*;

// =============================================================================
// Header
// =============================================================================

/// 64-bit Mach-O header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct MachHeader64 {
    /// Magic number (MH_MAGIC_64)
    pub magic: u32,
    /// CPU type
    pub cputype: u32,
    /// CPU subtype
    pub cpusubtype: u32,
    /// File type
    pub filetype: u32,
    /// Number of load commands
    pub ncmds: u32,
    /// Size of load commands
    pub sizeofcmds: u32,
    /// Flags
    pub flags: u32,
    /// Reserved
    pub reserved: u32,
}

impl MachHeader64 {
    /// Size of the header in bytes.
    pub const SIZE: usize = 32;

    /// Returns true if this is a valid 64-bit Mach-O header.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MH_MAGIC_64
    }
}

impl Default for MachHeader64 {
    fn default() -> Self {
        Self {
            magic: MH_MAGIC_64,
            cputype: 0,
            cpusubtype: 0,
            filetype: 0,
            ncmds: 0,
            sizeofcmds: 0,
            flags: 0,
            reserved: 0,
        }
    }
}

// =============================================================================
// Load Command Header
// =============================================================================

/// Generic load command header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct LoadCommand {
    /// Type of load command
    pub cmd: u32,
    /// Size of load command
    pub cmdsize: u32,
}

impl LoadCommand {
    /// Size of the load command header.
    pub const SIZE: usize = 8;
}

// =============================================================================
// Build Version Command
// =============================================================================

/// Build version command.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct BuildVersionCommand {
    /// LC_BUILD_VERSION
    pub cmd: u32,
    /// Size of this load command (includes tool entries)
    pub cmdsize: u32,
    /// Platform
    pub platform: u32,
    /// Minimum OS version (X.Y.Z packed into 32 bits)
    pub minos: u32,
    /// SDK version (X.Y.Z packed into 32 bits)
    pub sdk: u32,
    /// Number of tool entries following
    pub ntools: u32,
}

impl BuildVersionCommand {
    /// Size of this command (without tool entries).
    pub const SIZE: usize = 24;
}

/// Tool version entry trailing a build version command.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct BuildToolVersion {
    /// Tool identifier (TOOL_CLANG, TOOL_LD, ...)
    pub tool: u32,
    /// Tool version (X.Y.Z packed into 32 bits)
    pub version: u32,
}

impl BuildToolVersion {
    /// Size of a tool entry.
    pub const SIZE: usize = 8;
}

// =============================================================================
// Encryption Info Command
// =============================================================================

/// 32-bit encryption info command.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct EncryptionInfoCommand {
    /// LC_ENCRYPTION_INFO
    pub cmd: u32,
    /// Size of this load command
    pub cmdsize: u32,
    /// File offset of encrypted range
    pub cryptoff: u32,
    /// Size of encrypted range
    pub cryptsize: u32,
    /// Encryption system ID (0 = not encrypted yet)
    pub cryptid: u32,
}

impl EncryptionInfoCommand {
    /// Size of this command.
    pub const SIZE: usize = 20;
}

/// 64-bit encryption info command.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct EncryptionInfoCommand64 {
    /// LC_ENCRYPTION_INFO_64
    pub cmd: u32,
    /// Size of this load command
    pub cmdsize: u32,
    /// File offset of encrypted range
    pub cryptoff: u32,
    /// Size of encrypted range
    pub cryptsize: u32,
    /// Encryption system ID (0 = not encrypted yet)
    pub cryptid: u32,
    /// Padding
    pub pad: u32,
}

impl EncryptionInfoCommand64 {
    /// Size of this command.
    pub const SIZE: usize = 24;
}

// =============================================================================
// Version Min Command
// =============================================================================

/// Minimum OS version command (LC_VERSION_MIN_IPHONEOS and friends).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct VersionMinCommand {
    /// LC_VERSION_MIN_* command
    pub cmd: u32,
    /// Size of this load command
    pub cmdsize: u32,
    /// Minimum OS version (X.Y.Z packed into 32 bits)
    pub version: u32,
    /// SDK version (X.Y.Z packed into 32 bits)
    pub sdk: u32,
}

impl VersionMinCommand {
    /// Size of this command.
    pub const SIZE: usize = 16;
}
