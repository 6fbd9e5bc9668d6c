//! Load-command rewriting for the iOS Simulator.
//!
//! The patcher takes a device binary and makes it loadable by the simulator
//! runtime: encryption-info and minimum-iOS-version load commands are
//! removed, the build version command is forced to the iOS Simulator
//! platform, and the command table is compacted in a single forward pass so
//! no gaps remain.
//!
//! All edits are staged on a scratch copy of the command table and committed
//! to the caller's buffer only once the whole pipeline has succeeded, so a
//! failed call never leaves the buffer partially rewritten.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Error, Result};
use crate::fat;
use crate::macho::{
    BuildToolVersion, BuildVersionCommand, LoadCommand, MachHeader64, CPU_TYPE_ARM64,
    LC_BUILD_VERSION, LC_ENCRYPTION_INFO, LC_ENCRYPTION_INFO_64, LC_VERSION_MIN_IPHONEOS,
    PLATFORM_IOSSIMULATOR, TOOL_LD,
};

// =============================================================================
// Canonical Simulator Build Version
// =============================================================================

/// Minimum OS version written into the simulator record (14.0).
const SIMULATOR_MINOS: u32 = 0x000E_0000;

/// SDK version written into the simulator record (14.2).
const SIMULATOR_SDK: u32 = 0x000E_0200;

/// ld version written into the simulator record (609.7.0).
const SIMULATOR_LD_VERSION: u32 = 0x0261_0700;

/// The fixed build version record every patched image carries.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct SimulatorBuildVersion {
    /// The build version command proper
    pub command: BuildVersionCommand,
    /// The single trailing tool entry
    pub tool: BuildToolVersion,
}

impl SimulatorBuildVersion {
    /// Total size of the record, command plus one tool entry.
    pub const SIZE: usize = BuildVersionCommand::SIZE + BuildToolVersion::SIZE;
}

/// Returns the canonical simulator build version record.
pub fn simulator_build_version() -> SimulatorBuildVersion {
    SimulatorBuildVersion {
        command: BuildVersionCommand {
            cmd: LC_BUILD_VERSION,
            cmdsize: SimulatorBuildVersion::SIZE as u32,
            platform: PLATFORM_IOSSIMULATOR,
            minos: SIMULATOR_MINOS,
            sdk: SIMULATOR_SDK,
            ntools: 1,
        },
        tool: BuildToolVersion {
            tool: TOOL_LD,
            version: SIMULATOR_LD_VERSION,
        },
    }
}

// =============================================================================
// Options and Summary
// =============================================================================

/// Tunables for a patch run.
#[derive(Debug, Clone)]
pub struct PatchOptions {
    /// Upper bound on the fat arch offset; larger offsets are rejected.
    pub max_header_size: u64,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            max_header_size: fat::DEFAULT_MAX_HEADER_SIZE,
        }
    }
}

/// What a successful patch run did to the image.
#[derive(Debug, Clone, Copy)]
pub struct PatchSummary {
    /// Byte offset of the patched image within the buffer (0 for thin files)
    pub image_offset: usize,
    /// Net number of load commands removed from the table
    pub removed_commands: u32,
    /// Net number of bytes removed from the command table
    pub removed_bytes: u32,
    /// True if an existing build version command was rewritten in place
    pub replaced_build_version: bool,
    /// True if the simulator build version was appended to the table
    pub inserted_build_version: bool,
}

// =============================================================================
// Compaction
// =============================================================================

/// Result of compacting a command table in place.
struct Compaction {
    removed_bytes: u32,
    removed_count: u32,
    replaced: bool,
    inserted: bool,
}

/// Returns true for command kinds the simulator cannot load.
#[inline]
fn is_droppable(cmd: u32) -> bool {
    matches!(
        cmd,
        LC_ENCRYPTION_INFO | LC_ENCRYPTION_INFO_64 | LC_VERSION_MIN_IPHONEOS
    )
}

/// Compacts the command table, dropping simulator-incompatible commands and
/// forcing exactly one canonical build version record.
///
/// `table` is exactly `sizeofcmds` bytes long. Kept commands slide left over
/// the holes opened by dropped ones in the same pass, so the table stays
/// contiguous throughout.
fn compact_table(table: &mut [u8], ncmds: u32) -> Result<Compaction> {
    let canonical = simulator_build_version();

    let mut removed_bytes: u32 = 0;
    let mut removed_count: u32 = 0;
    let mut sizeof_seen: u32 = 0;
    let mut replaced = false;

    let mut offset = 0usize;
    for _ in 0..ncmds {
        if offset + LoadCommand::SIZE > table.len() {
            return Err(Error::LoadCommandOverflow { offset });
        }
        // cmdsize is read before any overwrite below so the scan always
        // advances by the record's original span.
        let lc = LoadCommand::read_from_prefix(&table[offset..])
            .map_err(|_| Error::LoadCommandOverflow { offset })?
            .0;
        let cmdsize = lc.cmdsize as usize;
        if cmdsize < LoadCommand::SIZE || offset + cmdsize > table.len() {
            return Err(Error::LoadCommandOverflow { offset });
        }

        let mut dropped = false;
        if is_droppable(lc.cmd) {
            dropped = true;
            removed_bytes += lc.cmdsize;
            removed_count += 1;
        } else if lc.cmd == LC_BUILD_VERSION {
            if cmdsize == SimulatorBuildVersion::SIZE {
                table[offset..offset + SimulatorBuildVersion::SIZE]
                    .copy_from_slice(canonical.as_bytes());
                replaced = true;
            } else {
                // A build version with extra tool entries cannot be
                // rewritten in place without breaking the table layout;
                // drop it and let the append step supply the canonical one.
                dropped = true;
                removed_bytes += lc.cmdsize;
                removed_count += 1;
            }
        }

        if removed_bytes > 0 && !dropped {
            table.copy_within(offset..offset + cmdsize, offset - removed_bytes as usize);
        }

        sizeof_seen += lc.cmdsize;
        offset += cmdsize;
    }

    if sizeof_seen as usize != table.len() {
        return Err(Error::InconsistentCommandTable {
            computed: sizeof_seen,
            declared: table.len() as u32,
        });
    }

    let mut inserted = false;
    if !replaced {
        if (removed_bytes as usize) < SimulatorBuildVersion::SIZE {
            return Err(Error::InsufficientCommandSpace {
                needed: SimulatorBuildVersion::SIZE,
                available: removed_bytes as usize,
            });
        }
        let end = table.len() - removed_bytes as usize;
        table[end..end + SimulatorBuildVersion::SIZE].copy_from_slice(canonical.as_bytes());
        removed_bytes -= SimulatorBuildVersion::SIZE as u32;
        removed_count -= 1;
        inserted = true;
    }

    Ok(Compaction {
        removed_bytes,
        removed_count,
        replaced,
        inserted,
    })
}

// =============================================================================
// Entry Point
// =============================================================================

/// Rewrites `data` in place so the contained ARM64 image runs under the iOS
/// Simulator.
///
/// The buffer may hold a thin 64-bit Mach-O or a single-slice fat wrapper.
/// On success the image's command table has been compacted and its header
/// counts updated; the bytes past the shortened table are left as they were.
/// On any error the buffer is byte-identical to the input.
pub fn patch_for_simulator(data: &mut [u8], options: &PatchOptions) -> Result<PatchSummary> {
    let image_offset = fat::resolve_image_offset(data, CPU_TYPE_ARM64, options.max_header_size)?;

    let image = &data[image_offset..];
    if image.len() < MachHeader64::SIZE {
        return Err(Error::buffer_too_small(
            image_offset + MachHeader64::SIZE,
            data.len(),
        ));
    }
    let header = MachHeader64::read_from_prefix(image)
        .map_err(|_| Error::buffer_too_small(MachHeader64::SIZE, image.len()))?
        .0;
    if !header.is_valid() {
        return Err(Error::InvalidMagic {
            magic: header.magic,
        });
    }

    let table_start = image_offset + MachHeader64::SIZE;
    let table_len = header.sizeofcmds as usize;
    if table_start + table_len > data.len() {
        return Err(Error::buffer_too_small(table_start + table_len, data.len()));
    }

    // Scratch copy: all validation and compaction happen here, the caller's
    // buffer is only written after the whole table has been rebuilt.
    let mut table = data[table_start..table_start + table_len].to_vec();
    let compaction = compact_table(&mut table, header.ncmds)?;

    let mut patched = header;
    patched.ncmds -= compaction.removed_count;
    patched.sizeofcmds -= compaction.removed_bytes;

    data[table_start..table_start + table_len].copy_from_slice(&table);
    data[image_offset..table_start].copy_from_slice(patched.as_bytes());

    Ok(PatchSummary {
        image_offset,
        removed_commands: compaction.removed_count,
        removed_bytes: compaction.removed_bytes,
        replaced_build_version: compaction.replaced,
        inserted_build_version: compaction.inserted,
    })
}
