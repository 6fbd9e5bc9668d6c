//! Error types for the simulator patcher.
//!
//! Every failure the core can produce maps to one variant here; the message
//! carried by the variant is the one-line diagnostic surfaced to the user.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for patching operations.
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open file '{path}': {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to memory map file '{path}': {source}")]
    MemoryMap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ==================== Fat Wrapper Errors ====================
    #[error("fat Mach-O declares {count} architectures, expected exactly 1")]
    MultipleArchitectures { count: u32 },

    #[error("wrong CPU type {found:#x}, expected {expected:#x}")]
    CpuTypeMismatch { found: u32, expected: u32 },

    #[error("fat arch offset {offset:#x} exceeds the maximum header size {limit:#x}")]
    HeaderOffsetTooLarge { offset: u64, limit: u64 },

    // ==================== Mach-O Errors ====================
    #[error("not a valid Mach-O image (magic {magic:#010x})")]
    InvalidMagic { magic: u32 },

    #[error("load command at offset {offset:#x} extends beyond the command table")]
    LoadCommandOverflow { offset: usize },

    #[error("load commands total {computed:#x} bytes but the header declares {declared:#x}")]
    InconsistentCommandTable { computed: u32, declared: u32 },

    #[error(
        "insufficient freed space for the simulator build version (need {needed} bytes, have {available})"
    )]
    InsufficientCommandSpace { needed: usize, available: usize },

    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

/// A specialized Result type for patching operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a buffer too small error.
    #[inline]
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Error::BufferTooSmall { needed, available }
    }
}
