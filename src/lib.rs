//! simpatch - patch iOS Mach-O executables for the iOS Simulator.
//!
//! This library rewrites the load-command table of a 64-bit ARM64 Mach-O
//! binary built for an iOS device so the iOS Simulator runtime will load it:
//!
//! - `LC_ENCRYPTION_INFO` / `LC_ENCRYPTION_INFO_64` and
//!   `LC_VERSION_MIN_IPHONEOS` commands are removed
//! - the `LC_BUILD_VERSION` command is forced to the iOS Simulator platform
//!   (inserted if the binary has none)
//! - the command table is compacted and the header counts updated
//!
//! The whole transformation runs against a single caller-owned byte buffer;
//! reading and writing the file is up to the caller. On failure the buffer
//! is left byte-identical to the input.
//!
//! # Example
//!
//! ```no_run
//! use simpatch::{patch_for_simulator, PatchOptions};
//!
//! fn main() -> simpatch::Result<()> {
//!     let mut data = std::fs::read("Payload/App.app/App")?;
//!     let summary = patch_for_simulator(&mut data, &PatchOptions::default())?;
//!     println!("removed {} load commands", summary.removed_commands);
//!     std::fs::write("Payload/App.app/App", &data)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fat;
pub mod macho;
pub mod patch;
pub mod util;

// Re-export main types
pub use error::{Error, Result};
pub use fat::{is_patchable_magic, resolve_image_offset, DEFAULT_MAX_HEADER_SIZE};
pub use patch::{patch_for_simulator, simulator_build_version, PatchOptions, PatchSummary};
