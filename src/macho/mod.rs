//! Mach-O file format handling.
//!
//! This module provides the constants and on-disk structures needed to
//! rewrite the load-command table of a 64-bit Mach-O executable.

mod constants;
mod structs;

pub use constants::*;
pub use structs::*;
