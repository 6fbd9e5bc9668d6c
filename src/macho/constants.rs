//! Mach-O constants.

// =============================================================================
// Magic Numbers
// =============================================================================

/// 64-bit Mach-O magic (little-endian)
pub const MH_MAGIC_64: u32 = 0xFEEDFACF;

/// FAT binary magic, 32-bit arch entries (stored big-endian)
pub const FAT_MAGIC: u32 = 0xCAFEBABE;

/// FAT binary magic, 64-bit arch entries (stored big-endian)
pub const FAT_MAGIC_64: u32 = 0xCAFEBABF;

// =============================================================================
// CPU Types
// =============================================================================

/// 64-bit architecture flag
pub const CPU_ARCH_ABI64: u32 = 0x0100_0000;

/// ARM CPU type
pub const CPU_TYPE_ARM: u32 = 12;
/// ARM64 CPU type
pub const CPU_TYPE_ARM64: u32 = CPU_TYPE_ARM | CPU_ARCH_ABI64;

// =============================================================================
// Load Commands
// =============================================================================

/// Encrypted segment information
pub const LC_ENCRYPTION_INFO: u32 = 0x21;
/// Build for iOS min version
pub const LC_VERSION_MIN_IPHONEOS: u32 = 0x25;
/// 64-bit encrypted segment information
pub const LC_ENCRYPTION_INFO_64: u32 = 0x2C;
/// Build for platform min version
pub const LC_BUILD_VERSION: u32 = 0x32;

// =============================================================================
// Build Version Platforms
// =============================================================================

/// macOS
pub const PLATFORM_MACOS: u32 = 1;
/// iOS
pub const PLATFORM_IOS: u32 = 2;
/// iOS Simulator
pub const PLATFORM_IOSSIMULATOR: u32 = 7;

// =============================================================================
// Build Tools
// =============================================================================

/// clang
pub const TOOL_CLANG: u32 = 1;
/// swift compiler
pub const TOOL_SWIFT: u32 = 2;
/// ld
pub const TOOL_LD: u32 = 3;
