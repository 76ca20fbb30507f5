//! Shared constants

/// Byte multiples used when scaling rates
pub const BYTES_PER_KB: f64 = 1024.0;
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Bits per byte
pub const BITS_PER_BYTE: f64 = 8.0;
