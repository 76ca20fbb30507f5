//! netmon-core: Core traits and helpers for the netmon network monitor.
//!
//! This crate contains the interface provider trait, speed formatting and
//! shared constants.

pub mod constants;
mod format;
mod interface_provider;

pub use constants::{BITS_PER_BYTE, BYTES_PER_GB, BYTES_PER_KB, BYTES_PER_MB};
pub use format::{format_speed, scale_speed};
pub use interface_provider::{BoxedInterfaceProvider, InterfaceProvider, ProviderMetadata};

// Re-export types used in trait signatures for convenience
pub use netmon_types::{InterfaceCounters, InterfaceInfo, InterfaceKind, InterfaceStatus, SpeedUnit};
