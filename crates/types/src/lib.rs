//! netmon-types: Shared data types for the netmon network monitor.
//!
//! This crate contains pure data types (settings, units, interface readings
//! and throughput samples) shared by every netmon crate. It has no OS or
//! threading dependencies.

pub mod sample;
pub mod settings;

// Re-export commonly used types at the crate root for convenience
pub use sample::{InterfaceCounters, InterfaceInfo, InterfaceKind, InterfaceStatus, SpeedSample};
pub use settings::{
    AppSettings, BackgroundStyle, ColorPreset, SpeedUnit, COLOR_PRESETS, DEFAULT_REFRESH_RATE_MS,
};
