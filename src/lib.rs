//! netmon: A small network throughput monitor
//!
//! This library provides the core functionality for netmon, including:
//! - A periodic sampler turning cumulative interface counters into rates
//! - A settings store with durable persistence and change notification
//! - Speed formatting in bit and byte units

pub mod config;
pub mod core;

// Re-export commonly used types
pub use config::{SettingsState, SettingsStore};
pub use core::{ClockError, SampleClock, SubscriptionId};
pub use netmon_core::{format_speed, InterfaceProvider};
pub use netmon_types::{AppSettings, SpeedSample, SpeedUnit};
