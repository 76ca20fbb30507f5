//! Interface provider trait and related types

use anyhow::Result;
use netmon_types::{InterfaceCounters, InterfaceInfo};

/// Metadata about an interface provider
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    /// Unique identifier for this provider type
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of where the counters come from
    pub description: String,
}

/// Trait for everything that can enumerate network interfaces
///
/// Providers are polled once per tick from the sampler's worker thread, so
/// `interfaces` must be bounded: no waiting on user input or network
/// round-trips.
pub trait InterfaceProvider: Send {
    /// Get metadata about this provider
    fn metadata(&self) -> &ProviderMetadata;

    /// Enumerate all interfaces with their current cumulative counters
    fn interfaces(&mut self) -> Result<Vec<InterfaceInfo>>;

    /// Read counters summed over the interfaces that count towards throughput
    fn read_counters(&mut self) -> Result<InterfaceCounters> {
        let interfaces = self.interfaces()?;
        Ok(InterfaceCounters::from_interfaces(&interfaces))
    }
}

/// Type-erased provider for dynamic dispatch
pub type BoxedInterfaceProvider = Box<dyn InterfaceProvider>;
