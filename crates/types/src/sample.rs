//! Network interface readings and throughput samples

use serde::{Deserialize, Serialize};

/// Operational status of an interface as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterfaceStatus {
    Up,
    Down,
    #[default]
    Unknown,
}

/// Coarse interface classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterfaceKind {
    Loopback,
    Tunnel,
    /// Physical or virtual adapter
    #[default]
    Other,
}

/// One enumerated network interface with its cumulative counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub name: String,
    pub status: InterfaceStatus,
    pub kind: InterfaceKind,
    /// Cumulative bytes received
    pub bytes_received: u64,
    /// Cumulative bytes sent
    pub bytes_sent: u64,
}

impl InterfaceInfo {
    /// Whether this interface contributes to the throughput totals
    pub fn is_counted(&self) -> bool {
        self.status == InterfaceStatus::Up
            && !matches!(self.kind, InterfaceKind::Loopback | InterfaceKind::Tunnel)
    }
}

/// Cumulative byte counters summed over all counted interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterfaceCounters {
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

impl InterfaceCounters {
    /// Sum counters over the interfaces that are up and neither loopback nor tunnel
    pub fn from_interfaces<'a, I>(interfaces: I) -> Self
    where
        I: IntoIterator<Item = &'a InterfaceInfo>,
    {
        interfaces
            .into_iter()
            .filter(|iface| iface.is_counted())
            .fold(Self::default(), |acc, iface| Self {
                bytes_received: acc.bytes_received.saturating_add(iface.bytes_received),
                bytes_sent: acc.bytes_sent.saturating_add(iface.bytes_sent),
            })
    }
}

/// Throughput estimate emitted once per tick (never on the first tick)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SpeedSample {
    /// Download rate in bytes per second, never negative
    pub download_bytes_per_sec: f64,
    /// Upload rate in bytes per second, never negative
    pub upload_bytes_per_sec: f64,
}
