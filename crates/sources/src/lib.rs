//! netmon-sources: Operating system interface providers for netmon.

mod classify;
mod network;

pub use classify::{classify, kind_from_name, status_from_operstate, SYSFS_NET};
pub use network::SysinfoInterfaceProvider;
