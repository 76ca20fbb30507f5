//! sysinfo-backed network interface provider

use crate::classify::{classify, SYSFS_NET};
use anyhow::Result;
use netmon_core::{InterfaceProvider, ProviderMetadata};
use netmon_types::InterfaceInfo;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Mutex;
use sysinfo::Networks;

/// Shared Networks instance for all providers.
/// Restarting the sampler creates a new provider, so keep the sysinfo state.
static SHARED_NETWORKS: Lazy<Mutex<Networks>> = Lazy::new(|| {
    log::info!("Creating shared Networks sysinfo instance");
    Mutex::new(Networks::new_with_refreshed_list())
});

/// Network interface provider
///
/// Reads cumulative counters from sysinfo and classifies each interface
/// through sysfs (or by name where sysfs is unavailable).
pub struct SysinfoInterfaceProvider {
    metadata: ProviderMetadata,
    sysfs_root: PathBuf,
}

impl SysinfoInterfaceProvider {
    pub fn new() -> Self {
        Self::with_sysfs_root(SYSFS_NET)
    }

    /// Use a different sysfs directory for classification
    pub fn with_sysfs_root(root: impl Into<PathBuf>) -> Self {
        let metadata = ProviderMetadata {
            id: "sysinfo".to_string(),
            name: "System Network Interfaces".to_string(),
            description: "Cumulative interface counters from the operating system".to_string(),
        };

        Self {
            metadata,
            sysfs_root: root.into(),
        }
    }
}

impl Default for SysinfoInterfaceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceProvider for SysinfoInterfaceProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn interfaces(&mut self) -> Result<Vec<InterfaceInfo>> {
        let mut networks = SHARED_NETWORKS
            .lock()
            .map_err(|e| anyhow::anyhow!("Networks mutex poisoned: {}", e))?;
        // Picks up interfaces that appeared since the last tick
        networks.refresh_list();

        let mut readings: Vec<(String, u64, u64)> = networks
            .iter()
            .map(|(name, data)| (name.clone(), data.total_received(), data.total_transmitted()))
            .collect();

        // Drop the lock before touching the filesystem
        drop(networks);

        readings.sort_by(|a, b| a.0.cmp(&b.0));

        let interfaces = readings
            .into_iter()
            .map(|(name, rx, tx)| {
                let (status, kind) = classify(&self.sysfs_root, &name);
                InterfaceInfo {
                    name,
                    status,
                    kind,
                    bytes_received: rx,
                    bytes_sent: tx,
                }
            })
            .collect();

        Ok(interfaces)
    }
}
