//! Interface status and kind detection
//!
//! sysinfo only reports counters, so status and kind come from sysfs on
//! Linux and from the interface name everywhere else.

use netmon_types::{InterfaceKind, InterfaceStatus};
use std::path::Path;

/// Default sysfs location of network interfaces
pub const SYSFS_NET: &str = "/sys/class/net";

// ARPHRD_* values from <linux/if_arp.h>
const ARPHRD_TUNNEL: u32 = 768;
const ARPHRD_TUNNEL6: u32 = 769;
const ARPHRD_LOOPBACK: u32 = 772;
const ARPHRD_SIT: u32 = 776;
const ARPHRD_IPGRE: u32 = 778;
const ARPHRD_IP6GRE: u32 = 823;
/// Used by tun and wireguard devices
const ARPHRD_NONE: u32 = 65534;

const TUNNEL_PREFIXES: &[&str] = &["tun", "utun", "wg", "gif", "stf", "ipsec", "sit", "gre", "ip6tnl"];

/// Classify an interface, preferring sysfs and falling back to its name
pub fn classify(sysfs_root: &Path, name: &str) -> (InterfaceStatus, InterfaceKind) {
    match classify_sysfs(sysfs_root, name) {
        Some(result) => result,
        None => (InterfaceStatus::Up, kind_from_name(name)),
    }
}

/// Read `operstate` and `type` for an interface from sysfs.
///
/// Returns None if the interface directory is missing (non-Linux systems
/// or an interface that disappeared between enumeration and classification).
pub fn classify_sysfs(sysfs_root: &Path, name: &str) -> Option<(InterfaceStatus, InterfaceKind)> {
    let dir = sysfs_root.join(name);
    if !dir.is_dir() {
        return None;
    }

    let status = std::fs::read_to_string(dir.join("operstate"))
        .map(|s| status_from_operstate(&s))
        .unwrap_or(InterfaceStatus::Unknown);

    let kind = std::fs::read_to_string(dir.join("type"))
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .map(kind_from_arphrd)
        .unwrap_or_else(|| kind_from_name(name));

    Some((status, kind))
}

/// Map a sysfs `operstate` value to a status
pub fn status_from_operstate(operstate: &str) -> InterfaceStatus {
    match operstate.trim() {
        "up" => InterfaceStatus::Up,
        "down" | "lowerlayerdown" | "notpresent" | "dormant" => InterfaceStatus::Down,
        _ => InterfaceStatus::Unknown,
    }
}

/// Map an ARPHRD hardware type to a kind
pub fn kind_from_arphrd(arphrd: u32) -> InterfaceKind {
    match arphrd {
        ARPHRD_LOOPBACK => InterfaceKind::Loopback,
        ARPHRD_TUNNEL | ARPHRD_TUNNEL6 | ARPHRD_SIT | ARPHRD_IPGRE | ARPHRD_IP6GRE
        | ARPHRD_NONE => InterfaceKind::Tunnel,
        _ => InterfaceKind::Other,
    }
}

/// Guess the kind from common interface naming schemes
pub fn kind_from_name(name: &str) -> InterfaceKind {
    let lower = name.to_ascii_lowercase();
    if lower == "lo" || lower.starts_with("lo0") || lower.contains("loopback") {
        return InterfaceKind::Loopback;
    }
    if TUNNEL_PREFIXES.iter().any(|p| lower.starts_with(p))
        || lower.contains("tunnel")
        || lower.contains("teredo")
        || lower.contains("isatap")
    {
        return InterfaceKind::Tunnel;
    }
    InterfaceKind::Other
}
