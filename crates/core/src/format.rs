//! Human-readable formatting of throughput values

use crate::constants::{BITS_PER_BYTE, BYTES_PER_GB, BYTES_PER_KB, BYTES_PER_MB};
use netmon_types::SpeedUnit;

/// Scale a byte rate into the given unit without formatting it
pub fn scale_speed(bytes_per_second: f64, unit: SpeedUnit) -> f64 {
    match unit {
        SpeedUnit::Bps => bytes_per_second * BITS_PER_BYTE,
        SpeedUnit::Kbps => bytes_per_second * BITS_PER_BYTE / BYTES_PER_KB,
        SpeedUnit::Mbps => bytes_per_second * BITS_PER_BYTE / BYTES_PER_MB,
        SpeedUnit::Gbps => bytes_per_second * BITS_PER_BYTE / BYTES_PER_GB,
        SpeedUnit::BytesPerSec => bytes_per_second,
        SpeedUnit::KBPerSec => bytes_per_second / BYTES_PER_KB,
        SpeedUnit::MBPerSec => bytes_per_second / BYTES_PER_MB,
        SpeedUnit::GBPerSec => bytes_per_second / BYTES_PER_GB,
    }
}

/// Format a byte rate in the given unit, e.g. `"11.4 Mbps"`.
///
/// Precision depends on magnitude: no decimals from 100 up, one decimal
/// from 10 up, two below that.
pub fn format_speed(bytes_per_second: f64, unit: SpeedUnit) -> String {
    let value = scale_speed(bytes_per_second, unit);
    let suffix = unit.suffix();

    if value >= 100.0 {
        format!("{:.0} {}", value, suffix)
    } else if value >= 10.0 {
        format!("{:.1} {}", value, suffix)
    } else {
        format!("{:.2} {}", value, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mbps_one_decimal() {
        // 1_500_000 * 8 / 1024^2 = 11.44...
        assert_eq!(format_speed(1_500_000.0, SpeedUnit::Mbps), "11.4 Mbps");
    }

    #[test]
    fn test_small_value_two_decimals() {
        // 50 / 1024 = 0.0488...
        assert_eq!(format_speed(50.0, SpeedUnit::KBPerSec), "0.05 KB/s");
    }

    #[test]
    fn test_gigabytes() {
        // 2e9 / 1024^3 = 1.862...
        assert_eq!(format_speed(2_000_000_000.0, SpeedUnit::GBPerSec), "1.86 GB/s");
    }

    #[test]
    fn test_kbps_two_decimals() {
        // 1000 * 8 / 1024 = 7.8125
        assert_eq!(format_speed(1000.0, SpeedUnit::Kbps), "7.81 Kbps");
    }

    #[test]
    fn test_large_value_no_decimals() {
        assert_eq!(format_speed(1000.0, SpeedUnit::BytesPerSec), "1000 B/s");
        assert_eq!(format_speed(125.0, SpeedUnit::Bps), "1000 bps");
        assert_eq!(format_speed(100.0, SpeedUnit::BytesPerSec), "100 B/s");
    }

    #[test]
    fn test_boundary_ten() {
        assert_eq!(format_speed(10.0, SpeedUnit::BytesPerSec), "10.0 B/s");
        assert_eq!(format_speed(9.5, SpeedUnit::BytesPerSec), "9.50 B/s");
    }

    #[test]
    fn test_zero() {
        assert_eq!(format_speed(0.0, SpeedUnit::MBPerSec), "0.00 MB/s");
        assert_eq!(format_speed(0.0, SpeedUnit::Gbps), "0.00 Gbps");
    }

    #[test]
    fn test_scale_bits_vs_bytes() {
        let bytes = 3.0 * BYTES_PER_MB;
        assert!((scale_speed(bytes, SpeedUnit::MBPerSec) - 3.0).abs() < 1e-9);
        assert!((scale_speed(bytes, SpeedUnit::Mbps) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_unit_name_formats_as_kbps() {
        let unit = SpeedUnit::from_name("parsecs");
        assert_eq!(format_speed(1000.0, unit), "7.81 Kbps");
    }
}
