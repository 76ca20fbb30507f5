//! Persisted application settings

use serde::{Deserialize, Serialize};

/// Default refresh rate in milliseconds
pub const DEFAULT_REFRESH_RATE_MS: i32 = 1000;

/// Unit used to display a throughput value.
///
/// The first four are bit rates, the last four byte rates. Both families
/// scale by powers of 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String")]
pub enum SpeedUnit {
    Bps,
    #[default]
    Kbps,
    Mbps,
    Gbps,
    BytesPerSec,
    KBPerSec,
    MBPerSec,
    GBPerSec,
}

impl SpeedUnit {
    /// All units, in menu order
    pub const ALL: [SpeedUnit; 8] = [
        SpeedUnit::Bps,
        SpeedUnit::Kbps,
        SpeedUnit::Mbps,
        SpeedUnit::Gbps,
        SpeedUnit::BytesPerSec,
        SpeedUnit::KBPerSec,
        SpeedUnit::MBPerSec,
        SpeedUnit::GBPerSec,
    ];

    /// Parse a unit from its name or display suffix.
    ///
    /// Accepts variant names ("KBPerSec"), suffixes ("KB/s") and the short
    /// forms used on the command line ("kbps", "KBps").
    pub fn parse(name: &str) -> Option<Self> {
        let unit = match name.trim() {
            "Bps" | "bps" | "bit/s" => SpeedUnit::Bps,
            "Kbps" | "kbps" | "Kbit/s" => SpeedUnit::Kbps,
            "Mbps" | "mbps" | "Mbit/s" => SpeedUnit::Mbps,
            "Gbps" | "gbps" | "Gbit/s" => SpeedUnit::Gbps,
            "BytesPerSec" | "B/s" | "BPS" | "Bytes" => SpeedUnit::BytesPerSec,
            "KBPerSec" | "KB/s" | "KBPS" | "KBps" => SpeedUnit::KBPerSec,
            "MBPerSec" | "MB/s" | "MBPS" | "MBps" => SpeedUnit::MBPerSec,
            "GBPerSec" | "GB/s" | "GBPS" | "GBps" => SpeedUnit::GBPerSec,
            _ => return None,
        };
        Some(unit)
    }

    /// Like [`SpeedUnit::parse`], but unknown names resolve to [`SpeedUnit::Kbps`]
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            log::debug!("Unknown speed unit {:?}, falling back to Kbps", name);
            SpeedUnit::Kbps
        })
    }

    /// Display suffix, e.g. "Kbps" or "MB/s"
    pub fn suffix(self) -> &'static str {
        match self {
            SpeedUnit::Bps => "bps",
            SpeedUnit::Kbps => "Kbps",
            SpeedUnit::Mbps => "Mbps",
            SpeedUnit::Gbps => "Gbps",
            SpeedUnit::BytesPerSec => "B/s",
            SpeedUnit::KBPerSec => "KB/s",
            SpeedUnit::MBPerSec => "MB/s",
            SpeedUnit::GBPerSec => "GB/s",
        }
    }
}

impl From<String> for SpeedUnit {
    fn from(name: String) -> Self {
        SpeedUnit::from_name(&name)
    }
}

/// Window background style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BackgroundStyle {
    #[default]
    Blur,
    Solid,
    Transparent,
}

/// Named download/upload colour pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPreset {
    pub name: &'static str,
    pub download: &'static str,
    pub upload: &'static str,
}

/// Built-in colour presets. The first one matches the default settings.
pub const COLOR_PRESETS: [ColorPreset; 8] = [
    ColorPreset { name: "Ocean", download: "#00D4AA", upload: "#FF6B6B" },
    ColorPreset { name: "Neon", download: "#00FF88", upload: "#FF00FF" },
    ColorPreset { name: "Sunset", download: "#FFD700", upload: "#FF4500" },
    ColorPreset { name: "Ice", download: "#00BFFF", upload: "#FF69B4" },
    ColorPreset { name: "Forest", download: "#32CD32", upload: "#FFA500" },
    ColorPreset { name: "Galaxy", download: "#9370DB", upload: "#FF1493" },
    ColorPreset { name: "Classic", download: "#00FF00", upload: "#FF0000" },
    ColorPreset { name: "Cyan", download: "#00FFFF", upload: "#FF8C00" },
];

fn default_refresh_rate_ms() -> i32 {
    DEFAULT_REFRESH_RATE_MS
}

fn default_window_left() -> f64 {
    100.0
}

fn default_window_top() -> f64 {
    100.0
}

fn default_window_width() -> f64 {
    160.0
}

fn default_window_height() -> f64 {
    100.0
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f64 {
    0.9
}

fn default_font_size() -> f64 {
    14.0
}

fn default_background_color() -> String {
    "#1E1E1E".to_string()
}

fn default_download_color() -> String {
    COLOR_PRESETS[0].download.to_string()
}

fn default_upload_color() -> String {
    COLOR_PRESETS[0].upload.to_string()
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    // Position
    #[serde(default = "default_window_left")]
    pub window_left: f64,
    #[serde(default = "default_window_top")]
    pub window_top: f64,
    #[serde(default = "default_window_width")]
    pub window_width: f64,
    #[serde(default = "default_window_height")]
    pub window_height: f64,

    // Display
    #[serde(default = "default_true")]
    pub always_on_top: bool,
    #[serde(default = "default_true")]
    pub is_vertical_layout: bool,
    /// Window opacity (0.0 to 1.0)
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_font_size")]
    pub font_size: f64,

    // Background
    #[serde(default)]
    pub background_style: BackgroundStyle,
    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Unit used when formatting samples
    #[serde(default)]
    pub speed_unit: SpeedUnit,

    // Colors
    #[serde(default = "default_download_color")]
    pub download_color: String,
    #[serde(default = "default_upload_color")]
    pub upload_color: String,

    // Behavior
    #[serde(default = "default_true")]
    pub minimize_to_tray: bool,
    #[serde(default)]
    pub start_minimized: bool,
    #[serde(default)]
    pub start_with_system: bool,

    /// Sampling interval in milliseconds, always > 0 after [`AppSettings::sanitize`]
    #[serde(default = "default_refresh_rate_ms")]
    pub refresh_rate_ms: i32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            window_left: default_window_left(),
            window_top: default_window_top(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            always_on_top: true,
            is_vertical_layout: true,
            opacity: default_opacity(),
            font_size: default_font_size(),
            background_style: BackgroundStyle::default(),
            background_color: default_background_color(),
            speed_unit: SpeedUnit::default(),
            download_color: default_download_color(),
            upload_color: default_upload_color(),
            minimize_to_tray: true,
            start_minimized: false,
            start_with_system: false,
            refresh_rate_ms: DEFAULT_REFRESH_RATE_MS,
        }
    }
}

impl AppSettings {
    /// Replace out-of-range values with their defaults.
    ///
    /// Returns true if anything was changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;
        if self.refresh_rate_ms <= 0 {
            log::warn!(
                "Invalid refresh rate {} ms, using {} ms",
                self.refresh_rate_ms,
                DEFAULT_REFRESH_RATE_MS
            );
            self.refresh_rate_ms = DEFAULT_REFRESH_RATE_MS;
            changed = true;
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            self.opacity = self.opacity.clamp(0.0, 1.0);
            changed = true;
        }
        changed
    }

    /// Apply a colour preset by name. Returns false if no preset matches.
    pub fn apply_preset(&mut self, name: &str) -> bool {
        match COLOR_PRESETS
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
        {
            Some(preset) => {
                self.download_color = preset.download.to_string();
                self.upload_color = preset.upload.to_string();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.refresh_rate_ms, 1000);
        assert_eq!(settings.speed_unit, SpeedUnit::Kbps);
        assert_eq!(settings.background_style, BackgroundStyle::Blur);
        assert!((settings.opacity - 0.9).abs() < 0.001);
    }

    #[test]
    fn test_partial_json_uses_field_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"refresh_rate_ms": 500, "speed_unit": "MBPerSec"}"#).unwrap();
        assert_eq!(settings.refresh_rate_ms, 500);
        assert_eq!(settings.speed_unit, SpeedUnit::MBPerSec);
        assert_eq!(settings.download_color, "#00D4AA");
        assert!(settings.minimize_to_tray);
    }

    #[test]
    fn test_unknown_unit_falls_back_to_kbps() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"speed_unit": "furlongs"}"#).unwrap();
        assert_eq!(settings.speed_unit, SpeedUnit::Kbps);
    }

    #[test]
    fn test_unit_serializes_as_variant_name() {
        let json = serde_json::to_string(&SpeedUnit::GBPerSec).unwrap();
        assert_eq!(json, "\"GBPerSec\"");
        let back: SpeedUnit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SpeedUnit::GBPerSec);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(SpeedUnit::parse("Kbps"), Some(SpeedUnit::Kbps));
        assert_eq!(SpeedUnit::parse("furlongs"), None);
        assert_eq!(SpeedUnit::from_name("furlongs"), SpeedUnit::Kbps);
    }

    #[test]
    fn test_from_name_accepts_suffixes() {
        assert_eq!(SpeedUnit::from_name("MB/s"), SpeedUnit::MBPerSec);
        assert_eq!(SpeedUnit::from_name("bps"), SpeedUnit::Bps);
        assert_eq!(SpeedUnit::from_name("KBps"), SpeedUnit::KBPerSec);
        for unit in SpeedUnit::ALL {
            assert_eq!(SpeedUnit::from_name(unit.suffix()), unit);
        }
    }

    #[test]
    fn test_sanitize_rejects_non_positive_interval() {
        let mut settings = AppSettings {
            refresh_rate_ms: 0,
            ..Default::default()
        };
        assert!(settings.sanitize());
        assert_eq!(settings.refresh_rate_ms, DEFAULT_REFRESH_RATE_MS);
        assert!(!settings.sanitize());
    }

    #[test]
    fn test_apply_preset() {
        let mut settings = AppSettings::default();
        assert!(settings.apply_preset("neon"));
        assert_eq!(settings.download_color, "#00FF88");
        assert_eq!(settings.upload_color, "#FF00FF");
        assert!(!settings.apply_preset("Plaid"));
        assert_eq!(settings.download_color, "#00FF88");
    }
}
