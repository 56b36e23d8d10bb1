//! Configuration management for msgpane
//!
//! `PaneConfig` is the single place where pane defaults live. It is read from
//! the `[pane]` section of `~/.config/msgpane/config.toml` (platform config dir)
//! and validated once, when a container is built from it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::ConfigError;

/// Default visibility threshold for the scroll-to-bottom affordance
pub const DEFAULT_SCROLL_TO_BOTTOM_OFFSET: f64 = 200.0;
/// Default distance-from-end under which an end-reached signal may paginate
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 100.0;
/// Default quiescence window for distance-less end-reached signals
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;
/// Default settle delay per message before the initial scroll-to-end
pub const DEFAULT_SETTLE_PER_MESSAGE_MS: u64 = 15;

/// Presentation settings for a message pane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaneConfig {
    /// Newest message anchored at the visual bottom, offset 0 = bottom
    pub inverted: bool,
    /// Show the load-earlier control and allow pagination
    pub load_earlier: bool,
    /// Paginate automatically on end-reached signals
    pub infinite_scroll: bool,
    /// Initial typing-indicator state
    pub is_typing: bool,
    /// Enable the scroll-to-bottom affordance
    pub scroll_to_bottom: bool,
    /// Offset past which the affordance appears
    pub scroll_to_bottom_offset: f64,
    /// Pin rows to the top of the viewport instead of filling it
    pub align_top: bool,
    /// Theme preset name
    pub theme: String,
    pub pagination: PaginationConfig,
    pub settle: SettleConfig,
    pub host: HostCapabilities,
}

impl Default for PaneConfig {
    fn default() -> Self {
        Self {
            inverted: true,
            load_earlier: false,
            infinite_scroll: false,
            is_typing: false,
            scroll_to_bottom: false,
            scroll_to_bottom_offset: DEFAULT_SCROLL_TO_BOTTOM_OFFSET,
            align_top: false,
            theme: "catppuccin_mocha".to_string(),
            pagination: PaginationConfig::default(),
            settle: SettleConfig::default(),
            host: HostCapabilities::default(),
        }
    }
}

/// End-reached pagination tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Maximum distance-from-end that still counts as "near the end"
    pub proximity_threshold: f64,
    /// Quiescence window for signals that carry no distance
    pub debounce_ms: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl PaginationConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Initial scroll-to-end heuristic for non-inverted panes.
///
/// The delay approximates how long the engine needs to lay out freshly
/// inserted rows. It is a tuning knob; re-check against the host engine
/// before changing the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    pub per_message_delay_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            per_message_delay_ms: DEFAULT_SETTLE_PER_MESSAGE_MS,
        }
    }
}

impl SettleConfig {
    /// Delay before scrolling to the end of `count` messages
    pub fn delay_for(&self, count: usize) -> Duration {
        Duration::from_millis(self.per_message_delay_ms.saturating_mul(count as u64))
    }
}

/// What the host environment can be trusted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostCapabilities {
    /// End-reached signals are genuine. Hosts that fire them spuriously
    /// (e.g. browser hosts) must turn this off to disable auto-pagination.
    pub end_reached_pagination: bool,
    /// The host can animate the typing indicator
    pub typing_indicator: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::native()
    }
}

impl HostCapabilities {
    /// Native hosts support everything
    pub fn native() -> Self {
        Self {
            end_reached_pagination: true,
            typing_indicator: true,
        }
    }

    /// Browser hosts fire end-reached on mount and have no typing animation
    pub fn web() -> Self {
        Self {
            end_reached_pagination: false,
            typing_indicator: false,
        }
    }
}

impl PaneConfig {
    /// Check the values that the container relies on
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        check_threshold("scroll_to_bottom_offset", self.scroll_to_bottom_offset)?;
        check_threshold(
            "pagination.proximity_threshold",
            self.pagination.proximity_threshold,
        )?;
        if self.pagination.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        Ok(())
    }

    /// Load pane configuration from the default config file
    ///
    /// If the file doesn't exist or has no `[pane]` section, returns defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load pane configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Ok(Self::load_from_str(&content)?)
    }

    /// Load pane configuration from a TOML string
    pub fn load_from_str(content: &str) -> std::result::Result<Self, ConfigError> {
        let full_config: toml::Value = toml::from_str(content)?;

        let config: PaneConfig = match full_config.get("pane") {
            Some(section) => section.clone().try_into()?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "msgpane") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            let home = dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
            Ok(home.join(".config").join("msgpane").join("config.toml"))
        }
    }

    /// Directory used for the demo's log file
    pub fn log_dir() -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        Ok(config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Render as a `[pane]` TOML document
    pub fn to_toml(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Document<'a> {
            pane: &'a PaneConfig,
        }
        toml::to_string_pretty(&Document { pane: self }).context("Failed to serialize config")
    }
}

fn check_threshold(field: &'static str, value: f64) -> std::result::Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PaneConfig::default();
        assert!(config.inverted);
        assert!(!config.load_earlier);
        assert!(!config.infinite_scroll);
        assert!(!config.scroll_to_bottom);
        assert_eq!(config.scroll_to_bottom_offset, 200.0);
        assert_eq!(config.pagination.proximity_threshold, 100.0);
        assert_eq!(config.pagination.debounce_window(), Duration::from_millis(200));
        assert_eq!(config.settle.per_message_delay_ms, 15);
        assert_eq!(config.host, HostCapabilities::native());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_str_without_section() {
        let config = PaneConfig::load_from_str("[other]\nkey = 1\n").unwrap();
        assert_eq!(config, PaneConfig::default());
    }

    #[test]
    fn test_load_from_str_partial_section() {
        let toml = r#"
[pane]
inverted = false
scroll_to_bottom = true
scroll_to_bottom_offset = 120.0

[pane.pagination]
debounce_ms = 350

[pane.host]
end_reached_pagination = false
"#;
        let config = PaneConfig::load_from_str(toml).unwrap();
        assert!(!config.inverted);
        assert!(config.scroll_to_bottom);
        assert_eq!(config.scroll_to_bottom_offset, 120.0);
        assert_eq!(config.pagination.debounce_ms, 350);
        assert_eq!(config.pagination.proximity_threshold, 100.0);
        assert!(!config.host.end_reached_pagination);
        assert!(config.host.typing_indicator);
    }

    #[test]
    fn test_load_rejects_negative_offset() {
        let err =
            PaneConfig::load_from_str("[pane]\nscroll_to_bottom_offset = -5.0\n").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidThreshold {
                field: "scroll_to_bottom_offset",
                value: -5.0
            }
        );
    }

    #[test]
    fn test_validate_rejects_zero_debounce() {
        let mut config = PaneConfig::default();
        config.pagination.debounce_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroDebounce));
    }

    #[test]
    fn test_validate_rejects_nan_threshold() {
        let mut config = PaneConfig::default();
        config.pagination.proximity_threshold = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold { field: "pagination.proximity_threshold", .. })
        ));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pane]\nload_earlier = true\n").unwrap();

        let config = PaneConfig::load_from_path(&path).unwrap();
        assert!(config.load_earlier);
    }

    #[test]
    fn test_settle_delay_scales_with_count() {
        let settle = SettleConfig::default();
        assert_eq!(settle.delay_for(0), Duration::ZERO);
        assert_eq!(settle.delay_for(10), Duration::from_millis(150));
    }

    #[test]
    fn test_toml_round_trip_through_section() {
        let mut config = PaneConfig::default();
        config.align_top = true;
        let text = config.to_toml().unwrap();
        assert!(text.contains("[pane]"));
        assert_eq!(PaneConfig::load_from_str(&text).unwrap(), config);
    }
}
