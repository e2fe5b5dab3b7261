//! Viewer configuration from a TOML file.
//!
//! Every key is optional; command-line flags override what the file sets.
//!
//! ```toml
//! # ~/.config/meteogram/config.toml
//! source_url = "http://localhost:8080/api/weather"
//! horizon_hours = 24
//! refresh_interval_secs = 900
//! zoom_modifier = "ctrl"
//! panel_width = 1200
//! panel_height = 260
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::controller::ZoomGate;

pub const DEFAULT_SOURCE_URL: &str = "http://localhost:8080/api/weather";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Endpoint serving the weather JSON document.
    pub source_url: String,
    /// Forward horizon for "reset view"; `0` means auto-scale to the data.
    pub horizon_hours: u32,
    pub refresh_interval_secs: u64,
    /// Modifier that must be held for wheel zoom.
    pub zoom_modifier: ZoomGate,
    pub panel_width: u32,
    pub panel_height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            horizon_hours: 24,
            refresh_interval_secs: 900,
            zoom_modifier: ZoomGate::default(),
            panel_width: 1200,
            panel_height: 260,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse TOML configuration")
    }

    /// `$XDG_CONFIG_HOME/meteogram/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("meteogram").join("config.toml"))
    }

    /// Read `explicit` if given (it must exist), else the default path if it
    /// exists, else the built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path().filter(|p| p.is_file()) {
            Some(path) => {
                log::debug!("loading config from {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Horizon as the engine expects it: `None` for auto-scaled bounds.
    pub fn horizon(&self) -> Option<u32> {
        (self.horizon_hours > 0).then_some(self.horizon_hours)
    }

    /// Refresh period; never shorter than one second.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = ViewerConfig::from_str("").unwrap();
        assert_eq!(cfg, ViewerConfig::default());
        assert_eq!(cfg.horizon(), Some(24));
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(900));
    }

    #[test]
    fn parse_config() {
        let cfg = ViewerConfig::from_str(
            r#"
            source_url = "http://wx.local/api/weather"
            horizon_hours = 0
            zoom_modifier = "shift"
            panel_height = 300
            "#,
        )
        .unwrap();
        assert_eq!(cfg.source_url, "http://wx.local/api/weather");
        assert_eq!(cfg.horizon(), None);
        assert_eq!(cfg.zoom_modifier, ZoomGate::Shift);
        assert_eq!(cfg.panel_height, 300);
        assert_eq!(cfg.panel_width, 1200);
    }

    #[test]
    fn none_modifier_means_always() {
        let cfg = ViewerConfig::from_str(r#"zoom_modifier = "none""#).unwrap();
        assert_eq!(cfg.zoom_modifier, ZoomGate::Always);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ViewerConfig::from_str("colour = 3").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = ViewerConfig::load_or_default(Some(Path::new("/nonexistent/meteogram.toml")))
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }
}
