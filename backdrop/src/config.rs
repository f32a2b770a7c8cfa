use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::overlay::{EasingFunction, FlashTiming, OverlaySettings};
use crate::playback::PlaybackSettings;
use crate::validate_enum;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralSettings,

    #[serde(default)]
    pub autoplay: AutoplaySettings,

    #[serde(default)]
    pub overlay: OverlayConfig,
}

/// General settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralSettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl GeneralSettings {
    /// Level filter for the host's logger, `Info` if unparseable
    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Autoplay and watch-progress tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AutoplaySettings {
    /// Autoplay ceiling in seconds; clips at most this long are "short"
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f64,

    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,
}

impl Default for AutoplaySettings {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration(),
            settle_delay_ms: default_settle_delay(),
            progress_interval_ms: default_progress_interval(),
        }
    }
}

fn default_max_duration() -> f64 {
    6.0
}
fn default_settle_delay() -> u64 {
    500
}
fn default_progress_interval() -> u64 {
    100
}

/// Overlay flash timing and cancel button geometry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverlayConfig {
    #[serde(default = "default_fade_in")]
    pub fade_in_ms: u64,

    #[serde(default = "default_hold")]
    pub hold_ms: u64,

    #[serde(default = "default_fade_out")]
    pub fade_out_ms: u64,

    #[serde(default = "default_easing")]
    pub easing: String,

    #[serde(default = "default_button_size")]
    pub cancel_button_size: f32,

    #[serde(default = "default_button_inset")]
    pub cancel_button_inset: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            fade_in_ms: default_fade_in(),
            hold_ms: default_hold(),
            fade_out_ms: default_fade_out(),
            easing: default_easing(),
            cancel_button_size: default_button_size(),
            cancel_button_inset: default_button_inset(),
        }
    }
}

fn default_fade_in() -> u64 {
    100
}
fn default_hold() -> u64 {
    500
}
fn default_fade_out() -> u64 {
    300
}
fn default_easing() -> String {
    "ease-in-out".to_string()
}
fn default_button_size() -> f32 {
    32.0
}
fn default_button_inset() -> f32 {
    20.0
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_toml(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("backdrop");

        Ok(config_dir.join("config.toml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        self.validate_log_level(&self.general.log_level)?;

        let max = self.autoplay.max_duration_secs;
        if !max.is_finite() || max <= 0.0 {
            anyhow::bail!("Invalid autoplay.max_duration_secs: {} (must be > 0)", max);
        }
        Duration::try_from_secs_f64(max)
            .with_context(|| format!("Invalid autoplay.max_duration_secs: {}", max))?;
        if self.autoplay.progress_interval_ms == 0 {
            anyhow::bail!("Invalid autoplay.progress_interval_ms: must be > 0");
        }

        self.validate_easing(&self.overlay.easing)?;

        for (name, value) in [
            ("cancel_button_size", self.overlay.cancel_button_size),
            ("cancel_button_inset", self.overlay.cancel_button_inset),
        ] {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("Invalid overlay.{}: {}", name, value);
            }
        }

        Ok(())
    }

    fn validate_log_level(&self, level: &str) -> Result<()> {
        validate_enum!(level, "trace", "debug", "info", "warn", "error")
    }

    fn validate_easing(&self, easing: &str) -> Result<()> {
        validate_enum!(easing, "linear", "ease-in", "ease-out", "ease-in-out")
    }

    /// Controller tuning derived from `[autoplay]`
    pub fn playback(&self) -> PlaybackSettings {
        PlaybackSettings {
            max_autoplay_duration: Duration::try_from_secs_f64(self.autoplay.max_duration_secs)
                .unwrap_or(PlaybackSettings::default().max_autoplay_duration),
            settle_delay: Duration::from_millis(self.autoplay.settle_delay_ms),
            progress_interval: Duration::from_millis(self.autoplay.progress_interval_ms),
        }
    }

    /// Overlay tuning derived from `[overlay]`
    pub fn overlay(&self) -> OverlaySettings {
        OverlaySettings {
            timing: FlashTiming {
                fade_in: Duration::from_millis(self.overlay.fade_in_ms),
                hold: Duration::from_millis(self.overlay.hold_ms),
                fade_out: Duration::from_millis(self.overlay.fade_out_ms),
            },
            easing: EasingFunction::from_name(&self.overlay.easing).unwrap_or_default(),
            cancel_button_size: self.overlay.cancel_button_size,
            cancel_button_inset: self.overlay.cancel_button_inset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.playback(), PlaybackSettings::default());
        assert_eq!(config.overlay(), OverlaySettings::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [autoplay]
            max_duration_secs = 4.5

            [overlay]
            hold_ms = 800
            easing = "linear"
            "#,
        )
        .unwrap();

        let playback = config.playback();
        assert_eq!(playback.max_autoplay_duration, Duration::from_millis(4_500));
        assert_eq!(playback.settle_delay, Duration::from_millis(500));

        let overlay = config.overlay();
        assert_eq!(overlay.timing.hold, Duration::from_millis(800));
        assert_eq!(overlay.timing.fade_in, Duration::from_millis(100));
        assert_eq!(overlay.easing, EasingFunction::Linear);
    }

    #[test]
    fn test_unchecked_settings_do_not_panic() {
        let mut config = Config::default();
        config.autoplay.max_duration_secs = 1e30;
        assert_eq!(
            config.playback().max_autoplay_duration,
            Duration::from_secs(6)
        );
    }

    #[test]
    fn test_log_filter() {
        let mut config = Config::from_toml("[general]\nlog_level = \"debug\"").unwrap();
        assert_eq!(config.general.log_filter(), log::LevelFilter::Debug);

        config.general.log_level = "loud".to_string();
        assert_eq!(config.general.log_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_validate_easing() {
        let config = Config::default();
        assert!(config.validate_easing("ease-in").is_ok());
        assert!(config.validate_easing("bounce").is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_toml("[general]\nlog_level = \"loud\"").is_err());
        assert!(Config::from_toml("[autoplay]\nmax_duration_secs = 0.0").is_err());
        assert!(Config::from_toml("[autoplay]\nmax_duration_secs = 1e30").is_err());
        assert!(Config::from_toml("[autoplay]\nprogress_interval_ms = 0").is_err());
        assert!(Config::from_toml("[overlay]\ncancel_button_size = -1.0").is_err());
        assert!(Config::from_toml("[overlay]\neasing = \"bounce\"").is_err());
    }
}
