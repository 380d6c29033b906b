//! Loom configuration system
//!
//! Settings are read from `loom.toml` and may be overridden per run with
//! `LOOM_*` environment variables.
//!
//! ```toml
//! [animation]
//! duration_ms = 200
//! easing = "ease-in-out"
//! reduced_motion = "skip"
//!
//! [elements]
//! event = "click"
//! swap_revert_delay_ms = 800
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "loom.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoomConfig {
    /// Animation engine defaults
    pub animation: AnimationSettings,
    /// Element host defaults
    pub elements: ElementSettings,
    /// Demo binary settings
    pub demo: DemoConfig,
}

/// What to do when reduced motion is preferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReducedMotion {
    /// Leave elements untouched
    #[default]
    Skip,
    /// Apply the final keyframe without playing
    JumpToEnd,
}

/// Animation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Duration used when an element declares none
    pub duration_ms: f64,
    /// Easing used when an element declares none
    pub easing: String,
    pub reduced_motion: ReducedMotion,
    /// Simulated user preference for reduced motion
    pub prefers_reduced_motion: bool,
}

/// Element host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSettings {
    /// Trigger event used when the `event` attribute is absent
    pub event: String,
    pub trigger_selector: String,
    pub content_selector: String,
    pub swap_selector: String,
    /// Delay before a swapped content reverts
    pub swap_revert_delay_ms: u64,
}

/// Demo application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DemoConfig {
    /// HTML file to load instead of the built-in sample
    pub markup: Option<PathBuf>,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            duration_ms: 200.0,
            easing: "ease-in-out".to_string(),
            reduced_motion: ReducedMotion::Skip,
            prefers_reduced_motion: false,
        }
    }
}

impl Default for ElementSettings {
    fn default() -> Self {
        Self {
            event: "click".to_string(),
            trigger_selector: "[data-trigger]".to_string(),
            content_selector: "[data-content]".to_string(),
            swap_selector: "[data-swap]".to_string(),
            swap_revert_delay_ms: 800,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl LoomConfig {
    /// Load configuration from a TOML file
    ///
    /// # Returns
    /// * `Ok(LoomConfig)` - Successfully loaded configuration
    /// * `Err(String)` - Error message if loading failed
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Load `loom.toml` from the current directory, or defaults if it is
    /// missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_FILE).unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        self.merge_with_vars(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable source. Unparseable values are ignored.
    pub fn merge_with_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("LOOM_PREFERS_REDUCED_MOTION") {
            self.animation.prefers_reduced_motion = parse_flag(&val);
        }
        if let Some(val) = lookup("LOOM_ANIMATION_DURATION") {
            if let Ok(duration) = val.trim().parse::<f64>() {
                if duration.is_finite() && duration >= 0.0 {
                    self.animation.duration_ms = duration;
                }
            }
        }
        if let Some(easing) = lookup("LOOM_ANIMATION_EASING") {
            if !easing.trim().is_empty() {
                self.animation.easing = easing.trim().to_string();
            }
        }
        if let Some(markup) = lookup("LOOM_DEMO_MARKUP") {
            self.demo.markup = Some(PathBuf::from(markup));
        }
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
