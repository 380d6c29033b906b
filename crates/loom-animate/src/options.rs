//! Playback option resolution.
//!
//! Options come from three layers, lowest priority first:
//! [`AnimationDefaults`], the element's `animation-option-*` attributes, and
//! call-site overrides. Defaults only fill fields that are absent; an explicit
//! `0` duration is kept.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::attribute::{AnimationAttribute, AnimationOption};
use crate::error::AnimateError;

pub const DEFAULT_DURATION_MS: f64 = 200.0;
pub const DEFAULT_EASING: &str = "ease-in-out";

/// Playback direction, mirroring CSS `animation-direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackDirection {
    #[default]
    Normal,
    Reverse,
    Alternate,
    AlternateReverse,
}

impl PlaybackDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Reverse => "reverse",
            Self::Alternate => "alternate",
            Self::AlternateReverse => "alternate-reverse",
        }
    }

    /// True for the directions whose first pass runs backwards.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::Reverse | Self::AlternateReverse)
    }
}

impl fmt::Display for PlaybackDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackDirection {
    type Err = AnimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "reverse" => Ok(Self::Reverse),
            "alternate" => Ok(Self::Alternate),
            "alternate-reverse" => Ok(Self::AlternateReverse),
            _ => Err(AnimateError::UnknownDirection(s.to_string())),
        }
    }
}

/// Fallback values applied to fields nobody set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDefaults {
    pub duration_ms: f64,
    pub easing: String,
}

impl Default for AnimationDefaults {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            easing: DEFAULT_EASING.to_string(),
        }
    }
}

/// Options with every field optional. Used both for attribute values and for
/// call-site overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialAnimationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<PlaybackDirection>,
}

/// Call-site overrides passed to a playback.
pub type AnimationOverrides = PartialAnimationOptions;

impl PartialAnimationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_easing(mut self, easing: impl Into<String>) -> Self {
        self.easing = Some(easing.into());
        self
    }

    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn with_direction(mut self, direction: PlaybackDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Shorthand for `with_direction(PlaybackDirection::Reverse)`.
    pub fn reversed() -> Self {
        Self::new().with_direction(PlaybackDirection::Reverse)
    }

    pub fn is_empty(&self) -> bool {
        self.duration_ms.is_none()
            && self.easing.is_none()
            && self.delay_ms.is_none()
            && self.direction.is_none()
    }

    /// Layer `overrides` on top of `self`. Fields set in `overrides` win.
    pub fn overlay(self, overrides: &PartialAnimationOptions) -> Self {
        Self {
            duration_ms: overrides.duration_ms.or(self.duration_ms),
            easing: overrides.easing.clone().or(self.easing),
            delay_ms: overrides.delay_ms.or(self.delay_ms),
            direction: overrides.direction.or(self.direction),
        }
    }

    /// Fill absent fields from `defaults`.
    pub fn resolve(self, defaults: &AnimationDefaults) -> AnimationOptions {
        AnimationOptions {
            duration_ms: self.duration_ms.unwrap_or(defaults.duration_ms),
            easing: self.easing.unwrap_or_else(|| defaults.easing.clone()),
            delay_ms: self.delay_ms,
            direction: self.direction,
        }
    }

    pub(crate) fn apply(&mut self, option: AnimationOption) {
        match option {
            AnimationOption::Duration(ms) => self.duration_ms = Some(ms),
            AnimationOption::Delay(ms) => self.delay_ms = Some(ms),
            AnimationOption::Easing(easing) => self.easing = Some(easing),
        }
    }
}

/// Fully resolved options handed to the animation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationOptions {
    pub duration_ms: f64,
    pub easing: String,
    pub delay_ms: Option<f64>,
    pub direction: Option<PlaybackDirection>,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        PartialAnimationOptions::default().resolve(&AnimationDefaults::default())
    }
}

impl AnimationOptions {
    pub fn is_reversed(&self) -> bool {
        self.direction.is_some_and(PlaybackDirection::is_reversed)
    }

    /// Wall time of one pass including a positive delay, in whole milliseconds.
    pub fn total_ms(&self) -> u64 {
        let delay = self.delay_ms.unwrap_or(0.0).max(0.0);
        (delay + self.duration_ms).max(0.0).round() as u64
    }
}

/// Collect the `animation-option-*` attributes present on an element.
pub fn resolve_options<I, N, V>(attributes: I) -> PartialAnimationOptions
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<str>,
    V: AsRef<str>,
{
    let mut options = PartialAnimationOptions::new();
    for (name, value) in attributes {
        if let Some(AnimationAttribute::Option(option)) =
            AnimationAttribute::parse(name.as_ref(), value.as_ref())
        {
            options.apply(option);
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_only_present_fields() {
        let options = resolve_options([
            ("animation-option-duration", "500"),
            ("animation-option-easing", "linear"),
            ("animation-option-fill", "both"),
        ]);
        assert_eq!(options.duration_ms, Some(500.0));
        assert_eq!(options.easing.as_deref(), Some("linear"));
        assert_eq!(options.delay_ms, None);
        assert_eq!(options.direction, None);
    }

    #[test]
    fn test_non_numeric_duration_is_skipped() {
        let options = resolve_options([("animation-option-duration", "fast")]);
        assert!(options.is_empty());
        let resolved = options.resolve(&AnimationDefaults::default());
        assert_eq!(resolved.duration_ms, DEFAULT_DURATION_MS);
        assert_eq!(resolved.easing, DEFAULT_EASING);
    }

    #[test]
    fn test_explicit_zero_duration_is_kept() {
        let resolved = resolve_options([("animation-option-duration", "0")])
            .resolve(&AnimationDefaults::default());
        assert_eq!(resolved.duration_ms, 0.0);
    }

    #[test]
    fn test_overrides_win() {
        let attributes = resolve_options([
            ("animation-option-duration", "500"),
            ("animation-option-delay", "20"),
        ]);
        let overrides = AnimationOverrides::new()
            .with_duration(100.0)
            .with_direction(PlaybackDirection::Reverse);
        let resolved = attributes
            .overlay(&overrides)
            .resolve(&AnimationDefaults::default());

        assert_eq!(resolved.duration_ms, 100.0);
        assert_eq!(resolved.delay_ms, Some(20.0));
        assert_eq!(resolved.direction, Some(PlaybackDirection::Reverse));
        assert!(resolved.is_reversed());
    }

    #[test]
    fn test_custom_defaults() {
        let defaults = AnimationDefaults {
            duration_ms: 350.0,
            easing: "linear".to_string(),
        };
        let resolved = PartialAnimationOptions::new().resolve(&defaults);
        assert_eq!(resolved.duration_ms, 350.0);
        assert_eq!(resolved.easing, "linear");
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(
            "alternate-reverse".parse::<PlaybackDirection>(),
            Ok(PlaybackDirection::AlternateReverse)
        );
        assert_eq!(" Reverse ".parse::<PlaybackDirection>(), Ok(PlaybackDirection::Reverse));
        assert!("backwards".parse::<PlaybackDirection>().is_err());
        assert!(!PlaybackDirection::Alternate.is_reversed());
        assert!(PlaybackDirection::AlternateReverse.is_reversed());
    }

    #[test]
    fn test_total_ms_ignores_negative_delay() {
        let options = PartialAnimationOptions::new()
            .with_duration(200.0)
            .with_delay(-50.0)
            .resolve(&AnimationDefaults::default());
        assert_eq!(options.total_ms(), 200);

        let delayed = PartialAnimationOptions::new()
            .with_duration(200.0)
            .with_delay(100.0)
            .resolve(&AnimationDefaults::default());
        assert_eq!(delayed.total_ms(), 300);
    }
}
