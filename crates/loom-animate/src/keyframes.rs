//! Keyframe resolution from element attributes.
//!
//! Keyframes are declared one property at a time:
//!
//! ```text
//! animation-keyframe-from-opacity="0"
//! animation-keyframe-50-transform="scale(1.1)"
//! animation-keyframe-to-opacity="1"
//! ```
//!
//! Declarations sharing an offset merge into one [`Keyframe`]; the resulting
//! sequence is sorted by offset. Resolution is stateless and runs fresh for
//! every playback, so attribute changes between playbacks are always seen.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::attribute::{AnimationAttribute, KeyframeOffset, OFFSET_PROPERTY};

/// Properties of a keyframe that describe the timeline rather than a style.
pub const TIMING_PROPERTIES: [&str; 3] = ["composite", "easing", "offset"];

/// A single point on the animation timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Position in `[0, 1]`.
    pub offset: f64,
    /// Camel-cased property name to CSS value.
    #[serde(flatten)]
    pub properties: BTreeMap<String, String>,
}

impl Keyframe {
    pub fn new(offset: f64) -> Self {
        Self {
            offset,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    /// Set a property. `offset` is the keyframe's position and is ignored here.
    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        let property = property.into();
        if property != OFFSET_PROPERTY {
            self.properties.insert(property, value.into());
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }

    /// The style this keyframe leaves behind when persisted inline.
    pub fn style_snapshot(&self) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .filter(|(property, _)| !TIMING_PROPERTIES.contains(&property.as_str()))
            .map(|(property, value)| (property.clone(), value.clone()))
            .collect()
    }
}

/// Build the ordered keyframe sequence from `(name, value)` attribute pairs.
///
/// Unrelated and malformed attributes are ignored. An empty result means the
/// element declares no animation.
pub fn resolve_keyframes<I, N, V>(attributes: I) -> Vec<Keyframe>
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<str>,
    V: AsRef<str>,
{
    let declarations = attributes.into_iter().filter_map(|(name, value)| {
        match AnimationAttribute::parse(name.as_ref(), value.as_ref()) {
            Some(AnimationAttribute::Keyframe {
                offset,
                property,
                value,
            }) => Some((offset, property, value)),
            _ => None,
        }
    });
    merge_keyframes(declarations)
}

/// Merge per-property declarations into one keyframe per offset.
///
/// Later declarations win when the same offset and property repeat.
pub(crate) fn merge_keyframes<I>(declarations: I) -> Vec<Keyframe>
where
    I: IntoIterator<Item = (KeyframeOffset, String, String)>,
{
    let mut keyframes: Vec<Keyframe> = Vec::new();
    for (offset, property, value) in declarations {
        let offset = offset.value();
        match keyframes.iter_mut().find(|keyframe| keyframe.offset == offset) {
            Some(keyframe) => keyframe.set(property, value),
            None => keyframes.push(Keyframe::new(offset).with(property, value)),
        }
    }
    keyframes.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    keyframes
}
