//! Typed parsing of the animation attribute namespace.
//!
//! ```text
//! animation-keyframe-<offset>-<dashed-property> = <css value>
//! animation-option-<easing|duration|delay>      = <value>
//! ```
//!
//! Every attribute is parsed once into an [`AnimationAttribute`]; anything that
//! does not fit the grammar yields `None` and is ignored by callers.

use tracing::trace;

pub const KEYFRAME_PREFIX: &str = "animation-keyframe-";
pub const OPTION_PREFIX: &str = "animation-option-";

/// Reserved: a keyframe's position comes from the attribute name only.
pub const OFFSET_PROPERTY: &str = "offset";

/// Normalized timeline position in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct KeyframeOffset(f64);

impl KeyframeOffset {
    pub const START: Self = Self(0.0);
    pub const END: Self = Self(1.0);

    /// `from` -> 0, `to` -> 1, an integer percentage `0..=100` -> `n / 100`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "from" => Some(Self::START),
            "to" => Some(Self::END),
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                let percent: u32 = digits.parse().ok()?;
                (percent <= 100).then(|| Self(f64::from(percent) / 100.0))
            }
            _ => None,
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// One animation-related option attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationOption {
    Duration(f64),
    Delay(f64),
    Easing(String),
}

/// A parsed attribute from the animation namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationAttribute {
    Keyframe {
        offset: KeyframeOffset,
        property: String,
        value: String,
    },
    Option(AnimationOption),
}

impl AnimationAttribute {
    /// Parse one attribute. Returns `None` for unrelated or malformed attributes.
    pub fn parse(name: &str, value: &str) -> Option<Self> {
        if let Some(rest) = name.strip_prefix(KEYFRAME_PREFIX) {
            return parse_keyframe(name, rest, value);
        }
        if let Some(option) = name.strip_prefix(OPTION_PREFIX) {
            return parse_option(name, option, value).map(Self::Option);
        }
        None
    }
}

fn parse_keyframe(name: &str, rest: &str, value: &str) -> Option<AnimationAttribute> {
    let mut segments = rest.split('-');
    let offset_token = segments.next()?;
    let Some(offset) = KeyframeOffset::parse(offset_token) else {
        trace!(attribute = name, "ignoring keyframe with malformed offset");
        return None;
    };
    let Some(property) = camelize(segments) else {
        trace!(attribute = name, "ignoring keyframe without a property");
        return None;
    };
    if property == OFFSET_PROPERTY {
        trace!(attribute = name, "ignoring keyframe that redeclares its offset");
        return None;
    }
    if value.is_empty() {
        trace!(attribute = name, "ignoring keyframe with empty value");
        return None;
    }
    Some(AnimationAttribute::Keyframe {
        offset,
        property,
        value: value.to_string(),
    })
}

fn parse_option(name: &str, option: &str, value: &str) -> Option<AnimationOption> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = match option {
        "duration" => parse_millis(value)
            .filter(|ms| *ms >= 0.0)
            .map(AnimationOption::Duration),
        "delay" => parse_millis(value).map(AnimationOption::Delay),
        "easing" => Some(AnimationOption::Easing(value.to_string())),
        _ => None,
    };
    if parsed.is_none() {
        trace!(attribute = name, value, "ignoring animation option");
    }
    parsed
}

fn parse_millis(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|ms| ms.is_finite())
}

/// Join dash-separated segments into a scripting style name.
///
/// The first segment is kept verbatim; each later segment has its first
/// character upper-cased. Empty segments (from doubled dashes) are skipped.
/// Returns `None` when nothing is left.
pub fn camelize<'a>(segments: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut property = String::new();
    for segment in segments.into_iter().filter(|s| !s.is_empty()) {
        if property.is_empty() {
            property.push_str(segment);
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            property.extend(first.to_uppercase());
            property.push_str(chars.as_str());
        }
    }
    (!property.is_empty()).then_some(property)
}
