//! Declarative keyframe animation driven by element attributes.
//!
//! ```text
//! attributes ──► AnimationConfig ──► keyframes + partial options
//!                                         │
//! overrides ─────────────────────────────►├──► AnimationDriver ──► AnimationBackend
//!                                         │          │
//!                                         │          └──► inline style (start, then end)
//! ```
//!
//! Elements declare keyframes with `animation-keyframe-<offset>-<property>`
//! attributes and timing with `animation-option-<name>`. The driver resolves
//! both fresh on every playback.

pub mod attribute;
pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod keyframes;
pub mod options;

pub use attribute::{AnimationAttribute, AnimationOption, KeyframeOffset, camelize};
pub use backend::{AnimationBackend, Playback, PlaybackRecord, TimelineBackend};
pub use config::AnimationConfig;
pub use driver::{AnimationDriver, PlaybackOutcome, ReducedMotionPolicy};
pub use error::{AnimateError, Result};
pub use events::{EventQueue, PlaybackEvent, SkipReason};
pub use keyframes::{Keyframe, TIMING_PROPERTIES, resolve_keyframes};
pub use options::{
    AnimationDefaults, AnimationOptions, AnimationOverrides, DEFAULT_DURATION_MS, DEFAULT_EASING,
    PartialAnimationOptions, PlaybackDirection, resolve_options,
};
