//! Error types for elements and the runtime.

use loom_animate::AnimateError;
use loom_dom::{DomError, NodeId};
use thiserror::Error;

use crate::host::ContentKind;

/// Result type for element operations.
pub type Result<T> = std::result::Result<T, ElementError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElementError {
    /// Nothing inside the host matched the content selector.
    #[error("content not found for selector '{selector}'")]
    ContentNotFound { selector: String },

    /// The content node exists but is not what the caller asked for.
    #[error("content {node} is not {expected}")]
    ContentMismatch { node: NodeId, expected: ContentKind },

    /// A structural part a component needs is missing from its markup.
    #[error("<{component}> has no {part} part")]
    MissingPart {
        component: &'static str,
        part: &'static str,
    },

    #[error("element '{0}' is already defined")]
    AlreadyDefined(String),

    #[error("invalid date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("date {date} is outside the allowed range")]
    DateOutOfRange { date: String },

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Animate(#[from] AnimateError),
}
