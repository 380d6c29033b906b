//! Error types for the animation engine.

use loom_dom::DomError;
use thiserror::Error;

/// Result type for animation operations.
pub type Result<T> = std::result::Result<T, AnimateError>;

/// Errors raised while preparing or finishing a playback.
///
/// Malformed animation attributes are never errors; they are skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimateError {
    /// The target or source element could not be read or styled.
    #[error(transparent)]
    Dom(#[from] DomError),

    /// A direction string outside `normal | reverse | alternate | alternate-reverse`.
    #[error("unknown animation direction '{0}'")]
    UnknownDirection(String),
}
