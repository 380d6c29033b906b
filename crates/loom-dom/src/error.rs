//! Error types for document operations.

use thiserror::Error;

use crate::document::NodeId;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DomError>;

/// Errors that can occur while reading or mutating a [`Document`](crate::Document).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The node id does not belong to this document.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// An element-only operation was attempted on another node kind.
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// Inserting the child would create a cycle or nest a document root.
    #[error("cannot insert node {child} under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    /// The selector string could not be parsed.
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}
