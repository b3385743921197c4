//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. No over-engineering.

use thiserror::Error;

use crate::types::NodeId;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid attribute name: '{0}'")]
    InvalidAttributeName(String),

    #[error("Invalid markup at byte {offset}: {reason}")]
    InvalidMarkup { offset: usize, reason: String },

    #[error("CDP snapshot error: {0}")]
    Snapshot(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
