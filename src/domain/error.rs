//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::NodeId;

/// Domain errors represent violations of the tree's structural rules.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("row {row} out of range for {count} children")]
    RowOutOfRange { row: usize, count: usize },

    #[error("node is not a folder: {0:?}")]
    NotAFolder(NodeId),

    #[error("node is not a placeholder: {0:?}")]
    NotAPlaceholder(NodeId),

    #[error("cannot place folder {folder:?} inside its own subtree at {target:?}")]
    CycleDetected { folder: NodeId, target: NodeId },

    #[error("the root folder cannot be detached")]
    RootDetached,

    #[error("node is already attached to a parent: {0:?}")]
    AlreadyAttached(NodeId),

    #[error("new child order is not a permutation of the current children of {0:?}")]
    InvalidPermutation(NodeId),

    #[error("malformed bookmark document: {0}")]
    Xml(String),

    #[error("not a bookmark document: root element is <{0}>")]
    UnexpectedRoot(String),

    #[error("empty bookmark document")]
    EmptyDocument,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
