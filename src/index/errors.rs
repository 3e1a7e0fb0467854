//! Index error types
//!
//! Every index error reports a broken red-black or ordering invariant.
//! None of them can be produced by correct use of the public API, so all
//! are classified FATAL.

use std::fmt;

use thiserror::Error;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The structure is corrupt and must not be used further
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Invariant violations detected by `OrderedIndex::check_invariants`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The root node is colored red
    #[error("root node is red")]
    RedRoot,

    /// A red node has a red child
    #[error("red node at in-order position {position} has a red child")]
    DoubleRed { position: usize },

    /// Two sibling subtrees disagree on black-height
    #[error("black-height mismatch below in-order position {position}: left {left}, right {right}")]
    BlackHeightMismatch {
        position: usize,
        left: usize,
        right: usize,
    },

    /// Keys are not strictly increasing in order
    #[error("keys not strictly increasing at in-order position {position}")]
    OrderViolation { position: usize },

    /// A child does not point back at its parent
    #[error("parent link broken at in-order position {position}")]
    BrokenParentLink { position: usize },

    /// Reachable node count differs from the stored node count
    #[error("length mismatch: {tracked} stored, {reachable} reachable")]
    LengthMismatch { tracked: usize, reachable: usize },
}

impl IndexError {
    /// Returns the stable string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::RedRoot => "CATALOG_INDEX_RED_ROOT",
            IndexError::DoubleRed { .. } => "CATALOG_INDEX_DOUBLE_RED",
            IndexError::BlackHeightMismatch { .. } => "CATALOG_INDEX_BLACK_HEIGHT",
            IndexError::OrderViolation { .. } => "CATALOG_INDEX_ORDER",
            IndexError::BrokenParentLink { .. } => "CATALOG_INDEX_PARENT_LINK",
            IndexError::LengthMismatch { .. } => "CATALOG_INDEX_LENGTH",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        true
    }
}

/// Result type for index checks
pub type IndexResult<T> = Result<T, IndexError>;
