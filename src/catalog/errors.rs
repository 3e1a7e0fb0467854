//! Catalog error types
//!
//! Error codes:
//! - CATALOG_MISSING_FIELD (recoverable)
//! - CATALOG_MALFORMED_RECORD (recoverable, per bulk record)
//! - CATALOG_DUPLICATE_IDENTIFIER (recoverable, per bulk record)
//! - CATALOG_INVARIANT_VIOLATION (FATAL)
//! - CATALOG_INDEX_* (FATAL, see `index::IndexError`)
//!
//! Absent identifiers are not errors: lookups return `Option`, deletes
//! return `bool`.

use thiserror::Error;

use super::record::RecordId;
use crate::index::IndexError;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A required record field was not supplied
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A bulk input entry could not be turned into a record
    #[error("malformed record at position {position}: {reason}")]
    MalformedRecord { position: usize, reason: String },

    /// The same identifier appeared twice in one bulk batch
    #[error("duplicate identifier {identifier} at position {position}")]
    DuplicateIdentifier {
        position: usize,
        identifier: RecordId,
    },

    /// The two indices disagree about the record set
    #[error("cross-index invariant violated: {0}")]
    InvariantViolation(String),

    /// One of the trees failed its structural check
    #[error("index corrupt: {0}")]
    Index(#[from] IndexError),
}

impl CatalogError {
    /// Returns the stable string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::MissingField(_) => "CATALOG_MISSING_FIELD",
            CatalogError::MalformedRecord { .. } => "CATALOG_MALFORMED_RECORD",
            CatalogError::DuplicateIdentifier { .. } => "CATALOG_DUPLICATE_IDENTIFIER",
            CatalogError::InvariantViolation(_) => "CATALOG_INVARIANT_VIOLATION",
            CatalogError::Index(err) => err.code(),
        }
    }

    /// Fatal errors mean the store itself is broken
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CatalogError::InvariantViolation(_) | CatalogError::Index(_)
        )
    }

    /// Input position for per-record bulk errors
    pub fn position(&self) -> Option<usize> {
        match self {
            CatalogError::MalformedRecord { position, .. }
            | CatalogError::DuplicateIdentifier { position, .. } => Some(*position),
            _ => None,
        }
    }
}
