//! Import/export error types

use std::io;

use thiserror::Error;

/// Result type for import/export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors reading or writing a catalog document.
///
/// Per-record problems inside a well-formed document are not errors here;
/// they are reported through `BulkReport`.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid catalog document: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Returns the stable string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::Io(_) => "CATALOG_EXPORT_IO",
            ExportError::Json(_) => "CATALOG_EXPORT_FORMAT",
        }
    }
}
