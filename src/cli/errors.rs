//! CLI-specific error types

use std::fmt;
use std::io;

use crate::catalog::CatalogError;
use crate::export::ExportError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout/data file)
    IoError,
    /// Data file already exists
    AlreadyInitialized,
    /// Data file missing
    NotInitialized,
    /// Request line could not be understood
    InvalidRequest,
    /// Catalog operation failed
    CatalogError,
    /// Data file holds records that could not be loaded
    DamagedCatalog,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CATALOG_CLI_CONFIG_ERROR",
            Self::IoError => "CATALOG_CLI_IO_ERROR",
            Self::AlreadyInitialized => "CATALOG_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "CATALOG_CLI_NOT_INITIALIZED",
            Self::InvalidRequest => "CATALOG_CLI_INVALID_REQUEST",
            Self::CatalogError => "CATALOG_CLI_CATALOG_ERROR",
            Self::DamagedCatalog => "CATALOG_CLI_DAMAGED_CATALOG",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Already initialized
    pub fn already_initialized(path: impl fmt::Display) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!("Catalog file {} already exists", path),
        )
    }

    /// Not initialized
    pub fn not_initialized(path: impl fmt::Display) -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            format!(
                "Catalog file {} not found. Run 'rbcatalog init' first.",
                path
            ),
        )
    }

    /// Mutation refused because saving would drop unreadable records
    pub fn damaged_catalog(path: impl fmt::Display, skipped: usize) -> Self {
        Self::new(
            CliErrorCode::DamagedCatalog,
            format!(
                "Catalog file {} has {} unreadable record(s); refusing to overwrite it",
                path, skipped
            ),
        )
    }

    /// Invalid request
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ExportError> for CliError {
    fn from(e: ExportError) -> Self {
        Self::io_error(format!("{} ({})", e, e.code()))
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        Self::new(
            CliErrorCode::CatalogError,
            format!("{} ({})", e, e.code()),
        )
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
