//! Catalog record types
//!
//! `Record` is the stored value and the wire shape used by import/export.
//! `RecordDraft` is the lenient input shape: every field optional, with the
//! defaults applied when it is turned into a `Record`.

use serde::{Deserialize, Serialize};

use super::errors::{CatalogError, CatalogResult};

/// Record identifier
pub type RecordId = i64;

/// Default author for records that omit one
const DEFAULT_AUTHOR: &str = "";
/// Default publication year for records that omit one
const DEFAULT_YEAR: i32 = 0;
/// Default number of copies for records that omit one
const DEFAULT_COPIES: u32 = 1;

/// A catalog entry.
///
/// Identity is `identifier`; two records with the same identifier are the
/// same logical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier
    #[serde(alias = "book_id")]
    pub identifier: RecordId,
    /// Title, searched case-insensitively
    pub title: String,
    /// Author
    pub author: String,
    /// Publication year
    pub year: i32,
    /// Number of copies held
    pub copies: u32,
}

impl Record {
    /// Creates a record
    pub fn new(
        identifier: RecordId,
        title: impl Into<String>,
        author: impl Into<String>,
        year: i32,
        copies: u32,
    ) -> Self {
        Self {
            identifier,
            title: title.into(),
            author: author.into(),
            year,
            copies,
        }
    }
}

/// Partially specified record as read from external input.
///
/// `identifier` and `title` are required; `author`, `year` and `copies`
/// fall back to `""`, `0` and `1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordDraft {
    #[serde(alias = "book_id")]
    pub identifier: Option<RecordId>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub copies: Option<u32>,
}

impl RecordDraft {
    /// Applies defaults and checks required fields
    pub fn into_record(self) -> CatalogResult<Record> {
        let identifier = self
            .identifier
            .ok_or(CatalogError::MissingField("identifier"))?;
        let title = self.title.ok_or(CatalogError::MissingField("title"))?;

        Ok(Record {
            identifier,
            title,
            author: self.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            year: self.year.unwrap_or(DEFAULT_YEAR),
            copies: self.copies.unwrap_or(DEFAULT_COPIES),
        })
    }
}

impl From<Record> for RecordDraft {
    fn from(record: Record) -> Self {
        Self {
            identifier: Some(record.identifier),
            title: Some(record.title),
            author: Some(record.author),
            year: Some(record.year),
            copies: Some(record.copies),
        }
    }
}
