//! Composite title key for the secondary index
//!
//! Keys order by case-folded title first, identifier second. Identifiers are
//! unique, so keys are unique, and every key sharing a folded title (or a
//! folded title prefix) sits in one contiguous in-order run.

use std::cmp::Ordering;

use super::record::{Record, RecordId};

/// Case-folds a title for indexing and search
pub fn fold_title(title: &str) -> String {
    title.to_lowercase()
}

/// (folded title, identifier) key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TitleKey {
    folded: String,
    identifier: RecordId,
}

impl TitleKey {
    /// Builds a key from an unfolded title
    pub fn new(title: &str, identifier: RecordId) -> Self {
        Self {
            folded: fold_title(title),
            identifier,
        }
    }

    /// Key under which `record` is indexed
    pub fn for_record(record: &Record) -> Self {
        Self::new(&record.title, record.identifier)
    }

    /// Smallest possible key for an already folded title.
    ///
    /// Used as the lower-bound anchor of exact and prefix scans.
    pub fn anchor(folded: &str) -> Self {
        Self {
            folded: folded.to_string(),
            identifier: RecordId::MIN,
        }
    }

    pub fn folded(&self) -> &str {
        &self.folded
    }

    pub fn identifier(&self) -> RecordId {
        self.identifier
    }
}

impl Ord for TitleKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded
            .as_str()
            .cmp(other.folded.as_str())
            .then_with(|| self.identifier.cmp(&other.identifier))
    }
}

impl PartialOrd for TitleKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
