//! Dual-index catalog store
//!
//! `CatalogStore` owns two ordered indices over the same record set:
//!
//! - `by_id`: identifier -> record
//! - `by_title`: (folded title, identifier) -> record
//!
//! Both hold the same `Arc<Record>`. Every mutation updates both trees before
//! returning; every read touches exactly one.
//!
//! # Ordering discipline
//!
//! When an upsert changes a record's folded title, the stale title key is
//! removed from `by_title` before the new key is inserted. The stale key is
//! rebuilt from the previous record held in `by_id`, so the removal is a
//! direct O(log n) delete.
//!
//! # Concurrency
//!
//! No internal locking. Callers sharing a store across threads must hold
//! one exclusive lock around every call, reads included, or a reader can
//! observe one index updated and the other not.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::errors::{CatalogError, CatalogResult};
use super::key::{fold_title, TitleKey};
use super::record::{Record, RecordId};
use crate::index::{NodeRef, OrderedIndex};

/// Result of `CatalogStore::upsert`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// The identifier was new
    Inserted,
    /// An existing record was replaced
    Updated,
}

impl UpsertOutcome {
    /// Wire name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Inserted => "inserted",
            UpsertOutcome::Updated => "updated",
        }
    }
}

/// Entry counts of both indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub by_id: usize,
    pub by_title: usize,
}

/// Outcome of a bulk load.
///
/// Malformed or duplicate entries are skipped and reported; all other
/// entries, before and after them, are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    /// Number of records applied
    pub applied: usize,
    /// Rejected entries, in input order
    pub rejected: Vec<CatalogError>,
}

impl BulkReport {
    /// Returns true if every entry was applied
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// In-memory record store with an identifier index and a title index
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    by_id: OrderedIndex<RecordId, Arc<Record>>,
    by_title: OrderedIndex<TitleKey, Arc<Record>>,
}

impl CatalogStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new record or replaces the one with the same identifier
    pub fn upsert(&mut self, record: Record) -> UpsertOutcome {
        let identifier = record.identifier;
        let title_key = TitleKey::for_record(&record);
        let record = Arc::new(record);

        let outcome = match self.by_id.find(&identifier) {
            None => UpsertOutcome::Inserted,
            Some(previous) => {
                let stale_key = TitleKey::for_record(previous);
                if stale_key != title_key {
                    let removed = self.by_title.delete(&stale_key);
                    debug_assert!(
                        removed,
                        "title index has no entry for record {}",
                        identifier
                    );
                }
                UpsertOutcome::Updated
            }
        };

        self.by_title.insert(title_key, Arc::clone(&record));
        self.by_id.insert(identifier, record);
        outcome
    }

    /// Removes a record. Returns false if the identifier is absent.
    pub fn delete_by_id(&mut self, identifier: RecordId) -> bool {
        let Some(record) = self.by_id.remove(&identifier) else {
            return false;
        };

        let removed = self.by_title.delete(&TitleKey::for_record(&record));
        debug_assert!(
            removed,
            "title index has no entry for record {}",
            identifier
        );
        true
    }

    /// Point lookup by identifier
    pub fn find_by_id(&self, identifier: RecordId) -> Option<&Record> {
        self.by_id.find(&identifier).map(Arc::as_ref)
    }

    /// Records whose folded title equals the folded query, ascending by identifier
    pub fn find_by_title_exact(&self, title: &str) -> Vec<&Record> {
        let folded = fold_title(title);
        self.scan_titles(&folded, |candidate| candidate == folded)
    }

    /// Records whose folded title starts with the folded query, in title order.
    ///
    /// An empty prefix matches every record.
    pub fn find_by_title_prefix(&self, prefix: &str) -> Vec<&Record> {
        let folded = fold_title(prefix);
        self.scan_titles(&folded, |candidate| candidate.starts_with(&folded))
    }

    /// Walks the title index from the lower bound of `folded` while `matches` holds
    fn scan_titles<F>(&self, folded: &str, matches: F) -> Vec<&Record>
    where
        F: Fn(&str) -> bool,
    {
        let mut results = Vec::new();
        let mut node: Option<NodeRef<'_, TitleKey, Arc<Record>>> =
            self.by_title.lower_bound(&TitleKey::anchor(folded));

        while let Some(entry) = node {
            if !matches(entry.key().folded()) {
                break;
            }
            results.push(entry.value().as_ref());
            node = entry.successor();
        }

        results
    }

    /// All records, ascending by identifier
    pub fn list_by_id(&self) -> Vec<&Record> {
        self.by_id
            .in_order()
            .map(|(_, record)| record.as_ref())
            .collect()
    }

    /// All records, ordered by folded title then identifier
    pub fn list_by_title(&self) -> Vec<&Record> {
        self.by_title
            .in_order()
            .map(|(_, record)| record.as_ref())
            .collect()
    }

    /// Discards every record
    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_title.clear();
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True when no records are stored
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Entry counts of both indices
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            by_id: self.by_id.len(),
            by_title: self.by_title.len(),
        }
    }

    /// Replaces the store's contents with `records`.
    ///
    /// Equivalent to `clear()` followed by `upsert()` per entry in input
    /// order. `Err` entries and repeated identifiers are rejected into the
    /// report; the first occurrence of an identifier wins. The store is
    /// consistent after every applied entry, so a report with rejections
    /// describes a partially applied batch.
    pub fn bulk_load<I>(&mut self, records: I) -> BulkReport
    where
        I: IntoIterator<Item = CatalogResult<Record>>,
    {
        self.clear();

        let mut report = BulkReport::default();
        let mut seen = HashSet::new();

        for (position, entry) in records.into_iter().enumerate() {
            let record = match entry {
                Ok(record) => record,
                Err(err) => {
                    warn!(position, error = %err, "rejected bulk record");
                    report.rejected.push(err);
                    continue;
                }
            };

            if !seen.insert(record.identifier) {
                let err = CatalogError::DuplicateIdentifier {
                    position,
                    identifier: record.identifier,
                };
                warn!(
                    position,
                    identifier = record.identifier,
                    "duplicate identifier in bulk batch"
                );
                report.rejected.push(err);
                continue;
            }

            self.upsert(record);
            report.applied += 1;
        }

        report
    }

    /// Checks both trees and the cross-index invariant.
    ///
    /// Every identifier must appear in both indices exactly once, and each
    /// title key must match the title of the record indexed under its
    /// identifier.
    pub fn verify(&self) -> CatalogResult<()> {
        self.by_id.check_invariants()?;
        self.by_title.check_invariants()?;

        if self.by_id.len() != self.by_title.len() {
            return Err(CatalogError::InvariantViolation(format!(
                "identifier index holds {} records, title index holds {}",
                self.by_id.len(),
                self.by_title.len()
            )));
        }

        for (identifier, record) in self.by_id.in_order() {
            if record.identifier != *identifier {
                return Err(CatalogError::InvariantViolation(format!(
                    "record {} indexed under identifier {}",
                    record.identifier, identifier
                )));
            }
        }

        for (key, record) in self.by_title.in_order() {
            let Some(indexed) = self.by_id.find(&key.identifier()) else {
                return Err(CatalogError::InvariantViolation(format!(
                    "title entry for {} has no identifier entry",
                    key.identifier()
                )));
            };

            if fold_title(&indexed.title) != key.folded() {
                return Err(CatalogError::InvariantViolation(format!(
                    "title key '{}' does not match record {} title '{}'",
                    key.folded(),
                    key.identifier(),
                    indexed.title
                )));
            }

            if record != indexed {
                return Err(CatalogError::InvariantViolation(format!(
                    "indices hold different values for record {}",
                    key.identifier()
                )));
            }
        }

        Ok(())
    }
}
