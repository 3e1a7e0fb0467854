//! Catalog subsystem for rbcatalog
//!
//! A record store indexed twice: by identifier and by case-folded title.
//! Both indices are `OrderedIndex` red-black trees kept in lockstep by
//! `CatalogStore`.
//!
//! # API
//!
//! - `upsert(record)` - Insert or replace by identifier
//! - `delete_by_id(id)` - Remove from both indices
//! - `find_by_id(id)` - Point lookup
//! - `find_by_title_exact(text)` / `find_by_title_prefix(text)` - Title scans
//! - `list_by_id()` / `list_by_title()` - Full enumeration
//! - `bulk_load(records)` - Replace contents wholesale
//!
//! # Invariants
//!
//! - Both indices hold the same identifier set
//! - Each title key matches the title of the record under its identifier
//! - Restored before every mutating call returns

mod errors;
mod key;
mod record;
pub mod seed;
mod store;

pub use errors::{CatalogError, CatalogResult};
pub use key::{fold_title, TitleKey};
pub use record::{Record, RecordDraft, RecordId};
pub use store::{BulkReport, CatalogStore, IndexStats, UpsertOutcome};
