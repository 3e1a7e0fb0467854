//! rbcatalog - an ordered in-memory record catalog
//!
//! Records are indexed twice, by identifier and by case-folded title, using
//! one red-black tree per index.
//!
//! - `index`: generic red-black `OrderedIndex`
//! - `catalog`: `CatalogStore` keeping both indices in lockstep
//! - `export`: JSON import/export of the full record set
//! - `cli`: command-line boundary

pub mod catalog;
pub mod cli;
pub mod export;
pub mod index;
