//! Ordered index subsystem for rbcatalog
//!
//! A generic ordered map backed by a red-black tree. The catalog keeps two
//! of them: one keyed by record identifier, one keyed by folded title.
//!
//! # Design Principles
//!
//! - Arena storage: nodes addressed by integer id, no reference cycles
//! - Deterministic: in-order traversal is strictly ascending
//! - In-memory only: no persistence
//!
//! # Invariants
//!
//! - Root is black, no red node has a red child
//! - Uniform black-height on every root-to-leaf path
//! - Keys are unique; re-inserting a key replaces its value in place

mod errors;
mod rbtree;

pub use errors::{IndexError, IndexResult, Severity};
pub use rbtree::{Color, InOrder, NodeRef, OrderedIndex};
