//! Domain records persisted by the blog store.
//!
//! # Invariants
//! - Records are identified by a store-assigned integer `BlogId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod blog;
