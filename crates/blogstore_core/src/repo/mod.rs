//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the blog gateway contract consumed by application code.
//! - Isolate SQLite query details from callers.
//!
//! # Invariants
//! - Single-record lookups report a missing row as `RepoError::NotFound`.
//! - Multi-record lookups never fail on zero matches.
//! - Transport and constraint failures propagate unchanged, without retries.

pub mod blog_repo;
