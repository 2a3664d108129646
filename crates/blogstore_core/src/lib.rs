//! Blog persistence core.
//!
//! A thin gateway over one SQLite table: records go in and out of `blogs`
//! through [`BlogRepository`], with connection bootstrap in [`db`] and
//! logging setup in [`logging`].

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::{open_db, open_db_in_memory, open_db_with_options, DbError, DbOptions};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::blog::{Blog, BlogChanges, BlogId, UNASSIGNED_BLOG_ID};
pub use repo::blog_repo::{BlogRepository, RepoError, RepoResult, SqliteBlogRepository};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
