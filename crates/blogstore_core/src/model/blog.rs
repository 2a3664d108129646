//! Blog domain model.
//!
//! # Responsibility
//! - Define the in-memory shape of one `blogs` row.
//! - Describe partial overwrites applied by update operations.
//!
//! # Invariants
//! - `id == 0` means the record has not been inserted yet.
//! - `created_at` is assigned once and never changed by updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned blog identifier.
pub type BlogId = i64;

/// Identifier carried by records that have not been inserted yet.
pub const UNASSIGNED_BLOG_ID: BlogId = 0;

/// One blog post record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    /// Filled in by the store on insert.
    pub id: BlogId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Blog {
    /// Creates an unsaved record stamped with the current time.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_created_at(title, content, Utc::now())
    }

    /// Creates an unsaved record with a caller-provided creation time.
    ///
    /// Used by import paths where the original timestamp must survive.
    pub fn with_created_at(
        title: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UNASSIGNED_BLOG_ID,
            title: title.into(),
            content: content.into(),
            created_at,
        }
    }

    /// Returns whether the store has assigned an identifier.
    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_BLOG_ID
    }
}

/// Field overwrites for an update by id.
///
/// `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl BlogChanges {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Returns whether applying these changes would write nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// Builds changes from a record, skipping empty text fields.
///
/// Identity and creation time are never part of an update.
impl From<&Blog> for BlogChanges {
    fn from(blog: &Blog) -> Self {
        let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_string());
        Self {
            title: non_empty(&blog.title),
            content: non_empty(&blog.content),
        }
    }
}
