//! Blog repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/update/delete/get operations over the `blogs` table.
//! - Map rows to and from [`Blog`] records.
//!
//! # Invariants
//! - Each write runs as one statement inside its own transaction.
//! - `id` and `created_at` are never part of an update.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::blog::{Blog, BlogChanges, BlogId};
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BLOGS_TABLE: &str = "blogs";
const BLOG_COLUMNS: [&str; 4] = ["id", "title", "content", "created_at"];
// RFC 3339 text only round-trips four-digit years.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

const INSERT_BLOG_SQL: &str = "INSERT INTO blogs (title, content, created_at) VALUES (?, ?, ?)";
const DELETE_BLOG_SQL: &str = "DELETE FROM blogs WHERE (id = ?)";
const SELECT_BLOG_BY_ID_SQL: &str = "SELECT * FROM blogs WHERE (id = ?) ORDER BY id ASC LIMIT 1";
const SELECT_BLOGS_BY_TITLE_SQL: &str = "SELECT * FROM blogs WHERE (title = ?)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors returned by blog persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Statement execution or driver failure, including constraint violations.
    Db(DbError),
    /// No row matched a single-record lookup.
    NotFound(BlogId),
    /// `create` was handed a record that already carries a store id.
    AlreadyPersisted(BlogId),
    /// Creation time cannot be stored as RFC 3339 text.
    UnsupportedTimestamp(DateTime<Utc>),
    /// Persisted row cannot be mapped to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: blog {id}"),
            Self::AlreadyPersisted(id) => {
                write!(f, "blog already has store id {id}; use update instead")
            }
            Self::UnsupportedTimestamp(value) => write!(
                f,
                "creation timestamp {value} is outside the storable years 0000-9999"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted blog data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Gateway between in-memory blog records and their backing table.
pub trait BlogRepository {
    /// Inserts `blog` and writes the store-assigned id back into it.
    fn create(&self, blog: &mut Blog) -> RepoResult<BlogId>;
    /// Overwrites the present fields of `changes` on row `id`.
    ///
    /// Returns the affected-row count; `0` means no row had that id.
    fn update(&self, id: BlogId, changes: &BlogChanges) -> RepoResult<usize>;
    /// Removes row `id`. Missing rows are not an error.
    fn delete(&self, id: BlogId) -> RepoResult<usize>;
    fn get_by_id(&self, id: BlogId) -> RepoResult<Blog>;
    /// Returns every blog whose title equals `title` exactly, in store order.
    fn get_by_title(&self, title: &str) -> RepoResult<Vec<Blog>>;
}

/// SQLite-backed blog repository.
pub struct SqliteBlogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlogRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_blog_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn write<T>(&self, op: impl FnOnce(&Transaction<'_>) -> RepoResult<T>) -> RepoResult<T> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

impl BlogRepository for SqliteBlogRepository<'_> {
    fn create(&self, blog: &mut Blog) -> RepoResult<BlogId> {
        if blog.is_persisted() {
            return Err(RepoError::AlreadyPersisted(blog.id));
        }

        let created_at = format_timestamp(&blog.created_at)?;
        let result = self.write(|tx| {
            tx.execute(
                INSERT_BLOG_SQL,
                params![blog.title.as_str(), blog.content.as_str(), created_at],
            )?;
            Ok(tx.last_insert_rowid())
        });

        match result {
            Ok(id) => {
                blog.id = id;
                debug!("event=blog_create module=repo status=ok id={id}");
                Ok(id)
            }
            Err(err) => {
                warn!("event=blog_create module=repo status=error error={err}");
                Err(err)
            }
        }
    }

    fn update(&self, id: BlogId, changes: &BlogChanges) -> RepoResult<usize> {
        let Some((sql, mut bind_values)) = build_update(changes) else {
            debug!("event=blog_update module=repo status=skipped id={id} reason=no_changes");
            return Ok(0);
        };
        bind_values.push(Value::Integer(id));

        let result = self.write(|tx| Ok(tx.execute(&sql, params_from_iter(bind_values))?));
        log_write("blog_update", id, &result);
        result
    }

    fn delete(&self, id: BlogId) -> RepoResult<usize> {
        let result = self.write(|tx| Ok(tx.execute(DELETE_BLOG_SQL, [id])?));
        log_write("blog_delete", id, &result);
        result
    }

    fn get_by_id(&self, id: BlogId) -> RepoResult<Blog> {
        let mut stmt = self.conn.prepare(SELECT_BLOG_BY_ID_SQL)?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return parse_blog_row(row);
        }

        Err(RepoError::NotFound(id))
    }

    fn get_by_title(&self, title: &str) -> RepoResult<Vec<Blog>> {
        let mut stmt = self.conn.prepare(SELECT_BLOGS_BY_TITLE_SQL)?;
        let mut rows = stmt.query([title])?;
        let mut blogs = Vec::new();

        while let Some(row) = rows.next()? {
            blogs.push(parse_blog_row(row)?);
        }

        Ok(blogs)
    }
}

/// Builds the `UPDATE` statement for the present fields, `content` first.
///
/// Returns `None` when there is nothing to write. The id placeholder is the
/// last one; its value is not included in the returned bind list.
fn build_update(changes: &BlogChanges) -> Option<(String, Vec<Value>)> {
    let mut assignments = Vec::new();
    let mut bind_values = Vec::new();

    if let Some(content) = changes.content.as_ref() {
        assignments.push("content = ?");
        bind_values.push(Value::Text(content.clone()));
    }
    if let Some(title) = changes.title.as_ref() {
        assignments.push("title = ?");
        bind_values.push(Value::Text(title.clone()));
    }

    if assignments.is_empty() {
        return None;
    }

    let sql = format!(
        "UPDATE {BLOGS_TABLE} SET {} WHERE (id = ?)",
        assignments.join(", ")
    );
    Some((sql, bind_values))
}

fn log_write(event: &str, id: BlogId, result: &RepoResult<usize>) {
    match result {
        Ok(affected) => {
            debug!("event={event} module=repo status=ok id={id} affected_rows={affected}")
        }
        Err(err) => warn!("event={event} module=repo status=error id={id} error={err}"),
    }
}

fn parse_blog_row(row: &Row<'_>) -> RepoResult<Blog> {
    let created_at_text: String = row.get("created_at")?;
    let created_at = parse_timestamp(&created_at_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{created_at_text}` in blogs.created_at"
        ))
    })?;

    Ok(Blog {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at,
    })
}

fn format_timestamp(value: &DateTime<Utc>) -> RepoResult<String> {
    if !STORABLE_YEARS.contains(&value.year()) {
        return Err(RepoError::UnsupportedTimestamp(*value));
    }
    Ok(value.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn ensure_blog_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, BLOGS_TABLE)? {
        return Err(RepoError::MissingRequiredTable(BLOGS_TABLE));
    }

    for column in BLOG_COLUMNS {
        if !table_has_column(conn, BLOGS_TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: BLOGS_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
