use blogstore_core::db::migrations::latest_version;
use blogstore_core::db::{open_db, open_db_in_memory};
use blogstore_core::{Blog, BlogChanges, BlogRepository, RepoError, SqliteBlogRepository};
use chrono::{TimeZone, Utc};
use rusqlite::Connection;

#[test]
fn create_assigns_id_and_get_by_id_roundtrips() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
    let mut blog = Blog::with_created_at("title", "hell sqlmock", created_at);
    assert_eq!(blog.id, 0);
    assert!(!blog.is_persisted());

    let id = repo.create(&mut blog).unwrap();
    assert_eq!(id, 1);
    assert_eq!(blog.id, 1);
    assert!(blog.is_persisted());

    let loaded = repo.get_by_id(id).unwrap();
    assert_eq!(loaded, blog);
}

#[test]
fn create_preserves_subsecond_creation_time() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let mut blog = Blog::new("now", "body");
    let id = repo.create(&mut blog).unwrap();

    assert_eq!(repo.get_by_id(id).unwrap().created_at, blog.created_at);
}

#[test]
fn create_assigns_increasing_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let mut first = Blog::new("a", "one");
    let mut second = Blog::new("b", "two");
    let first_id = repo.create(&mut first).unwrap();
    let second_id = repo.create(&mut second).unwrap();

    assert!(second_id > first_id);
}

#[test]
fn create_rejects_already_persisted_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let mut blog = Blog::new("title", "content");
    repo.create(&mut blog).unwrap();

    let err = repo.create(&mut blog).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyPersisted(1)));
    assert_eq!(repo.get_by_title("title").unwrap().len(), 1);
}

#[test]
fn create_rejects_timestamps_outside_four_digit_years_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let far_future = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
    let before_zero = Utc.with_ymd_and_hms(-5, 6, 1, 12, 0, 0).unwrap();
    for created_at in [far_future, before_zero] {
        let mut blog = Blog::with_created_at("t", "c", created_at);
        let err = repo.create(&mut blog).unwrap_err();
        assert!(matches!(err, RepoError::UnsupportedTimestamp(value) if value == created_at));
        assert!(!blog.is_persisted());
    }

    assert!(repo.get_by_title("t").unwrap().is_empty());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM blogs;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);

    let last_storable = Utc.with_ymd_and_hms(9999, 12, 31, 0, 0, 0).unwrap();
    let mut valid = Blog::with_created_at("t", "c", last_storable);
    let id = repo.create(&mut valid).unwrap();
    assert_eq!(repo.get_by_id(id).unwrap(), valid);
    assert_eq!(repo.get_by_title("t").unwrap(), vec![valid]);
}

#[test]
fn update_overwrites_title_and_content_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let mut blog = Blog::new("post", "content");
    let id = repo.create(&mut blog).unwrap();

    let changes = BlogChanges::default().title("newPost").content("newContent");
    let affected = repo.update(id, &changes).unwrap();
    assert_eq!(affected, 1);

    let loaded = repo.get_by_id(id).unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.title, "newPost");
    assert_eq!(loaded.content, "newContent");
    assert_eq!(loaded.created_at, blog.created_at);
}

#[test]
fn update_from_record_skips_empty_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let mut blog = Blog::new("keep me", "old body");
    let id = repo.create(&mut blog).unwrap();

    let partial = Blog::new("", "new body");
    repo.update(id, &BlogChanges::from(&partial)).unwrap();

    let loaded = repo.get_by_id(id).unwrap();
    assert_eq!(loaded.title, "keep me");
    assert_eq!(loaded.content, "new body");
    assert_eq!(loaded.created_at, blog.created_at);
}

#[test]
fn update_missing_id_reports_zero_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let affected = repo
        .update(42, &BlogChanges::default().title("ghost"))
        .unwrap();
    assert_eq!(affected, 0);
}

#[test]
fn update_without_changes_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let mut blog = Blog::new("post", "content");
    let id = repo.create(&mut blog).unwrap();

    assert_eq!(repo.update(id, &BlogChanges::default()).unwrap(), 0);
    assert_eq!(repo.get_by_id(id).unwrap(), blog);
}

#[test]
fn delete_then_get_by_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let mut blog = Blog::new("post", "content");
    let id = repo.create(&mut blog).unwrap();

    assert_eq!(repo.delete(id).unwrap(), 1);
    let err = repo.get_by_id(id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
    assert_eq!(err.to_string(), format!("record not found: blog {id}"));
}

#[test]
fn delete_missing_id_is_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    assert_eq!(repo.delete(7).unwrap(), 0);
}

#[test]
fn deleted_ids_are_not_reused() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let mut first = Blog::new("a", "one");
    let first_id = repo.create(&mut first).unwrap();
    repo.delete(first_id).unwrap();

    let mut second = Blog::new("b", "two");
    assert!(repo.create(&mut second).unwrap() > first_id);
}

#[test]
fn get_by_title_returns_exact_matches_in_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let mut first = Blog::new("post", "content1");
    let mut other = Blog::new("Post", "different case");
    let mut second = Blog::new("post", "content2");
    let mut prefixed = Blog::new("post 2", "prefix match");
    repo.create(&mut first).unwrap();
    repo.create(&mut other).unwrap();
    repo.create(&mut second).unwrap();
    repo.create(&mut prefixed).unwrap();

    let found = repo.get_by_title("post").unwrap();
    assert_eq!(found, vec![first, second]);
}

#[test]
fn get_by_title_without_matches_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    assert!(repo.get_by_title("nothing here").unwrap().is_empty());
}

#[test]
fn get_by_id_on_empty_table_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    assert!(matches!(repo.get_by_id(1), Err(RepoError::NotFound(1))));
}

#[test]
fn get_by_id_rejects_malformed_timestamp() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO blogs (title, content, created_at) VALUES ('t', 'c', 'not a time');",
        [],
    )
    .unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let err = repo.get_by_id(1).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn constraint_violation_surfaces_as_db_error() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_blank_titles BEFORE INSERT ON blogs
         WHEN NEW.title = ''
         BEGIN SELECT RAISE(ABORT, 'blank title'); END;",
    )
    .unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let mut blog = Blog::new("", "content");
    let err = repo.create(&mut blog).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(err.to_string().contains("blank title"));
    assert!(!blog.is_persisted());

    let mut valid = Blog::new("ok", "content");
    repo.create(&mut valid).unwrap();
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteBlogRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_blogs_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteBlogRepository::try_new(&conn);
    assert!(matches!(result, Err(RepoError::MissingRequiredTable("blogs"))));
}

#[test]
fn repository_rejects_blogs_table_missing_created_at() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE blogs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteBlogRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "blogs",
            column: "created_at"
        })
    ));
}

#[test]
fn records_survive_reopening_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blogs.db");

    let mut blog = Blog::new("durable", "written to disk");
    {
        let conn = open_db(&path).unwrap();
        let repo = SqliteBlogRepository::try_new(&conn).unwrap();
        repo.create(&mut blog).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    assert_eq!(repo.get_by_id(blog.id).unwrap(), blog);
}

#[test]
fn gateway_is_usable_through_trait_object() {
    let conn = open_db_in_memory().unwrap();
    let sqlite = SqliteBlogRepository::try_new(&conn).unwrap();
    let repo: &dyn BlogRepository = &sqlite;

    let mut blog = Blog::new("dyn", "dispatch");
    let id = repo.create(&mut blog).unwrap();
    assert_eq!(repo.get_by_id(id).unwrap().title, "dyn");
}
