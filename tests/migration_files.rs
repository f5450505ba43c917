use rusqlite::{params, Connection};
use tempfile::tempdir;
use trilium_migrate::db::schema::{NEW_SCHEMA_SQL, OLD_SCHEMA_SQL};
use trilium_migrate::{run, MigrationConfig, MigrationError};

fn create_db(path: &std::path::Path, ddl: &str) -> Connection {
    let conn = Connection::open(path).expect("open fixture db");
    conn.execute_batch(ddl).expect("create fixture schema");
    conn
}

fn seed_old(conn: &Connection) {
    conn.execute(
        "INSERT INTO branches VALUES ('B1', 'N1', 'root', 10, NULL, 1, 0, NULL, 'udm', 'udc', 'hash')",
        [],
    )
    .expect("insert branch");
    conn.execute(
        "INSERT INTO note_contents VALUES ('N1', '<p>hello</p>', 'hash', 'dm', 'udm')",
        [],
    )
    .expect("insert note content");
    conn.execute(
        "INSERT INTO note_revision_contents VALUES ('R1', 'old body', 'hash', 'udm')",
        [],
    )
    .expect("insert revision content");
    conn.execute(
        "INSERT INTO recent_notes VALUES ('N1', 'root/N1', 'hash', 'udc', 0)",
        [],
    )
    .expect("insert recent note");
    for (id, title) in [("R1", None), ("R2", Some("Second"))] {
        conn.execute(
            r#"INSERT INTO note_revisions (
                noteRevisionId, noteId, title, isProtected, dateLastEdited, dateCreated,
                utcDateLastEdited, utcDateCreated, utcDateModified, type, mime
            ) VALUES (?1, 'N1', ?2, 0, 'dle', 'dc', 'udle', 'udc', 'udm', 'text', 'text/html')"#,
            params![id, title],
        )
        .expect("insert revision");
    }
}

fn dump(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {table} ORDER BY 1"))
        .expect("prepare dump");
    let width = stmt.column_count();
    stmt.query_map([], |row| {
        let mut line = Vec::with_capacity(width);
        for i in 0..width {
            let value: rusqlite::types::Value = row.get(i)?;
            line.push(format!("{value:?}"));
        }
        Ok(line.join("|"))
    })
    .expect("query dump")
    .collect::<rusqlite::Result<Vec<_>>>()
    .expect("collect dump")
}

const TABLES: [&str; 7] = [
    "attributes",
    "branches",
    "note_contents",
    "note_revision_contents",
    "notes",
    "recent_notes",
    "note_revisions",
];

#[test]
fn migrates_files_and_is_idempotent() {
    let dir = tempdir().expect("tempdir");
    let old_path = dir.path().join("document-old.db");
    let new_path = dir.path().join("document-new.db");
    seed_old(&create_db(&old_path, OLD_SCHEMA_SQL));
    drop(create_db(&new_path, NEW_SCHEMA_SQL));

    let config = MigrationConfig::with_paths(&old_path, &new_path);
    let first = run(&config).expect("first run");
    assert_eq!(first.inserted(), 6);
    assert_eq!(first.table("note_revisions").map(|t| t.titles_fixed), Some(1));
    assert!(first.finished_at.is_some());

    let conn = Connection::open(&new_path).expect("reopen destination");
    let title: String = conn
        .query_row(
            "SELECT title FROM note_revisions WHERE noteRevisionId = 'R1'",
            [],
            |r| r.get(0),
        )
        .expect("revision R1");
    assert_eq!(title, "No Title");
    let prefix: Option<String> = conn
        .query_row("SELECT prefix FROM branches WHERE branchId = 'B1'", [], |r| r.get(0))
        .expect("branch B1");
    assert_eq!(prefix, None);

    let snapshot: Vec<Vec<String>> = TABLES.iter().map(|t| dump(&conn, t)).collect();
    drop(conn);

    let second = run(&config).expect("second run");
    assert_eq!(second.inserted(), 0);
    assert_eq!(second.skipped(), 6);

    let conn = Connection::open(&new_path).expect("reopen destination");
    let again: Vec<Vec<String>> = TABLES.iter().map(|t| dump(&conn, t)).collect();
    assert_eq!(snapshot, again);
}

#[test]
fn missing_destination_file_fails() {
    let dir = tempdir().expect("tempdir");
    let old_path = dir.path().join("document-old.db");
    drop(create_db(&old_path, OLD_SCHEMA_SQL));

    let config = MigrationConfig::with_paths(&old_path, dir.path().join("absent.db"));
    let err = run(&config).expect_err("destination does not exist");
    assert!(matches!(err, MigrationError::Sqlite(_)), "unexpected error: {err}");
}
