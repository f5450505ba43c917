// src/db/schema.rs
//
// Раскладки таблиц Trilium 0.45.8 (старая) и 0.55.1 (новая) плюс проверка
// реальных файлов перед переносом.

use log::warn;
use rusqlite::Connection;

use crate::db::error::{MigrationError, Result, Side};

/// Имя таблицы и её колонки в порядке объявления.
#[derive(Debug, Clone, Copy)]
pub struct TableLayout {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

// ---------------------- 0.45.8 ----------------------

pub const OLD_ATTRIBUTES: TableLayout = TableLayout {
    table: "attributes",
    columns: &[
        "attributeId", "noteId", "type", "name", "value", "position",
        "utcDateCreated", "utcDateModified", "isDeleted", "deleteId", "hash",
        "isInheritable",
    ],
};

pub const OLD_BRANCHES: TableLayout = TableLayout {
    table: "branches",
    columns: &[
        "branchId", "noteId", "parentNoteId", "notePosition", "prefix",
        "isExpanded", "isDeleted", "deleteId", "utcDateModified",
        "utcDateCreated", "hash",
    ],
};

pub const OLD_NOTE_CONTENTS: TableLayout = TableLayout {
    table: "note_contents",
    columns: &["noteId", "content", "hash", "dateModified", "utcDateModified"],
};

pub const OLD_NOTE_REVISION_CONTENTS: TableLayout = TableLayout {
    table: "note_revision_contents",
    columns: &["noteRevisionId", "content", "hash", "utcDateModified"],
};

pub const OLD_NOTES: TableLayout = TableLayout {
    table: "notes",
    columns: &[
        "noteId", "title", "isProtected", "type", "mime", "hash", "isDeleted",
        "deleteId", "isErased", "dateCreated", "dateModified", "utcDateCreated",
        "utcDateModified",
    ],
};

pub const OLD_RECENT_NOTES: TableLayout = TableLayout {
    table: "recent_notes",
    columns: &["noteId", "notePath", "hash", "utcDateCreated", "isDeleted"],
};

pub const OLD_NOTE_REVISIONS: TableLayout = TableLayout {
    table: "note_revisions",
    columns: &[
        "noteRevisionId", "noteId", "title", "contentLength", "isErased",
        "isProtected", "dateLastEdited", "dateCreated", "utcDateLastEdited",
        "utcDateCreated", "utcDateModified", "type", "mime", "hash",
    ],
};

// ---------------------- 0.55.1 ----------------------

pub const NEW_ATTRIBUTES: TableLayout = TableLayout {
    table: "attributes",
    columns: &[
        "attributeId", "noteId", "type", "name", "value", "position",
        "utcDateModified", "isDeleted", "deleteId", "isInheritable",
    ],
};

pub const NEW_BRANCHES: TableLayout = TableLayout {
    table: "branches",
    columns: &[
        "branchId", "noteId", "parentNoteId", "notePosition", "prefix",
        "isExpanded", "isDeleted", "deleteId", "utcDateModified",
    ],
};

pub const NEW_NOTE_CONTENTS: TableLayout = TableLayout {
    table: "note_contents",
    columns: &["noteId", "content", "dateModified", "utcDateModified"],
};

pub const NEW_NOTE_REVISION_CONTENTS: TableLayout = TableLayout {
    table: "note_revision_contents",
    columns: &["noteRevisionId", "content", "utcDateModified"],
};

pub const NEW_NOTES: TableLayout = TableLayout {
    table: "notes",
    columns: &[
        "noteId", "title", "isProtected", "type", "mime", "isDeleted",
        "deleteId", "dateCreated", "dateModified", "utcDateCreated",
        "utcDateModified",
    ],
};

pub const NEW_RECENT_NOTES: TableLayout = TableLayout {
    table: "recent_notes",
    columns: &["noteId", "notePath", "utcDateCreated"],
};

pub const NEW_NOTE_REVISIONS: TableLayout = TableLayout {
    table: "note_revisions",
    columns: &[
        "noteRevisionId", "noteId", "type", "mime", "title", "isProtected",
        "utcDateLastEdited", "utcDateCreated", "utcDateModified",
        "dateLastEdited", "dateCreated",
    ],
};

/// Таблицы, переносимые по маске, в порядке переноса.
pub const OLD_TABLES: [TableLayout; 6] = [
    OLD_ATTRIBUTES,
    OLD_BRANCHES,
    OLD_NOTE_CONTENTS,
    OLD_NOTE_REVISION_CONTENTS,
    OLD_NOTES,
    OLD_RECENT_NOTES,
];

pub const NEW_TABLES: [TableLayout; 6] = [
    NEW_ATTRIBUTES,
    NEW_BRANCHES,
    NEW_NOTE_CONTENTS,
    NEW_NOTE_REVISION_CONTENTS,
    NEW_NOTES,
    NEW_RECENT_NOTES,
];

// ---------------------- DDL ----------------------
//
// Только переносимые таблицы. Нужны для тестовых баз; настоящий
// document-new.db создаёт сам Trilium.

pub const OLD_SCHEMA_SQL: &str = r#"
BEGIN;

CREATE TABLE IF NOT EXISTS attributes (
    attributeId TEXT NOT NULL PRIMARY KEY,
    noteId TEXT NOT NULL,
    type TEXT NOT NULL,
    name TEXT NOT NULL,
    value TEXT DEFAULT '' NOT NULL,
    position INT DEFAULT 0 NOT NULL,
    utcDateCreated TEXT NOT NULL,
    utcDateModified TEXT NOT NULL,
    isDeleted INT NOT NULL,
    deleteId TEXT DEFAULT NULL,
    hash TEXT DEFAULT '' NOT NULL,
    isInheritable INT DEFAULT 0 NULL
);

CREATE TABLE IF NOT EXISTS branches (
    branchId TEXT NOT NULL PRIMARY KEY,
    noteId TEXT NOT NULL,
    parentNoteId TEXT NOT NULL,
    notePosition INTEGER NOT NULL,
    prefix TEXT,
    isExpanded INTEGER NOT NULL DEFAULT 0,
    isDeleted INTEGER NOT NULL DEFAULT 0,
    deleteId TEXT DEFAULT NULL,
    utcDateModified TEXT NOT NULL,
    utcDateCreated TEXT NOT NULL,
    hash TEXT DEFAULT '' NOT NULL
);

CREATE TABLE IF NOT EXISTS note_contents (
    noteId TEXT NOT NULL PRIMARY KEY,
    content TEXT NULL DEFAULT NULL,
    hash TEXT DEFAULT '' NOT NULL,
    dateModified TEXT NOT NULL,
    utcDateModified TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS note_revision_contents (
    noteRevisionId TEXT NOT NULL PRIMARY KEY,
    content TEXT,
    hash TEXT DEFAULT '' NOT NULL,
    utcDateModified TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    noteId TEXT NOT NULL PRIMARY KEY,
    title TEXT NOT NULL DEFAULT 'note',
    isProtected INT NOT NULL DEFAULT 0,
    type TEXT NOT NULL DEFAULT 'text',
    mime TEXT NOT NULL DEFAULT 'text/html',
    hash TEXT DEFAULT '' NOT NULL,
    isDeleted INT NOT NULL DEFAULT 0,
    deleteId TEXT DEFAULT NULL,
    isErased INT NOT NULL DEFAULT 0,
    dateCreated TEXT NOT NULL,
    dateModified TEXT NOT NULL,
    utcDateCreated TEXT NOT NULL,
    utcDateModified TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recent_notes (
    noteId TEXT NOT NULL PRIMARY KEY,
    notePath TEXT NOT NULL,
    hash TEXT DEFAULT '' NOT NULL,
    utcDateCreated TEXT NOT NULL,
    isDeleted INT
);

CREATE TABLE IF NOT EXISTS note_revisions (
    noteRevisionId TEXT NOT NULL PRIMARY KEY,
    noteId TEXT NOT NULL,
    title TEXT,
    contentLength INT NOT NULL DEFAULT 0,
    isErased INT NOT NULL DEFAULT 0,
    isProtected INT NOT NULL DEFAULT 0,
    dateLastEdited TEXT NOT NULL,
    dateCreated TEXT NOT NULL,
    utcDateLastEdited TEXT NOT NULL,
    utcDateCreated TEXT NOT NULL,
    utcDateModified TEXT NOT NULL,
    type TEXT DEFAULT '' NOT NULL,
    mime TEXT DEFAULT '' NOT NULL,
    hash TEXT DEFAULT '' NOT NULL
);

COMMIT;
"#;

pub const NEW_SCHEMA_SQL: &str = r#"
BEGIN;

CREATE TABLE IF NOT EXISTS attributes (
    attributeId TEXT NOT NULL PRIMARY KEY,
    noteId TEXT NOT NULL,
    type TEXT NOT NULL,
    name TEXT NOT NULL,
    value TEXT DEFAULT '' NOT NULL,
    position INT DEFAULT 0 NOT NULL,
    utcDateModified TEXT NOT NULL,
    isDeleted INT NOT NULL,
    deleteId TEXT DEFAULT NULL,
    isInheritable INT DEFAULT 0 NULL
);

CREATE TABLE IF NOT EXISTS branches (
    branchId TEXT NOT NULL PRIMARY KEY,
    noteId TEXT NOT NULL,
    parentNoteId TEXT NOT NULL,
    notePosition INTEGER NOT NULL,
    prefix TEXT,
    isExpanded INTEGER NOT NULL DEFAULT 0,
    isDeleted INTEGER NOT NULL DEFAULT 0,
    deleteId TEXT DEFAULT NULL,
    utcDateModified TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS note_contents (
    noteId TEXT NOT NULL PRIMARY KEY,
    content TEXT NULL DEFAULT NULL,
    dateModified TEXT NOT NULL,
    utcDateModified TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS note_revision_contents (
    noteRevisionId TEXT NOT NULL PRIMARY KEY,
    content TEXT,
    utcDateModified TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    noteId TEXT NOT NULL PRIMARY KEY,
    title TEXT NOT NULL DEFAULT 'note',
    isProtected INT NOT NULL DEFAULT 0,
    type TEXT NOT NULL DEFAULT 'text',
    mime TEXT NOT NULL DEFAULT 'text/html',
    isDeleted INT NOT NULL DEFAULT 0,
    deleteId TEXT DEFAULT NULL,
    dateCreated TEXT NOT NULL,
    dateModified TEXT NOT NULL,
    utcDateCreated TEXT NOT NULL,
    utcDateModified TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recent_notes (
    noteId TEXT NOT NULL PRIMARY KEY,
    notePath TEXT NOT NULL,
    utcDateCreated TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS note_revisions (
    noteRevisionId TEXT NOT NULL PRIMARY KEY,
    noteId TEXT NOT NULL,
    type TEXT DEFAULT '' NOT NULL,
    mime TEXT DEFAULT '' NOT NULL,
    title TEXT NOT NULL,
    isProtected INT NOT NULL DEFAULT 0,
    utcDateLastEdited TEXT NOT NULL,
    utcDateCreated TEXT NOT NULL,
    utcDateModified TEXT NOT NULL,
    dateLastEdited TEXT NOT NULL,
    dateCreated TEXT NOT NULL
);

COMMIT;
"#;

// ---------------------- Проверка файлов ----------------------

/// Экранирует имя таблицы/колонки для подстановки в SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Колонки таблицы в порядке объявления. Пустой список — таблицы нет.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Перенос идёт по позициям, поэтому число колонок должно совпасть точно.
/// Расхождение в именах при том же числе — только предупреждение.
pub fn check_layout(conn: &Connection, side: Side, table: &str, expected: &[String]) -> Result<()> {
    let actual = table_columns(conn, table)?;

    if actual.len() != expected.len() {
        return Err(MigrationError::SchemaMismatch {
            side,
            table: table.to_string(),
            expected: expected.len(),
            actual: actual.len(),
        });
    }

    for (position, (have, want)) in actual.iter().zip(expected).enumerate() {
        if !have.eq_ignore_ascii_case(want) {
            warn!(
                "{side} table '{table}': column {position} is '{have}', expected '{want}'"
            );
        }
    }
    Ok(())
}

/// Для переноса по явному списку колонок: все они должны существовать.
pub fn check_columns_present(conn: &Connection, side: Side, table: &str, columns: &[String]) -> Result<()> {
    let actual = table_columns(conn, table)?;

    for column in columns {
        if !actual.iter().any(|c| c.eq_ignore_ascii_case(column)) {
            return Err(MigrationError::MissingColumn {
                side,
                table: table.to_string(),
                column: column.clone(),
            });
        }
    }
    Ok(())
}
