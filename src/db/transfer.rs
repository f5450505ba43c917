// src/db/transfer.rs

use std::collections::HashSet;

use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};

use crate::db::error::{Result, Side};
use crate::db::projection::{project, Row, TransferMask};
use crate::db::schema::quote_ident;

/// Значение первичного ключа (первая колонка строки) в виде, пригодном для HashSet.
/// REAL сравниваем по битам: ключи Trilium — строки, до этого не доходит.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimaryKey {
    Null,
    Integer(i64),
    Real(u64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<&Value> for PrimaryKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => PrimaryKey::Null,
            Value::Integer(i) => PrimaryKey::Integer(*i),
            Value::Real(r) => PrimaryKey::Real(r.to_bits()),
            Value::Text(s) => PrimaryKey::Text(s.clone()),
            Value::Blob(b) => PrimaryKey::Blob(b.clone()),
        }
    }
}

impl std::fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryKey::Null => write!(f, "NULL"),
            PrimaryKey::Integer(i) => write!(f, "{i}"),
            PrimaryKey::Real(bits) => write!(f, "{}", f64::from_bits(*bits)),
            PrimaryKey::Text(s) => write!(f, "{s}"),
            PrimaryKey::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
        }
    }
}

pub fn key_of(row: &[Value]) -> PrimaryKey {
    row.first().map(PrimaryKey::from).unwrap_or(PrimaryKey::Null)
}

/// Итог переноса одной таблицы.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub fetched_source: usize,
    pub fetched_destination: usize,
    pub skipped: usize,
    pub inserted: usize,
    pub titles_fixed: usize,
}

impl TableReport {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }
}

/// Читает все строки запроса как есть, без типизации.
pub fn fetch_rows(conn: &Connection, sql: &str) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let width = stmt.column_count();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Row>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn existing_keys(rows: &[Row]) -> HashSet<PrimaryKey> {
    rows.iter().map(|row| key_of(row)).collect()
}

/// Отбрасывает строки, ключ которых уже есть в базе назначения.
/// Возвращает оставшиеся строки и число пропущенных.
pub fn without_collisions(table: &str, rows: Vec<Row>, existing: &HashSet<PrimaryKey>) -> (Vec<Row>, usize) {
    let mut kept = Vec::with_capacity(rows.len());
    let mut skipped = 0;

    for row in rows {
        let key = key_of(&row);
        if existing.contains(&key) {
            info!("Skipping row with UID {key} in table {table}");
            skipped += 1;
        } else {
            kept.push(row);
        }
    }
    (kept, skipped)
}

/// Вставляет строки одним подготовленным запросом.
/// Без `columns` — позиционный `INSERT INTO t VALUES (...)`.
pub fn insert_rows(conn: &Connection, table: &str, columns: Option<&[String]>, rows: &[Row]) -> Result<usize> {
    let Some(first) = rows.first() else {
        info!("Nothing to insert into table {table}");
        return Ok(0);
    };

    let placeholders = (1..=first.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = match columns {
        Some(columns) => format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            quote_ident(table),
            columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ")
        ),
        None => format!("INSERT INTO {} VALUES ({placeholders})", quote_ident(table)),
    };
    debug!("{sql}");

    let mut stmt = conn.prepare(&sql)?;
    for row in rows {
        stmt.execute(params_from_iter(row.iter()))?;
    }

    info!("Inserted {} rows into table {table} in {}", rows.len(), Side::Destination);
    Ok(rows.len())
}

/// Переносит таблицу целиком: `SELECT *` с обеих сторон, пропуск совпавших
/// ключей, проекция по маске, вставка. Коммит делает вызывающий.
pub fn transfer_table(
    table: &str,
    mask: &TransferMask,
    source: &Connection,
    destination: &Connection,
) -> Result<TableReport> {
    let select = format!("SELECT * FROM {};", quote_ident(table));
    let mut report = TableReport::new(table);

    let old_rows = fetch_rows(source, &select)?;
    report.fetched_source = old_rows.len();
    info!("Fetched {} records from table {table} in {}", old_rows.len(), Side::Source);

    let new_rows = fetch_rows(destination, &select)?;
    report.fetched_destination = new_rows.len();
    info!("Fetched {} records from table {table} in {}", new_rows.len(), Side::Destination);

    let existing = existing_keys(&new_rows);
    drop(new_rows);

    let (fresh, skipped) = without_collisions(table, old_rows, &existing);
    report.skipped = skipped;

    let projected = fresh
        .iter()
        .map(|row| project(row, mask))
        .collect::<Result<Vec<_>>>()?;

    report.inserted = insert_rows(destination, table, None, &projected)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::error::MigrationError;
    use rusqlite::params;

    fn setup() -> rusqlite::Result<(Connection, Connection)> {
        let old = Connection::open_in_memory()?;
        old.execute_batch(
            "CREATE TABLE recent_notes (noteId TEXT PRIMARY KEY, notePath TEXT, hash TEXT, utcDateCreated TEXT, isDeleted INT);",
        )?;
        let new = Connection::open_in_memory()?;
        new.execute_batch(
            "CREATE TABLE recent_notes (noteId TEXT PRIMARY KEY, notePath TEXT, utcDateCreated TEXT);",
        )?;
        Ok((old, new))
    }

    fn insert_old(conn: &Connection, id: &str, path: &str) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO recent_notes VALUES (?1, ?2, 'h', '2021-01-01', 0)",
            params![id, path],
        )?;
        Ok(())
    }

    #[test]
    fn test_transfer_projects_and_inserts() -> Result<(), Box<dyn std::error::Error>> {
        let (old, new) = setup()?;
        insert_old(&old, "A", "root/A")?;
        insert_old(&old, "B", "root/B")?;

        let mask = TransferMask::from_bits(&[1, 1, 0, 1, 0]);
        let report = transfer_table("recent_notes", &mask, &old, &new)?;

        assert_eq!(report.fetched_source, 2);
        assert_eq!(report.fetched_destination, 0);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, 0);

        let rows = fetch_rows(&new, "SELECT * FROM recent_notes ORDER BY noteId")?;
        assert_eq!(
            rows[0],
            vec![
                Value::Text("A".into()),
                Value::Text("root/A".into()),
                Value::Text("2021-01-01".into())
            ]
        );
        assert_eq!(rows.len(), 2);
        Ok(())
    }

    #[test]
    fn test_transfer_skips_existing_keys() -> Result<(), Box<dyn std::error::Error>> {
        let (old, new) = setup()?;
        insert_old(&old, "X", "old/X")?;
        insert_old(&old, "Y", "old/Y")?;
        new.execute("INSERT INTO recent_notes VALUES ('X', 'kept/X', '2020-01-01')", [])?;

        let mask = TransferMask::from_bits(&[1, 1, 0, 1, 0]);
        let report = transfer_table("recent_notes", &mask, &old, &new)?;
        assert_eq!(report.skipped, 1);
        assert_eq!(report.inserted, 1);

        // существующая строка не тронута
        let path: String = new.query_row(
            "SELECT notePath FROM recent_notes WHERE noteId = 'X'",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(path, "kept/X");
        let count: i64 = new.query_row("SELECT COUNT(*) FROM recent_notes", [], |r| r.get(0))?;
        assert_eq!(count, 2);
        Ok(())
    }

    #[test]
    fn test_transfer_empty_source_inserts_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let (old, new) = setup()?;
        let mask = TransferMask::from_bits(&[1, 1, 0, 1, 0]);
        let report = transfer_table("recent_notes", &mask, &old, &new)?;
        assert_eq!(report.inserted, 0);
        Ok(())
    }

    #[test]
    fn test_transfer_wrong_arity_is_sql_error() -> Result<(), Box<dyn std::error::Error>> {
        let (old, new) = setup()?;
        insert_old(&old, "A", "root/A")?;

        // маска оставляет 4 колонки, а в новой таблице их 3
        let mask = TransferMask::from_bits(&[1, 1, 1, 1, 0]);
        let err = transfer_table("recent_notes", &mask, &old, &new).unwrap_err();
        assert!(matches!(err, MigrationError::Sqlite(_)));
        Ok(())
    }

    #[test]
    fn test_transfer_short_mask_is_arity_error() -> Result<(), Box<dyn std::error::Error>> {
        let (old, new) = setup()?;
        insert_old(&old, "A", "root/A")?;

        let mask = TransferMask::from_bits(&[1, 1, 1]);
        let err = transfer_table("recent_notes", &mask, &old, &new).unwrap_err();
        assert!(matches!(err, MigrationError::MaskArity { mask: 3, row: 5 }));
        Ok(())
    }

    #[test]
    fn test_primary_key_from_value() {
        let keys = existing_keys(&[
            vec![Value::Text("abc".into())],
            vec![Value::Integer(7)],
            vec![Value::Null],
        ]);
        assert!(keys.contains(&PrimaryKey::Text("abc".into())));
        assert!(keys.contains(&PrimaryKey::Integer(7)));
        assert!(keys.contains(&PrimaryKey::Null));
        assert!(!keys.contains(&PrimaryKey::Text("7".into())));
        assert_eq!(PrimaryKey::Text("abc".into()).to_string(), "abc");
    }
}
