// src/db/revisions.rs
//
// note_revisions в 0.45.8 шире, чем в 0.55.1, и допускает пустой title,
// поэтому переносим по явному списку колонок, а не по маске.

use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::Connection;

use crate::config::RevisionMapping;
use crate::db::error::{Result, Side};
use crate::db::schema::quote_ident;
use crate::db::transfer::{existing_keys, fetch_rows, insert_rows, without_collisions, TableReport};

/// Пустой или NULL title заменяем на `default_title`. Возвращает true, если заменили.
pub fn fix_title(row: &mut [Value], title_index: usize, default_title: &str) -> bool {
    let Some(slot) = row.get_mut(title_index) else {
        return false;
    };

    let empty = match slot {
        Value::Null => true,
        Value::Text(s) => s.is_empty(),
        _ => false,
    };
    if empty {
        *slot = Value::Text(default_title.to_string());
    }
    empty
}

pub fn transfer_revisions(
    mapping: &RevisionMapping,
    source: &Connection,
    destination: &Connection,
) -> Result<TableReport> {
    let title_index = mapping.title_index()?;
    let table = mapping.table.as_str();
    let select = format!(
        "SELECT {} FROM {};",
        mapping
            .columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", "),
        quote_ident(table)
    );
    let mut report = TableReport::new(table);

    let old_rows = fetch_rows(source, &select)?;
    report.fetched_source = old_rows.len();
    info!("Fetched {} records from table {table} in {}", old_rows.len(), Side::Source);

    let new_rows = fetch_rows(destination, &select)?;
    report.fetched_destination = new_rows.len();
    info!("Fetched {} records from table {table} in {}", new_rows.len(), Side::Destination);

    let existing = existing_keys(&new_rows);
    drop(new_rows);

    let (mut fresh, skipped) = without_collisions(table, old_rows, &existing);
    report.skipped = skipped;

    for row in fresh.iter_mut() {
        if fix_title(row, title_index, &mapping.default_title) {
            report.titles_fixed += 1;
        }
    }
    if report.titles_fixed > 0 {
        debug!("Replaced {} empty titles in table {table}", report.titles_fixed);
    }

    report.inserted = insert_rows(destination, table, Some(mapping.columns.as_slice()), &fresh)?;
    Ok(report)
}
