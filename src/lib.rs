// src/lib.rs
//
// Перенос данных из document.db Trilium Notes 0.45.8 в свежесозданный
// document.db 0.55.1. Таблицы api_keys, entity_changes, options и
// sqlite_sequence не переносятся.

pub mod config;
pub mod db;

use log::info;

pub use crate::config::{MigrationConfig, RevisionMapping, TableMapping};
pub use crate::db::error::{MigrationError, Result};
pub use crate::db::migrations::{migrate, MigrationReport};
pub use crate::db::monitoring::gather_metrics;
pub use crate::db::projection::{project, Row, TransferMask};
pub use crate::db::revisions::transfer_revisions;
pub use crate::db::transfer::{transfer_table, TableReport};

/// Открывает обе базы, переносит всё и закрывает соединения.
/// При ошибке соединения закрываются при выходе из функции (drop).
pub fn run(config: &MigrationConfig) -> Result<MigrationReport> {
    let source = db::open_source(&config.source_path)?;
    let mut destination = db::open_destination(&config.destination_path)?;

    let report = migrate(&source, &mut destination, config)?;

    source.close().map_err(|(_, e)| MigrationError::Sqlite(e))?;
    destination.close().map_err(|(_, e)| MigrationError::Sqlite(e))?;
    info!("Closed both databases");

    Ok(report)
}
