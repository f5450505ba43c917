// src/db/migrations.rs

use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::config::MigrationConfig;
use crate::db::error::{MigrationError, Result, Side};
use crate::db::monitoring::measure_table_transfer;
use crate::db::projection::TransferMask;
use crate::db::revisions::transfer_revisions;
use crate::db::schema::{check_columns_present, check_layout};
use crate::db::transfer::{transfer_table, TableReport};

/// Итог всего прогона.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub tables: Vec<TableReport>,
}

impl MigrationReport {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            tables: Vec::new(),
        }
    }

    pub fn inserted(&self) -> usize {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    pub fn skipped(&self) -> usize {
        self.tables.iter().map(|t| t.skipped).sum()
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }
}

/// Сверяет обе базы с конфигурацией до того, как что-либо записано.
pub fn check_schemas(
    source: &Connection,
    destination: &Connection,
    config: &MigrationConfig,
) -> Result<Vec<TransferMask>> {
    let mut masks = Vec::with_capacity(config.tables.len());

    for mapping in &config.tables {
        check_layout(source, Side::Source, &mapping.table, &mapping.source_columns)?;
        check_layout(destination, Side::Destination, &mapping.table, &mapping.kept_columns)?;
        masks.push(mapping.mask()?);
    }

    let revisions = &config.revisions;
    check_columns_present(source, Side::Source, &revisions.table, &revisions.columns)?;
    check_columns_present(destination, Side::Destination, &revisions.table, &revisions.columns)?;

    Ok(masks)
}

fn log_failure(table: &str) -> impl Fn(MigrationError) -> MigrationError + '_ {
    move |e| {
        error!("Transfer of table {} failed: {}", table, e);
        e
    }
}

/// Переносит все таблицы по порядку, коммит после каждой.
/// Упавшая таблица откатывается целиком, уже закоммиченные остаются.
pub fn migrate(
    source: &Connection,
    destination: &mut Connection,
    config: &MigrationConfig,
) -> Result<MigrationReport> {
    config.validate()?;
    let masks = check_schemas(source, destination, config)?;
    let mut report = MigrationReport::start();

    for (mapping, mask) in config.tables.iter().zip(&masks) {
        let table = mapping.table.as_str();
        let tx = destination.transaction()?;
        let table_report = measure_table_transfer(table, || transfer_table(table, mask, source, &tx))
            .map_err(log_failure(table))?;
        tx.commit()?;
        report.tables.push(table_report);
    }

    let table = config.revisions.table.as_str();
    let tx = destination.transaction()?;
    let table_report = measure_table_transfer(table, || transfer_revisions(&config.revisions, source, &tx))
        .map_err(log_failure(table))?;
    tx.commit()?;
    report.tables.push(table_report);

    report.finished_at = Some(Utc::now());
    info!(
        "Migration finished: {} rows inserted, {} rows skipped",
        report.inserted(),
        report.skipped()
    );
    Ok(report)
}
