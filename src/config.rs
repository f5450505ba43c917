// src/config.rs

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::db::error::{MigrationError, Result};
use crate::db::projection::TransferMask;
use crate::db::schema::{self, TableLayout};

/// Путь к файлу 0.45.8 document.db
pub const OLD_DB: &str = "document-old.db";
/// Путь к файлу 0.55.1 document.db (схема уже создана новой версией)
pub const NEW_DB: &str = "document-new.db";

pub const DEFAULT_TITLE: &str = "No Title";

/// Перенос одной таблицы: полный список колонок старой схемы и
/// подпоследовательность колонок, которые есть в новой.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMapping {
    pub table: String,
    pub source_columns: Vec<String>,
    pub kept_columns: Vec<String>,
}

impl TableMapping {
    pub fn new(table: &str, source_columns: &[&str], kept_columns: &[&str]) -> Self {
        Self {
            table: table.to_string(),
            source_columns: source_columns.iter().map(|c| c.to_string()).collect(),
            kept_columns: kept_columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn from_layouts(old: &TableLayout, new: &TableLayout) -> Self {
        Self::new(old.table, old.columns, new.columns)
    }

    /// Маска по позициям старой схемы. Ошибка, если `kept_columns`
    /// не является упорядоченной подпоследовательностью `source_columns`.
    pub fn mask(&self) -> Result<TransferMask> {
        let mut kept = self.kept_columns.iter().peekable();
        let mut bits = Vec::with_capacity(self.source_columns.len());

        for column in &self.source_columns {
            let keep = kept
                .peek()
                .is_some_and(|k| k.eq_ignore_ascii_case(column));
            if keep {
                kept.next();
            }
            bits.push(keep);
        }

        if let Some(missing) = kept.next() {
            return Err(MigrationError::InvalidMapping(format!(
                "column '{missing}' of table '{}' is not in the source column order",
                self.table
            )));
        }

        Ok(TransferMask::new(bits))
    }
}

/// Таблица ревизий переносится по явному списку колонок.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMapping {
    pub table: String,
    pub columns: Vec<String>,
    pub title_column: String,
    pub default_title: String,
}

impl RevisionMapping {
    pub fn title_index(&self) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&self.title_column))
            .ok_or_else(|| {
                MigrationError::InvalidMapping(format!(
                    "title column '{}' is not selected from '{}'",
                    self.title_column, self.table
                ))
            })
    }
}

impl Default for RevisionMapping {
    fn default() -> Self {
        Self {
            table: schema::NEW_NOTE_REVISIONS.table.to_string(),
            columns: schema::NEW_NOTE_REVISIONS
                .columns
                .iter()
                .map(|c| c.to_string())
                .collect(),
            title_column: "title".to_string(),
            default_title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Всё, что нужно одному прогону миграции.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    /// Порядок важен: attributes/branches идут раньше notes.
    pub tables: Vec<TableMapping>,
    pub revisions: RevisionMapping,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        let tables = schema::OLD_TABLES
            .iter()
            .zip(schema::NEW_TABLES.iter())
            .map(|(old, new)| TableMapping::from_layouts(old, new))
            .collect();

        Self {
            source_path: PathBuf::from(OLD_DB),
            destination_path: PathBuf::from(NEW_DB),
            tables,
            revisions: RevisionMapping::default(),
        }
    }
}

impl MigrationConfig {
    /// Те же таблицы, но другие файлы (тесты, временные копии).
    pub fn with_paths(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source.into(),
            destination_path: destination.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for mapping in &self.tables {
            if mapping.table.is_empty() {
                return Err(MigrationError::InvalidMapping("empty table name".to_string()));
            }
            if !seen.insert(mapping.table.to_ascii_lowercase()) {
                return Err(MigrationError::InvalidMapping(format!(
                    "table '{}' is listed twice",
                    mapping.table
                )));
            }
            if mapping.kept_columns.is_empty() {
                return Err(MigrationError::InvalidMapping(format!(
                    "table '{}' keeps no columns",
                    mapping.table
                )));
            }
            // первичный ключ должен пережить проекцию
            let mask = mapping.mask()?;
            if !mask.bits().first().copied().unwrap_or(false) {
                return Err(MigrationError::InvalidMapping(format!(
                    "table '{}' drops its primary key column",
                    mapping.table
                )));
            }
        }

        if self.revisions.table.is_empty() || self.revisions.columns.is_empty() {
            return Err(MigrationError::InvalidMapping(
                "revision mapping needs a table and columns".to_string(),
            ));
        }
        if !seen.insert(self.revisions.table.to_ascii_lowercase()) {
            return Err(MigrationError::InvalidMapping(format!(
                "table '{}' is mapped both by mask and by column list",
                self.revisions.table
            )));
        }
        self.revisions.title_index()?;

        Ok(())
    }
}
