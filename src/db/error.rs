// src/db/error.rs

use thiserror::Error;

/// Ошибки миграции. Любая из них фатальна: прогон останавливается на первой.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Длина строки не совпадает с длиной маски.
    #[error("row has {row} columns but the transfer mask has {mask}")]
    MaskArity { mask: usize, row: usize },

    #[error("{side} table '{table}' has {actual} columns, expected {expected}")]
    SchemaMismatch {
        side: Side,
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("{side} table '{table}' has no column '{column}'")]
    MissingColumn {
        side: Side,
        table: String,
        column: String,
    },

    #[error("invalid mapping: {0}")]
    InvalidMapping(String),
}

pub type Result<T, E = MigrationError> = std::result::Result<T, E>;

/// Какая из двух баз имеется в виду.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Destination => write!(f, "destination"),
        }
    }
}
