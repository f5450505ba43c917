// src/db/projection.rs

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::error::{MigrationError, Result};

/// Строка таблицы в порядке колонок `SELECT *`. Первая колонка — первичный ключ.
pub type Row = Vec<Value>;

/// Маска переноса: `true` — колонка есть в новой схеме, `false` — выбрасываем.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMask(Vec<bool>);

impl TransferMask {
    pub fn new(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    /// Удобно для таблиц вида `(1, 1, 0, 1)`.
    pub fn from_bits(bits: &[u8]) -> Self {
        Self(bits.iter().map(|b| *b != 0).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Сколько колонок останется после проекции.
    pub fn kept(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }

    /// Позиции выброшенных колонок (0-based).
    pub fn dropped_positions(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| if *keep { None } else { Some(i) })
            .collect()
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }
}

/// Оставляет в строке только колонки, отмеченные в маске, сохраняя порядок.
pub fn project(row: &[Value], mask: &TransferMask) -> Result<Row> {
    if row.len() != mask.len() {
        return Err(MigrationError::MaskArity {
            mask: mask.len(),
            row: row.len(),
        });
    }

    Ok(row
        .iter()
        .zip(mask.bits())
        .filter(|(_, keep)| **keep)
        .map(|(value, _)| value.clone())
        .collect())
}
