// src/db/monitoring.rs

use std::time::Instant;
use log::{debug, warn};
use once_cell::sync::Lazy;
use prometheus::{Encoder, TextEncoder, IntCounterVec, HistogramVec, register_int_counter_vec, register_histogram_vec};

use crate::db::error::Result;
use crate::db::transfer::TableReport;

/// Глобальные метрики переноса, по таблицам
pub static ROWS_INSERTED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "migration_rows_inserted_total",
        "Rows inserted into the destination database",
        &["table"]
    ).expect("Failed to create ROWS_INSERTED")
});

pub static ROWS_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "migration_rows_skipped_total",
        "Source rows skipped because their primary key already exists",
        &["table"]
    ).expect("Failed to create ROWS_SKIPPED")
});

pub static TABLE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "migration_table_duration_seconds",
        "Duration of a single table transfer in seconds",
        &["table"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    ).expect("Failed to create TABLE_DURATION")
});

/// Обёртка над переносом одной таблицы: время + счётчики строк.
pub fn measure_table_transfer<F>(table: &str, f: F) -> Result<TableReport>
where
    F: FnOnce() -> Result<TableReport>,
{
    let start = Instant::now();
    let result = f();
    let secs = start.elapsed().as_secs_f64();

    TABLE_DURATION.with_label_values(&[table]).observe(secs);
    if let Ok(report) = &result {
        ROWS_INSERTED.with_label_values(&[table]).inc_by(report.inserted as u64);
        ROWS_SKIPPED.with_label_values(&[table]).inc_by(report.skipped as u64);
    }

    debug!("Transfer of table {} took {:.4} seconds", table, secs);
    result
}

/// Метрики в текстовом формате Prometheus
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
