// src/db/mod.rs
//
// Здесь:
// 1) модули переноса (маска, дедупликация, ревизии, оркестратор)
// 2) открытие двух баз: старая только на чтение, новая на запись
//
// Новую базу не создаём: её схему должен был создать Trilium 0.55.1.

pub mod error;
pub mod migrations;
pub mod monitoring;
pub mod projection;
pub mod revisions;
pub mod schema;
pub mod transfer;

use std::path::Path;

use log::info;
use rusqlite::{Connection, OpenFlags};

use crate::db::error::Result;

pub fn open_source(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    info!("Opened source database {}", path.display());
    Ok(conn)
}

pub fn open_destination(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
    info!("Opened destination database {}", path.display());
    Ok(conn)
}
