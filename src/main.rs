use anyhow::Context;
use log::{debug, info};

use trilium_migrate::{gather_metrics, run, MigrationConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Пути и маски зашиты в конфигурацию по умолчанию, аргументов нет.
    let config = MigrationConfig::default();

    let report = run(&config).with_context(|| {
        format!(
            "migration from {} to {} failed",
            config.source_path.display(),
            config.destination_path.display()
        )
    })?;

    info!("{}", serde_json::to_string(&report).context("failed to serialize report")?);
    debug!("{}", gather_metrics());
    Ok(())
}
