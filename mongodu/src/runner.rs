//! 运行模式调度
//!
//! 采集、快照读写与报告输出。

use std::path::Path;

use anyhow::Context;

use common::config::{AnalyzeOptions, AppConfig, RunMode};
use common::errors::{AppError, AppResult};
use common::models::Snapshot;

/// Executes the configured run mode.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    match &config.mode {
        RunMode::Collect { file } => {
            let snapshot = collect(&config).await?;
            write_snapshot(file, &snapshot).await?;
        }
        RunMode::Analyze { file } => {
            let snapshot = read_snapshot(file).await?;
            println!("{}", render_report(&snapshot, &config.analyze)?);
        }
        RunMode::CollectAndAnalyze => {
            let snapshot = collect(&config).await?;
            println!("{}", render_report(&snapshot, &config.analyze)?);
        }
        RunMode::CollectPersistAnalyze { file } => {
            let snapshot = collect(&config).await?;
            write_snapshot(file, &snapshot).await?;
            println!("{}", render_report(&snapshot, &config.analyze)?);
        }
    }
    Ok(())
}

async fn collect(config: &AppConfig) -> AppResult<Snapshot> {
    let settings = config
        .connection
        .as_ref()
        .ok_or_else(|| AppError::Configuration("a host is required to collect".into()))?;
    collector::collect(settings, config.collector, config.target_database.as_deref()).await
}

/// Analyzes a snapshot and renders the report as JSON.
pub fn render_report(snapshot: &Snapshot, options: &AnalyzeOptions) -> AppResult<String> {
    analyzer::analyze(snapshot, options)?.to_json()
}

/// Persists a snapshot as sorted, indented JSON.
pub async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    let text = snapshot.to_json()?;
    tokio::fs::write(path, text)
        .await
        .map_err(AppError::from)
        .with_context(|| format!("failed to write snapshot to {}", path.display()))?;

    tracing::info!(path = %path.display(), databases = snapshot.len(), "Snapshot written");
    Ok(())
}

/// Restores a snapshot previously written by [`write_snapshot`].
pub async fn read_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(AppError::from)
        .with_context(|| format!("failed to read snapshot from {}", path.display()))?;

    let snapshot = Snapshot::from_json(&text)
        .with_context(|| format!("invalid snapshot in {}", path.display()))?;
    tracing::info!(path = %path.display(), databases = snapshot.len(), "Snapshot loaded");
    Ok(snapshot)
}
