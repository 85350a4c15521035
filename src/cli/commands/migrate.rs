use std::path::PathBuf;

use anyhow::Context;
use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::DatabaseManager;

pub async fn handle(file: PathBuf, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let script = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::apply_script(&pool, &script).await?;
    pool.close().await;

    output_success(
        &output_format,
        &format!("Applied {}", file.display()),
        Some(json!({ "file": file.display().to_string(), "bytes": script.len() })),
    )
}
