//! `sqlload loadsql` command implementation

use super::{connect, read_script};
use crate::config::ConnectionConfig;
use crate::error::Result;
use sqlload_ingest::ScriptExecutor;
use tracing::info;

/// Run the script at `path` in one transaction
pub async fn run(config: &ConnectionConfig, path: &str) -> Result<()> {
    let script = read_script(path)?;

    let session = connect(config).await?;
    let result = ScriptExecutor::new(&session).run_load(&script).await;
    session.close().await;
    let summary = result?;

    info!(units = summary.units, rows = summary.rows, "Script loaded");
    Ok(())
}
