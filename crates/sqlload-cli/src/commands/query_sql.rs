//! `sqlload querysql` command implementation
//!
//! Result rows go to stdout as JSON lines; logging stays on stderr.

use super::{connect, read_script};
use crate::config::ConnectionConfig;
use crate::error::Result;
use sqlload_ingest::{JsonLinesSink, ScriptExecutor};
use std::io::BufWriter;
use tracing::info;

/// Run the script at `path` and print every result row
pub async fn run(config: &ConnectionConfig, path: &str) -> Result<()> {
    let script = read_script(path)?;

    let session = connect(config).await?;
    let mut sink = JsonLinesSink::new(BufWriter::new(std::io::stdout()));
    let result = ScriptExecutor::new(&session).run_query(&script, &mut sink).await;
    session.close().await;
    let summary = result?;

    info!(units = summary.units, rows = summary.rows, "Script queried");
    Ok(())
}
