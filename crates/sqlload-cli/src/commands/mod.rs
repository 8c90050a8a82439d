//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod check;
pub mod load_csv;
pub mod load_sql;
pub mod print_dsn;
pub mod query_sql;

use crate::config::ConnectionConfig;
use crate::error::{CliError, Result};
use sqlload_ingest::db::PgSession;
use tracing::info;

/// Read a script from a file or stdin (`-`).
pub(crate) fn read_script(path: &str) -> Result<String> {
    sqlload_common::input::read_to_string(path).map_err(|e| CliError::input(path, e))
}

/// Connect eagerly with the resolved configuration.
pub(crate) async fn connect(config: &ConnectionConfig) -> Result<PgSession> {
    let options = config.connect_options()?;
    let session = PgSession::connect(options).await?;
    info!(server = %session.target(), "Using database");
    Ok(session)
}
