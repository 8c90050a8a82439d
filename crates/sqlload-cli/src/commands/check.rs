//! `sqlload check` command implementation

use crate::config::ConnectionConfig;
use crate::error::Result;
use sqlload_ingest::db::{status_check, PgSession, RetryPolicy};
use tracing::info;

/// Probe the database until it answers or the retries run out
pub async fn run(config: &ConnectionConfig) -> Result<()> {
    let session = PgSession::connect_lazy(config.connect_options()?);
    info!(server = %session.target(), "Checking connection");

    let result = status_check(&session, RetryPolicy::default()).await;
    session.close().await;
    result?;

    info!("Connection successful");
    Ok(())
}
