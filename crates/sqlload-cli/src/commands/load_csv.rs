//! `sqlload loadcsv` command implementation
//!
//! Everything that can be validated locally (separator, type overrides,
//! input file and its header line) is checked before a connection is opened.

use super::connect;
use crate::config::ConnectionConfig;
use crate::error::{CliError, Result};
use sqlload_common::open_input;
use sqlload_ingest::{parse_separator, BulkLoader, DelimitedInput, LoadOptions, TypeOverrides};
use std::path::Path;
use tracing::info;

/// Load the CSV at `path` into `table`
pub async fn run(
    config: &ConnectionConfig,
    table: &str,
    path: &str,
    nullstr: &str,
    sep: &str,
    types: Option<&Path>,
) -> Result<()> {
    let separator = parse_separator(sep)?;
    let overrides = match types {
        Some(types_path) => TypeOverrides::load(types_path)?,
        None => TypeOverrides::None,
    };
    let reader = open_input(path).map_err(|e| CliError::input(path, e))?;
    let input = DelimitedInput::open(reader, separator, &overrides)?;

    let session = connect(config).await?;
    let options = LoadOptions::new(table)
        .with_null_sentinel(nullstr)
        .with_separator(separator);

    let result = BulkLoader::new(&session, options).load_input(input).await;
    session.close().await;
    let summary = result?;

    info!(
        table = %table,
        rows = summary.rows,
        row_groups = summary.row_groups,
        "Inserted {} rows",
        summary.rows
    );
    Ok(())
}
