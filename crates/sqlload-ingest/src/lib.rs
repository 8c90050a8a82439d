//! sqlload ingestion library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Loads delimited text into PostgreSQL and runs `GO`-separated SQL scripts.
//!
//! # Overview
//!
//! - **Schema**: header annotations and override documents resolved into column specs
//! - **Transcode**: raw text records converted to typed rows
//! - **Loader**: typed rows streamed into one `COPY` inside one transaction
//! - **Script / Executor**: scripts split on delimiter lines and run atomically or as queries
//! - **Db**: the session traits, their PostgreSQL implementation and the connectivity probe
//!
//! # Example
//!
//! ```no_run
//! use sqlload_ingest::db::PgSession;
//! use sqlload_ingest::{BulkLoader, LoadOptions, TypeOverrides};
//!
//! # async fn run(options: sqlx::postgres::PgConnectOptions) -> sqlload_ingest::Result<()> {
//! let session = PgSession::connect(options).await?;
//! let input = std::fs::File::open("people.csv").map_err(|e| sqlload_ingest::LoadError::io("open", e))?;
//! let summary = BulkLoader::new(&session, LoadOptions::new("people"))
//!     .load(input, &TypeOverrides::None)
//!     .await?;
//! println!("inserted {} rows", summary.rows);
//! # Ok(())
//! # }
//! ```

pub mod copy_format;
pub mod db;
pub mod error;
pub mod executor;
pub mod loader;
pub mod schema;
pub mod script;
pub mod transcode;

// Re-export commonly used types
pub use error::{LoadError, Result};
pub use executor::{JsonLinesSink, ScriptExecutor, ScriptSummary};
pub use loader::{parse_separator, BulkLoader, DelimitedInput, LoadOptions, LoadSummary};
pub use schema::{ColumnSpec, ColumnType, TypeOverrides};
pub use script::{split_script, ScriptUnit, DEFAULT_DELIMITER};
pub use transcode::{TypedRow, Value};
