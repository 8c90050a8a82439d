//! Database seams
//!
//! The loader and the script executor only talk to these traits. The
//! PostgreSQL implementation lives in [`postgres`]; tests use an in-memory
//! fake.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

#[cfg(test)]
pub(crate) mod memory;
pub mod postgres;
pub mod probe;

pub use postgres::PgSession;
pub use probe::{status_check, RetryPolicy};

/// One result row as column name → JSON value
pub type JsonRow = Map<String, JsonValue>;

/// An open connection owned by one command invocation
#[async_trait]
pub trait Session: Send + Sync {
    /// Start a transaction
    async fn begin(&self) -> Result<Box<dyn Transaction>>;

    /// Run `sql` outside any transaction, delivering every result row to
    /// `sink` in order. Returns the number of rows delivered.
    async fn query(&self, sql: &str, sink: &mut (dyn RowSink + Send)) -> Result<u64>;

    /// Round trip to the server without running a statement
    async fn ping(&self) -> Result<()>;

    /// Lightweight query proving the server answers statements
    async fn verify(&self) -> Result<()>;
}

/// An open transaction; dropped without commit means rolled back.
#[async_trait]
pub trait Transaction: Send {
    /// Execute `sql` (one or more statements) and return rows affected
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Start a bulk COPY; `statement` is a full `COPY ... FROM STDIN`
    async fn copy_in<'a>(&'a mut self, statement: &str) -> Result<Box<dyn CopyIn + 'a>>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// A COPY in progress inside a transaction
#[async_trait]
pub trait CopyIn: Send {
    /// Send one chunk of COPY text-format lines
    async fn send(&mut self, chunk: Vec<u8>) -> Result<()>;

    /// Complete the COPY; returns the row count reported by the server
    async fn finish(self: Box<Self>) -> Result<u64>;

    /// Cancel the COPY with a reason shown in the server log
    async fn abort(self: Box<Self>, reason: &str) -> Result<()>;
}

/// Receiver for query results
pub trait RowSink {
    fn row(&mut self, row: JsonRow) -> Result<()>;

    /// Called between the results of two consecutive script units
    fn separator(&mut self) -> Result<()>;

    /// Called after each unit's rows have been delivered
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
