//! In-memory [`Session`] for tests
//!
//! Records every statement, COPY chunk, commit and rollback. Work done inside
//! a transaction only becomes visible in `committed` when it commits.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{CopyIn, JsonRow, RowSink, Session, Transaction};
use crate::error::{LoadError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
pub(crate) struct State {
    /// Every statement handed to `execute`, failing ones included
    pub executed: Vec<String>,
    /// Statements and COPY statements of committed transactions
    pub committed: Vec<String>,
    /// Rows loaded through committed COPYs
    pub committed_rows: u64,
    pub copy_statements: Vec<String>,
    pub chunks: Vec<Vec<u8>>,
    pub aborts: Vec<String>,
    pub queries: Vec<String>,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub pings: u32,
    pub verifications: u32,

    fail_sql: Option<String>,
    failing_pings: u32,
    fail_verify: bool,
    fail_send_at: Option<usize>,
    fail_commit: bool,
    fail_rollback: bool,
    results: HashMap<String, Vec<JsonRow>>,
}

impl State {
    fn check_sql(&self, sql: &str) -> Result<()> {
        match &self.fail_sql {
            Some(needle) if sql.contains(needle.as_str()) => Err(LoadError::execution(
                "execute statement",
                format!("injected failure for statement containing '{}'", needle),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemorySession {
    state: Arc<Mutex<State>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any `execute` or `query` whose SQL contains `needle`
    pub fn failing_on(self, needle: &str) -> Self {
        self.state().fail_sql = Some(needle.to_string());
        self
    }

    /// Fail the first `count` pings
    pub fn failing_pings(self, count: u32) -> Self {
        self.state().failing_pings = count;
        self
    }

    pub fn failing_verify(self) -> Self {
        self.state().fail_verify = true;
        self
    }

    /// Fail the COPY chunk with this zero-based index
    pub fn failing_send(self, index: usize) -> Self {
        self.state().fail_send_at = Some(index);
        self
    }

    pub fn failing_commit(self) -> Self {
        self.state().fail_commit = true;
        self
    }

    pub fn failing_rollback(self) -> Self {
        self.state().fail_rollback = true;
        self
    }

    /// Rows returned by `query` for this SQL (compared trimmed)
    pub fn with_result(self, sql: &str, rows: Vec<JsonRow>) -> Self {
        self.state().results.insert(sql.trim().to_string(), rows);
        self
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.state().begins += 1;
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
            pending_rows: 0,
        }))
    }

    async fn query(&self, sql: &str, sink: &mut (dyn RowSink + Send)) -> Result<u64> {
        let rows = {
            let mut state = self.state();
            state.queries.push(sql.to_string());
            state.check_sql(sql)?;
            state.results.get(sql.trim()).cloned().unwrap_or_default()
        };

        let mut delivered = 0;
        for row in rows {
            sink.row(row)?;
            delivered += 1;
        }
        Ok(delivered)
    }

    async fn ping(&self) -> Result<()> {
        let mut state = self.state();
        state.pings += 1;
        if state.pings <= state.failing_pings {
            return Err(LoadError::execution("ping", "connection refused"));
        }
        Ok(())
    }

    async fn verify(&self) -> Result<()> {
        let mut state = self.state();
        if state.fail_verify {
            return Err(LoadError::execution("verification query", "permission denied"));
        }
        state.verifications += 1;
        Ok(())
    }
}

struct MemoryTransaction {
    state: Arc<Mutex<State>>,
    pending: Vec<String>,
    pending_rows: u64,
}

impl MemoryTransaction {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        {
            let mut state = self.state();
            state.executed.push(sql.to_string());
            state.check_sql(sql)?;
        }
        self.pending.push(sql.to_string());
        Ok(0)
    }

    async fn copy_in<'a>(&'a mut self, statement: &str) -> Result<Box<dyn CopyIn + 'a>> {
        self.state().copy_statements.push(statement.to_string());
        self.pending.push(statement.to_string());
        Ok(Box::new(MemoryCopy { tx: self, rows: 0 }))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_commit {
            return Err(LoadError::execution("commit", "serialization failure"));
        }
        state.commits += 1;
        state.committed.extend(self.pending.iter().cloned());
        state.committed_rows += self.pending_rows;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.rollbacks += 1;
        if state.fail_rollback {
            return Err(LoadError::execution("rollback", "connection reset"));
        }
        Ok(())
    }
}

struct MemoryCopy<'a> {
    tx: &'a mut MemoryTransaction,
    rows: u64,
}

#[async_trait]
impl<'a> CopyIn for MemoryCopy<'a> {
    async fn send(&mut self, chunk: Vec<u8>) -> Result<()> {
        let mut state = self.tx.state();
        if state.fail_send_at == Some(state.chunks.len()) {
            return Err(LoadError::execution("send COPY data", "invalid input syntax"));
        }
        self.rows += chunk.iter().filter(|&&b| b == b'\n').count() as u64;
        state.chunks.push(chunk);
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<u64> {
        let MemoryCopy { tx, rows } = *self;
        tx.pending_rows += rows;
        Ok(rows)
    }

    async fn abort(self: Box<Self>, reason: &str) -> Result<()> {
        self.tx.state().aborts.push(reason.to_string());
        Ok(())
    }
}

/// Collects rows and separators as they would be printed
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub events: Vec<String>,
}

impl RowSink for RecordingSink {
    fn row(&mut self, row: JsonRow) -> Result<()> {
        self.events.push(serde_json::Value::Object(row).to_string());
        Ok(())
    }

    fn separator(&mut self) -> Result<()> {
        self.events.push("---".to_string());
        Ok(())
    }
}
