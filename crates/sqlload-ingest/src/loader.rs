//! Bulk Load Orchestrator
//!
//! Reads a delimited text stream, resolves its header into columns and
//! streams every record into one `COPY ... FROM STDIN` inside a single
//! transaction. Any failure aborts the COPY and rolls the transaction back,
//! so a load either inserts every row or none.

use crate::copy_format::{copy_statement, encode_row};
use crate::db::{CopyIn, Session, Transaction};
use crate::error::{LoadError, Result};
use crate::schema::{log_columns, resolve_header, ColumnSpec, TypeOverrides};
use crate::transcode::transcode_record;
use std::io::Read;
use tracing::{debug, info, warn};

/// Row group size at which buffered COPY data is sent
pub const DEFAULT_FLUSH_BYTES: usize = 1024 * 1024;

pub const DEFAULT_SEPARATOR: u8 = b',';

/// Parameters of one load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Target table, used verbatim (may be schema-qualified)
    pub table: String,
    pub null_sentinel: String,
    pub separator: u8,
    pub flush_bytes: usize,
}

impl LoadOptions {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            null_sentinel: String::new(),
            separator: DEFAULT_SEPARATOR,
            flush_bytes: DEFAULT_FLUSH_BYTES,
        }
    }

    pub fn with_null_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.null_sentinel = sentinel.into();
        self
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Zero is treated as one byte, i.e. one row per group.
    pub fn with_flush_bytes(mut self, flush_bytes: usize) -> Self {
        self.flush_bytes = flush_bytes.max(1);
        self
    }
}

/// Parse a field separator given on the command line.
///
/// Must be exactly one ASCII character.
pub fn parse_separator(raw: &str) -> Result<u8> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(LoadError::config(format!(
            "separator must be a single ASCII character, got '{}'",
            raw
        ))),
    }
}

/// Outcome of a committed load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Rows reported by the server for the COPY
    pub rows: u64,
    /// Chunks sent
    pub row_groups: u64,
}

pub struct BulkLoader<'s> {
    session: &'s dyn Session,
    options: LoadOptions,
}

impl<'s> BulkLoader<'s> {
    pub fn new(session: &'s dyn Session, options: LoadOptions) -> Self {
        Self { session, options }
    }

    /// Load every record of `reader` into the target table.
    ///
    /// Header problems are reported before a transaction is opened.
    pub async fn load<R: Read>(&self, reader: R, overrides: &TypeOverrides) -> Result<LoadSummary> {
        let input = DelimitedInput::open(reader, self.options.separator, overrides)?;
        self.load_input(input).await
    }

    /// Load an input whose header was already resolved.
    pub async fn load_input<R: Read>(&self, input: DelimitedInput<R>) -> Result<LoadSummary> {
        let DelimitedInput { mut csv, columns } = input;

        let statement = copy_statement(&self.options.table, &columns);
        info!(statement = %statement, "Starting bulk load");

        let mut tx = self.session.begin().await?;
        match self.stream(tx.as_mut(), &statement, &columns, &mut csv).await {
            Ok(summary) => {
                tx.commit().await?;
                info!(
                    table = %self.options.table,
                    rows = summary.rows,
                    row_groups = summary.row_groups,
                    "Bulk load committed"
                );
                Ok(summary)
            },
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed load also failed");
                }
                Err(e)
            },
        }
    }

    async fn stream<R: Read>(
        &self,
        tx: &mut dyn Transaction,
        statement: &str,
        columns: &[ColumnSpec],
        csv: &mut csv::Reader<R>,
    ) -> Result<LoadSummary> {
        let mut copy = tx.copy_in(statement).await?;

        match self.send_rows(copy.as_mut(), columns, csv).await {
            Ok(row_groups) => {
                let rows = copy.finish().await?;
                Ok(LoadSummary { rows, row_groups })
            },
            Err(e) => {
                if let Err(abort_err) = copy.abort(&e.to_string()).await {
                    warn!(error = %abort_err, "Aborting COPY failed");
                }
                Err(e)
            },
        }
    }

    /// Transcode and send every record; returns the number of row groups.
    async fn send_rows<R: Read>(
        &self,
        copy: &mut dyn CopyIn,
        columns: &[ColumnSpec],
        csv: &mut csv::Reader<R>,
    ) -> Result<u64> {
        let flush_bytes = self.options.flush_bytes;
        let mut buf = Vec::with_capacity(flush_bytes.min(DEFAULT_FLUSH_BYTES));
        let mut record = csv::StringRecord::new();
        let mut rows: u64 = 0;
        let mut row_groups: u64 = 0;

        while csv.read_record(&mut record).map_err(csv_error)? {
            let line = record.position().map_or(0, |p| p.line());
            let fields: Vec<&str> = record.iter().collect();
            let row = transcode_record(columns, &fields, &self.options.null_sentinel, line)?;
            encode_row(&mut buf, &row);
            rows += 1;

            if buf.len() >= flush_bytes {
                copy.send(std::mem::take(&mut buf)).await?;
                row_groups += 1;
                info!(rows, row_groups, "Sent row group");
            }
        }

        if !buf.is_empty() {
            copy.send(buf).await?;
            row_groups += 1;
        }

        debug!(rows, row_groups, "Input exhausted");
        Ok(row_groups)
    }
}

/// Delimited input with its header line read and resolved
pub struct DelimitedInput<R: Read> {
    csv: csv::Reader<R>,
    columns: Vec<ColumnSpec>,
}

impl<R: Read> DelimitedInput<R> {
    /// Read the header of `reader` and resolve it into columns.
    ///
    /// Needs no database, so callers can reject bad input before connecting.
    pub fn open(reader: R, separator: u8, overrides: &TypeOverrides) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(separator)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let header = csv.headers().map_err(csv_error)?;
        if header.is_empty() {
            return Err(LoadError::EmptyHeader);
        }
        let columns = resolve_header(header.iter(), overrides);
        log_columns(&columns);

        Ok(Self { csv, columns })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }
}

fn csv_error(e: csv::Error) -> LoadError {
    LoadError::io("reading delimited input", e.into())
}
