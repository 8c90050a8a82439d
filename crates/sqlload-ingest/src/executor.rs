//! Script Executor
//!
//! Load mode runs every unit inside one transaction and commits only when
//! all of them succeed. Query mode runs units one by one without a
//! transaction and hands every result row to a [`RowSink`].

use crate::db::{JsonRow, RowSink, Session};
use crate::error::{LoadError, Result};
use crate::script::{split_script, ScriptUnit, DEFAULT_DELIMITER};
use std::io::Write;
use tracing::{debug, info, warn};

/// Line printed between the results of consecutive units
pub const RESULT_SEPARATOR: &str = "---";

/// Outcome of a script run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    /// Units executed
    pub units: usize,
    /// Rows affected (load mode) or rows returned (query mode)
    pub rows: u64,
}

pub struct ScriptExecutor<'s> {
    session: &'s dyn Session,
    delimiter: String,
}

impl<'s> ScriptExecutor<'s> {
    pub fn new(session: &'s dyn Session) -> Self {
        Self {
            session,
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Run all units atomically.
    ///
    /// On the first failing unit the transaction is rolled back and later
    /// units are never sent.
    pub async fn run_load(&self, script: &str) -> Result<ScriptSummary> {
        let units = split_script(script, &self.delimiter);
        info!(units = units.len(), "Running script in load mode");

        let mut tx = self.session.begin().await?;
        let mut rows = 0;

        for unit in &units {
            debug!(unit = unit.ordinal, line = unit.start_line, "Executing unit");
            match tx.execute(&unit.text).await {
                Ok(affected) => rows += affected,
                Err(e) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(error = %rollback_err, "Rollback after failed unit also failed");
                    }
                    return Err(in_unit(unit, e));
                },
            }
        }

        tx.commit().await?;
        info!(units = units.len(), rows, "Script committed");
        Ok(ScriptSummary {
            units: units.len(),
            rows,
        })
    }

    /// Run units in order, delivering their rows to `sink`.
    ///
    /// The sink sees a separator before every unit but the first. The first
    /// failing unit stops the run; rows already delivered stay delivered.
    pub async fn run_query(
        &self,
        script: &str,
        sink: &mut (dyn RowSink + Send),
    ) -> Result<ScriptSummary> {
        let units = split_script(script, &self.delimiter);
        info!(units = units.len(), "Running script in query mode");

        let mut rows = 0;
        for (idx, unit) in units.iter().enumerate() {
            if idx > 0 {
                sink.separator()?;
            }
            debug!(unit = unit.ordinal, line = unit.start_line, "Querying unit");
            rows += self
                .session
                .query(&unit.text, sink)
                .await
                .map_err(|e| in_unit(unit, e))?;
            sink.flush()?;
        }

        Ok(ScriptSummary {
            units: units.len(),
            rows,
        })
    }
}

/// Attach the unit ordinal and start line to a database failure.
fn in_unit(unit: &ScriptUnit, err: LoadError) -> LoadError {
    match err {
        LoadError::Execution { context, source } => LoadError::Execution {
            context: format!(
                "unit {} starting at line {}, {}",
                unit.ordinal, unit.start_line, context
            ),
            source,
        },
        other => other,
    }
}

/// Writes each row as one JSON object per line
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RowSink for JsonLinesSink<W> {
    fn row(&mut self, row: JsonRow) -> Result<()> {
        serde_json::to_writer(&mut self.out, &row).map_err(|e| write_error(e.into()))?;
        self.out.write_all(b"\n").map_err(write_error)
    }

    fn separator(&mut self) -> Result<()> {
        writeln!(self.out, "{}", RESULT_SEPARATOR).map_err(write_error)
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(write_error)
    }
}

fn write_error(e: std::io::Error) -> LoadError {
    LoadError::io("writing query results", e)
}
