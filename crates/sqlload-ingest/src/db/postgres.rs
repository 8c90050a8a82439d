//! PostgreSQL implementation of the database seams

use super::{CopyIn, JsonRow, RowSink, Session, Transaction};
use crate::error::{LoadError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgConnectOptions, PgCopyIn, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Connection, PgConnection, Postgres, Row, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::{debug, info};

/// Query run by [`Session::verify`]; forces a real round trip.
pub const VERIFY_QUERY: &str = "SELECT COUNT(*) FROM pg_database";

/// How long to wait for the single pooled connection.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Session over a one-connection pool
pub struct PgSession {
    pool: PgPool,
    target: String,
}

impl PgSession {
    /// Connect immediately; fails with [`LoadError::Connection`].
    pub async fn connect(options: PgConnectOptions) -> Result<Self> {
        let target = describe(&options);
        let pool = pool_options()
            .connect_with(options)
            .await
            .map_err(|e| LoadError::Connection {
                target: target.clone(),
                source: e.into(),
            })?;

        info!(server = %target, "Connected to database");
        Ok(Self { pool, target })
    }

    /// Defer connecting until first use, so a probe can retry it.
    pub fn connect_lazy(options: PgConnectOptions) -> Self {
        let target = describe(&options);
        let pool = pool_options().connect_lazy_with(options);
        Self { pool, target }
    }

    /// `host:port/database` of the server this session talks to
    pub fn target(&self) -> &str {
        &self.target
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(1)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
}

fn describe(options: &PgConnectOptions) -> String {
    format!(
        "{}:{}/{}",
        options.get_host(),
        options.get_port(),
        options.get_database().unwrap_or_default()
    )
}

#[async_trait]
impl Session for PgSession {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LoadError::execution("begin transaction", e))?;
        debug!("Transaction started");
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn query(&self, sql: &str, sink: &mut (dyn RowSink + Send)) -> Result<u64> {
        let mut rows = sqlx::raw_sql(sql).fetch(&self.pool);
        let mut delivered = 0;

        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| LoadError::execution("query", e))?
        {
            sink.row(row_to_json(&row)?)?;
            delivered += 1;
        }

        Ok(delivered)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| LoadError::execution("acquire connection", e))?;
        conn.ping()
            .await
            .map_err(|e| LoadError::execution("ping", e))
    }

    async fn verify(&self) -> Result<()> {
        let databases: i64 = sqlx::query_scalar(VERIFY_QUERY)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LoadError::execution("verification query", e))?;
        debug!(databases, "Verification query succeeded");
        Ok(())
    }
}

struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        // The Executor method keeps the future Send for async_trait.
        let result = sqlx::Executor::execute(&mut *self.tx, sqlx::raw_sql(sql))
            .await
            .map_err(|e| LoadError::execution("execute statement", e))?;
        Ok(result.rows_affected())
    }

    async fn copy_in<'a>(&'a mut self, statement: &str) -> Result<Box<dyn CopyIn + 'a>> {
        let conn: &'a mut PgConnection = &mut self.tx;
        let copy = conn
            .copy_in_raw(statement)
            .await
            .map_err(|e| LoadError::execution("start COPY", e))?;
        Ok(Box::new(PgCopy { copy }))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let PgTransaction { tx } = *self;
        tx.commit()
            .await
            .map_err(|e| LoadError::execution("commit", e))
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let PgTransaction { tx } = *self;
        tx.rollback()
            .await
            .map_err(|e| LoadError::execution("rollback", e))
    }
}

struct PgCopy<'a> {
    copy: PgCopyIn<&'a mut PgConnection>,
}

#[async_trait]
impl<'a> CopyIn for PgCopy<'a> {
    async fn send(&mut self, chunk: Vec<u8>) -> Result<()> {
        self.copy
            .send(chunk)
            .await
            .map_err(|e| LoadError::execution("send COPY data", e))?;
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<u64> {
        let PgCopy { copy } = *self;
        copy.finish()
            .await
            .map_err(|e| LoadError::execution("finish COPY", e))
    }

    async fn abort(self: Box<Self>, reason: &str) -> Result<()> {
        let PgCopy { copy } = *self;
        copy.abort(reason)
            .await
            .map_err(|e| LoadError::execution("abort COPY", e))
    }
}

/// Flatten a result row into column name → JSON value.
fn row_to_json(row: &PgRow) -> Result<JsonRow> {
    let mut map = JsonRow::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = postgres_value_to_json(row, idx, column.type_info().name())
            .map_err(|e| LoadError::execution(format!("decode column '{}'", column.name()), e))?;
        map.insert(column.name().to_string(), value);
    }
    Ok(map)
}

/// Convert one PostgreSQL value to JSON by its type name.
///
/// NUMERIC becomes a string so no precision is lost. Types without a
/// mapping fall back to their text representation.
fn postgres_value_to_json(
    row: &PgRow,
    idx: usize,
    type_name: &str,
) -> std::result::Result<JsonValue, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(JsonValue::Null);
    }

    let value = match type_name {
        "BOOL" => JsonValue::Bool(row.try_get(idx)?),
        "INT2" => JsonValue::from(row.try_get::<i16, _>(idx)?),
        "INT4" => JsonValue::from(row.try_get::<i32, _>(idx)?),
        "INT8" => JsonValue::from(row.try_get::<i64, _>(idx)?),
        "FLOAT4" => serde_json::json!(row.try_get::<f32, _>(idx)?),
        "FLOAT8" => serde_json::json!(row.try_get::<f64, _>(idx)?),
        "NUMERIC" => {
            let v: sqlx::types::BigDecimal = row.try_get(idx)?;
            JsonValue::String(v.to_string())
        },
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => JsonValue::String(row.try_get(idx)?),
        "UUID" => {
            let v: uuid::Uuid = row.try_get(idx)?;
            JsonValue::String(v.to_string())
        },
        "DATE" => {
            let v: chrono::NaiveDate = row.try_get(idx)?;
            JsonValue::String(v.to_string())
        },
        "TIMESTAMP" => {
            let v: chrono::NaiveDateTime = row.try_get(idx)?;
            JsonValue::String(v.to_string())
        },
        "TIMESTAMPTZ" => {
            let v: chrono::DateTime<chrono::Utc> = row.try_get(idx)?;
            JsonValue::String(v.to_rfc3339())
        },
        "JSON" | "JSONB" => row.try_get(idx)?,
        _ => {
            let v: String = row
                .try_get_unchecked(idx)
                .unwrap_or_else(|_| format!("<{}>", type_name));
            JsonValue::String(v)
        },
    };

    Ok(value)
}
